//! Query configuration, loadable from a JSON file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::index::Encoding;
use crate::query::parser::DEFAULT_MAX_EXPRS;
use crate::query::{Escalation, Operator, ScoringWeights};
use crate::records::RecordSetConfig;

const APP_NAME: &str = "qrs";
const CONFIG_FILE: &str = "config.json";

/// Settings shared by the parser, the executor and sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Operator between terms that carry none
    #[serde(default)]
    pub default_op: Operator,

    /// Expression budget per parse: every `(` and every term costs one
    #[serde(default = "default_max_exprs")]
    pub max_exprs: u32,

    #[serde(default)]
    pub encoding: Encoding,

    /// Escalation applied when a query carries no `*E` pragma
    #[serde(default)]
    pub escalation: Option<Escalation>,

    #[serde(default)]
    pub scoring: ScoringWeights,

    /// Shape of the record sets queries produce
    #[serde(default)]
    pub records: RecordSetConfig,

    /// Parsed queries kept per session
    #[serde(default = "default_cache_size")]
    pub cache_size: usize,
}

fn default_max_exprs() -> u32 {
    DEFAULT_MAX_EXPRS
}

fn default_cache_size() -> usize {
    64
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_op: Operator::Or,
            max_exprs: default_max_exprs(),
            encoding: Encoding::Default,
            escalation: None,
            scoring: ScoringWeights::default(),
            records: RecordSetConfig::default(),
            cache_size: default_cache_size(),
        }
    }
}

impl QueryConfig {
    /// Read a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: QueryConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read the config from [`default_path`](Self::default_path), or fall
    /// back to defaults when there is none.
    pub fn load_default() -> Result<Self> {
        match Self::default_path() {
            Ok(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// `<config dir>/qrs/config.json`.
    pub fn default_path() -> Result<PathBuf> {
        let base = dirs::config_dir()
            .ok_or_else(|| Error::not_found("could not determine config directory"))?;
        Ok(base.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_exprs == 0 {
            return Err(Error::invalid_argument("max_exprs must be positive"));
        }
        self.records.validate()
    }
}
