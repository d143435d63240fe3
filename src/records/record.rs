//! Record, subrecord and unit types.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

use crate::error::{Error, Result};

/// Opaque key identifying a source document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordKey {
    Int(u32),
    Bytes(Vec<u8>),
}

impl RecordKey {
    /// Raw key bytes. Integer keys are little-endian.
    pub fn as_bytes(&self) -> Cow<'_, [u8]> {
        match self {
            RecordKey::Int(v) => Cow::Owned(v.to_le_bytes().to_vec()),
            RecordKey::Bytes(b) => Cow::Borrowed(b),
        }
    }

    pub fn key_size(&self) -> usize {
        match self {
            RecordKey::Int(_) => 4,
            RecordKey::Bytes(b) => b.len(),
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match self {
            RecordKey::Int(v) => Some(*v),
            RecordKey::Bytes(_) => None,
        }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKey::Int(v) => write!(f, "{}", v),
            RecordKey::Bytes(b) => write!(f, "{}", String::from_utf8_lossy(b)),
        }
    }
}

impl From<u32> for RecordKey {
    fn from(v: u32) -> Self {
        RecordKey::Int(v)
    }
}

impl From<&str> for RecordKey {
    fn from(s: &str) -> Self {
        RecordKey::Bytes(s.as_bytes().to_vec())
    }
}

impl From<String> for RecordKey {
    fn from(s: String) -> Self {
        RecordKey::Bytes(s.into_bytes())
    }
}

impl From<&[u8]> for RecordKey {
    fn from(b: &[u8]) -> Self {
        RecordKey::Bytes(b.to_vec())
    }
}

impl From<Vec<u8>> for RecordKey {
    fn from(b: Vec<u8>) -> Self {
        RecordKey::Bytes(b)
    }
}

/// Granularity at which records are kept distinct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecUnit {
    #[default]
    Document = 0,
    Section = 1,
    Position = 2,
    UserDef = 3,
    None = 4,
}

impl RecUnit {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Result<Self> {
        match code {
            0 => Ok(RecUnit::Document),
            1 => Ok(RecUnit::Section),
            2 => Ok(RecUnit::Position),
            3 => Ok(RecUnit::UserDef),
            4 => Ok(RecUnit::None),
            _ => Err(Error::invalid_argument(format!("unknown record unit {}", code))),
        }
    }

    /// Depth in the document/section/position hierarchy, if the unit has one.
    fn depth(self) -> Option<u8> {
        match self {
            RecUnit::Document => Some(1),
            RecUnit::Section => Some(2),
            RecUnit::Position => Some(3),
            RecUnit::UserDef | RecUnit::None => None,
        }
    }

    /// True when `self` distinguishes strictly more than `other`.
    pub fn is_finer_than(self, other: RecUnit) -> bool {
        match (self.depth(), other.depth()) {
            (Some(a), Some(b)) => a > b,
            // Anything hierarchical is finer than a user-defined grouping.
            (Some(_), None) => other == RecUnit::UserDef,
            _ => false,
        }
    }
}

/// Identity of a record within a set at a given unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId {
    pub key: RecordKey,
    pub section: u32,
    pub position: u32,
}

impl RecordId {
    pub fn new(key: impl Into<RecordKey>, section: u32, position: u32) -> Self {
        Self {
            key: key.into(),
            section,
            position,
        }
    }

    /// Drop the parts of the id that `unit` does not distinguish.
    pub fn project(&self, unit: RecUnit) -> RecordId {
        let (section, position) = match unit {
            RecUnit::Position => (self.section, self.position),
            RecUnit::Section => (self.section, 0),
            RecUnit::Document | RecUnit::UserDef | RecUnit::None => (0, 0),
        };
        RecordId {
            key: self.key.clone(),
            section,
            position,
        }
    }
}

/// A finer-grained hit folded under a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubRecord {
    pub section: u32,
    pub position: u32,
    pub score: i32,
}

/// One matched entity in a [`RecordSet`](super::RecordSet).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub key: RecordKey,
    pub section: u32,
    pub position: u32,
    pub score: i32,
    pub n_subrecs: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subrecs: Vec<SubRecord>,
}

impl Record {
    pub fn new(id: RecordId, score: i32) -> Self {
        Self {
            key: id.key,
            section: id.section,
            position: id.position,
            score,
            n_subrecs: 0,
            subrecs: Vec::new(),
        }
    }

    pub fn id(&self) -> RecordId {
        RecordId {
            key: self.key.clone(),
            section: self.section,
            position: self.position,
        }
    }

    pub fn key_size(&self) -> usize {
        self.key.key_size()
    }

    pub fn subrec(&self, index: usize) -> Option<&SubRecord> {
        self.subrecs.get(index)
    }

    /// Keep `sub` if it ranks among the best `max` subrecords.
    ///
    /// Subrecords stay ordered best first; ties keep arrival order.
    pub(crate) fn retain_subrec(&mut self, sub: SubRecord, max: usize, ascending: bool) {
        if max == 0 {
            return;
        }
        let better = |a: i32, b: i32| if ascending { a < b } else { a > b };
        let at = self
            .subrecs
            .iter()
            .position(|s| better(sub.score, s.score))
            .unwrap_or(self.subrecs.len());
        if at >= max {
            return;
        }
        self.subrecs.insert(at, sub);
        self.subrecs.truncate(max);
    }

    /// Append subrecords from a merged record, up to `max`.
    pub(crate) fn append_subrecs(&mut self, other: &[SubRecord], max: usize) {
        let room = max.saturating_sub(self.subrecs.len());
        self.subrecs.extend(other.iter().take(room).copied());
    }
}
