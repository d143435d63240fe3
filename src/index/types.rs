use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::records::RecordKey;

/// Window used by near matching when the request does not give one.
pub const DEFAULT_MAX_INTERVAL: i32 = 10;

/// How a term is matched against indexed text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    #[default]
    Exact = 0,
    Partial = 1,
    Unsplit = 2,
    Near = 3,
    Near2 = 4,
    Similar = 5,
    TermExtract = 6,
    Prefix = 7,
    Suffix = 8,
}

impl MatchMode {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Result<Self> {
        Ok(match code {
            0 => MatchMode::Exact,
            1 => MatchMode::Partial,
            2 => MatchMode::Unsplit,
            3 => MatchMode::Near,
            4 => MatchMode::Near2,
            5 => MatchMode::Similar,
            6 => MatchMode::TermExtract,
            7 => MatchMode::Prefix,
            8 => MatchMode::Suffix,
            _ => return Err(Error::invalid_argument(format!("unknown match mode {}", code))),
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            MatchMode::Exact => "exact",
            MatchMode::Partial => "partial",
            MatchMode::Unsplit => "unsplit",
            MatchMode::Near => "near",
            MatchMode::Near2 => "near2",
            MatchMode::Similar => "similar",
            MatchMode::TermExtract => "term_extract",
            MatchMode::Prefix => "prefix",
            MatchMode::Suffix => "suffix",
        }
    }
}

/// Text encoding of queries and indexed text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Encoding {
    #[default]
    Default = 0,
    None = 1,
    EucJp = 2,
    Utf8 = 3,
    Sjis = 4,
}

impl Encoding {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Result<Self> {
        Ok(match code {
            0 => Encoding::Default,
            1 => Encoding::None,
            2 => Encoding::EucJp,
            3 => Encoding::Utf8,
            4 => Encoding::Sjis,
            _ => return Err(Error::invalid_argument(format!("unknown encoding {}", code))),
        })
    }

    /// Whether `ch` separates tokens under this encoding.
    ///
    /// `None` only knows ASCII; every other encoding also splits on Unicode
    /// whitespace such as the ideographic space.
    pub fn is_space(self, ch: char) -> bool {
        match self {
            Encoding::None => ch.is_ascii_whitespace(),
            _ => ch.is_whitespace(),
        }
    }
}

/// One candidate hit returned by an index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub key: RecordKey,
    pub section: u32,
    pub position: u32,
    pub score: i32,
}

/// A single term lookup.
#[derive(Debug, Clone, Copy)]
pub struct LookupRequest<'a> {
    pub term: &'a str,
    pub mode: MatchMode,
    /// Mode parameter: window for near, threshold for similar, policy for
    /// term extraction. Ignored by other modes.
    pub option: i32,
    pub encoding: Encoding,
}

impl<'a> LookupRequest<'a> {
    pub fn new(term: &'a str, mode: MatchMode) -> Self {
        Self {
            term,
            mode,
            option: 0,
            encoding: Encoding::Default,
        }
    }

    pub fn with_option(mut self, option: i32) -> Self {
        self.option = option;
        self
    }

    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }
}

/// Postings produced by a lookup.
pub type Postings<'a> = Box<dyn Iterator<Item = Posting> + 'a>;
