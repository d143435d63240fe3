//! Parsed query representation.

use serde::{Deserialize, Serialize};

use super::pragma::PragmaSet;
use crate::error::{Error, Result};
use crate::index::MatchMode;

/// Weight a term carries when nothing overrides it.
pub const DEFAULT_TERM_WEIGHT: i32 = 5;

/// How a query's result merges into a record set, and the default
/// operator between terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    #[default]
    Or = 0,
    And = 1,
    But = 2,
    Adjust = 3,
}

impl Operator {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Result<Self> {
        match code {
            0 => Ok(Operator::Or),
            1 => Ok(Operator::And),
            2 => Ok(Operator::But),
            3 => Ok(Operator::Adjust),
            _ => Err(Error::invalid_argument(format!("unknown operator {}", code))),
        }
    }
}

/// Operator of a [`Node::BinaryOp`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BinaryKind {
    Or,
    And,
    But,
    Adjust,
    /// Union where the left side ranks below the right.
    Lt,
    /// Union where the left side ranks above the right.
    Gt,
}

impl From<Operator> for BinaryKind {
    fn from(op: Operator) -> Self {
        match op {
            Operator::Or => BinaryKind::Or,
            Operator::And => BinaryKind::And,
            Operator::But => BinaryKind::But,
            Operator::Adjust => BinaryKind::Adjust,
        }
    }
}

/// Explicit match mode attached to a term with `*S`, `*N`, `*n` or `*T`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeOverride {
    pub mode: MatchMode,
    pub option: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub text: String,
    pub is_prefix: bool,
    pub is_phrase: bool,
    pub weight: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<ModeOverride>,
}

impl Term {
    pub fn word(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_prefix: false,
            is_phrase: false,
            weight: DEFAULT_TERM_WEIGHT,
            mode: None,
        }
    }

    pub fn phrase(text: impl Into<String>) -> Self {
        Self {
            is_phrase: true,
            ..Self::word(text)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    Empty,
    Term(Term),
    Group {
        child: Box<Node>,
    },
    BinaryOp {
        kind: BinaryKind,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    pub fn is_empty(&self) -> bool {
        matches!(self, Node::Empty)
    }

    /// Every term, left to right.
    pub fn terms(&self) -> Vec<&Term> {
        let mut out = Vec::new();
        self.collect_terms(&mut out);
        out
    }

    fn collect_terms<'a>(&'a self, out: &mut Vec<&'a Term>) {
        match self {
            Node::Empty => {}
            Node::Term(t) => out.push(t),
            Node::Group { child } => child.collect_terms(out),
            Node::BinaryOp { left, right, .. } => {
                left.collect_terms(out);
                right.collect_terms(out);
            }
        }
    }
}

/// A parsed query: its expression tree and the pragmas that govern it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub root: Node,
    pub pragmas: PragmaSet,
    /// Unconsumed input when parsing stopped early.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub rest: String,
}

impl Query {
    pub fn terms(&self) -> Vec<&Term> {
        self.root.terms()
    }

    pub fn rest(&self) -> &str {
        &self.rest
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }
}
