//! Query string parser.
//!
//! Grammar, informally:
//!
//! ```text
//! query    := pragmas? operand*
//! operand  := op? (group | phrase | word)
//! op       := '+' | '-' | '~' | '<' | '>' | "OR"
//! group    := '(' operand* ')'
//! phrase   := '"' (escaped | [^"])* '"' '*'?
//! word     := [^ws)*]+ '*'?
//! ```
//!
//! Operands at one nesting level fold left to right. Every `(` and every
//! term spends one unit of the expression budget; once it runs out the
//! parser stops and hands back the unparsed input.

use super::ast::{BinaryKind, DEFAULT_TERM_WEIGHT, ModeOverride, Node, Operator, Query, Term};
use super::pragma::{parse_mode_option, parse_pragmas};
use crate::config::QueryConfig;
use crate::error::{Error, Result};
pub use crate::index::DEFAULT_MAX_INTERVAL;
use crate::index::{Encoding, MatchMode};

pub const DEFAULT_MAX_EXPRS: u32 = 32;
pub const DEFAULT_SIMILARITY_THRESHOLD: i32 = 10;
pub const DEFAULT_TERM_EXTRACT_POLICY: i32 = 0;

/// Parser settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    pub default_op: Operator,
    pub max_exprs: u32,
    pub encoding: Encoding,
    pub term_weight: i32,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            default_op: Operator::Or,
            max_exprs: DEFAULT_MAX_EXPRS,
            encoding: Encoding::Default,
            term_weight: DEFAULT_TERM_WEIGHT,
        }
    }
}

impl From<&QueryConfig> for ParseOptions {
    fn from(config: &QueryConfig) -> Self {
        Self {
            default_op: config.default_op,
            max_exprs: config.max_exprs,
            encoding: config.encoding,
            term_weight: config.scoring.term_weight,
        }
    }
}

/// Parse `text` into a query and the input left over when the expression
/// budget ran out (empty when everything was consumed).
pub fn parse(
    text: &str,
    default_op: Operator,
    max_exprs: u32,
    encoding: Encoding,
) -> Result<(Query, &str)> {
    let options = ParseOptions {
        default_op,
        max_exprs,
        encoding,
        ..ParseOptions::default()
    };
    parse_with(text, &options)
}

pub fn parse_with<'a>(text: &'a str, options: &ParseOptions) -> Result<(Query, &'a str)> {
    if options.max_exprs == 0 {
        return Err(Error::invalid_argument("max_exprs must be positive"));
    }
    QueryParser::new(text, options).parse(options.default_op)
}

struct QueryParser<'a> {
    input: &'a str,
    pos: usize,
    encoding: Encoding,
    budget: u32,
    term_weight: i32,
    default_kind: BinaryKind,
    halted: bool,
}

impl<'a> QueryParser<'a> {
    fn new(input: &'a str, options: &ParseOptions) -> Self {
        Self {
            input,
            pos: 0,
            encoding: options.encoding,
            budget: options.max_exprs,
            term_weight: options.term_weight,
            default_kind: options.default_op.into(),
            halted: false,
        }
    }

    fn parse(mut self, default_op: Operator) -> Result<(Query, &'a str)> {
        self.skip_whitespace();
        let (pragmas, consumed) = parse_pragmas(self.remaining(), default_op);
        self.pos += consumed;
        self.default_kind = pragmas.default_op.into();

        let root = self.parse_level(0)?;
        let rest = &self.input[self.pos..];
        let query = Query {
            root,
            pragmas,
            rest: rest.to_string(),
        };
        Ok((query, rest))
    }

    fn parse_level(&mut self, depth: usize) -> Result<Node> {
        let mut operands: Vec<(Option<BinaryKind>, Node)> = Vec::new();
        let mut op: Option<BinaryKind> = None;
        let mut mode: Option<ModeOverride> = None;

        loop {
            self.skip_whitespace();
            let Some(ch) = self.peek_char() else {
                break;
            };
            if self.budget == 0 {
                log::debug!("expression budget exhausted at byte {}", self.pos);
                self.halted = true;
                break;
            }
            if ch == '*'
                && let Some(m) = self.parse_mode_op()
            {
                mode = Some(m);
                continue;
            }

            match ch {
                ')' => {
                    self.advance();
                    if depth == 0 {
                        log::debug!("unmatched ')' ends the query at byte {}", self.pos);
                        self.halted = true;
                    }
                    break;
                }
                '(' => {
                    self.advance();
                    self.budget -= 1;
                    if mode.take().is_some() {
                        log::debug!("match mode before a group is ignored");
                    }
                    let child = self.parse_level(depth + 1)?;
                    operands.push((
                        op.take(),
                        Node::Group {
                            child: Box::new(child),
                        },
                    ));
                }
                '"' => {
                    self.advance();
                    if let Some(term) = self.parse_phrase(mode.take())? {
                        operands.push((op.take(), Node::Term(term)));
                    }
                }
                '+' | '-' | '~' | '<' | '>' => {
                    self.advance();
                    op = Some(match ch {
                        '+' => BinaryKind::And,
                        '-' => BinaryKind::But,
                        '~' => BinaryKind::Adjust,
                        '<' => BinaryKind::Lt,
                        _ => BinaryKind::Gt,
                    });
                }
                _ => {
                    let (text, is_prefix) = self.parse_word();
                    if text == "OR" && !is_prefix {
                        op = Some(BinaryKind::Or);
                        continue;
                    }
                    self.budget -= 1;
                    let term = Term {
                        text,
                        is_prefix,
                        is_phrase: false,
                        weight: self.term_weight,
                        mode: mode.take(),
                    };
                    operands.push((op.take(), Node::Term(term)));
                }
            }

            if self.halted {
                break;
            }
        }

        Ok(fold_operands(operands, self.default_kind))
    }

    /// Body of a quoted phrase; the opening quote is already consumed.
    fn parse_phrase(&mut self, mode: Option<ModeOverride>) -> Result<Option<Term>> {
        let mut text = String::new();
        let mut closed = false;

        while let Some(ch) = self.peek_char() {
            self.advance();
            match ch {
                '"' => {
                    closed = true;
                    break;
                }
                '\\' => match self.peek_char() {
                    Some(escaped) => {
                        self.advance();
                        text.push(escaped);
                    }
                    None => text.push('\\'),
                },
                _ => text.push(ch),
            }
        }

        if text.is_empty() {
            log::debug!("skipping empty phrase");
            return Ok(None);
        }

        self.budget -= 1;
        if !closed {
            if self.budget == 0 {
                return Err(Error::invalid_argument(
                    "unterminated phrase at end of input with no expression budget left",
                ));
            }
            log::debug!("unterminated phrase runs to end of input");
        }

        let is_prefix = closed && self.consume_prefix_marker();
        Ok(Some(Term {
            text,
            is_prefix,
            is_phrase: true,
            weight: self.term_weight,
            mode,
        }))
    }

    /// A bare word up to whitespace, `)` or `*`.
    fn parse_word(&mut self) -> (String, bool) {
        let start = self.pos;
        if self.peek_char() == Some('*') {
            // Not a mode operator, so the star is literal.
            self.advance();
        }
        while let Some(ch) = self.peek_char() {
            if self.is_space(ch) || ch == ')' || ch == '*' {
                break;
            }
            self.advance();
        }
        let text = self.input[start..self.pos].to_string();
        let is_prefix = self.consume_char('*');
        (text, is_prefix)
    }

    /// `*S<n>`, `*N<n>`, `*n<n>` or `*T<n>` in front of a term.
    fn parse_mode_op(&mut self) -> Option<ModeOverride> {
        let bytes = self.input.as_bytes();
        let (mode, default) = match bytes.get(self.pos + 1)? {
            b'S' => (MatchMode::Similar, DEFAULT_SIMILARITY_THRESHOLD),
            b'N' => (MatchMode::Near, DEFAULT_MAX_INTERVAL),
            b'n' => (MatchMode::Near2, DEFAULT_MAX_INTERVAL),
            b'T' => (MatchMode::TermExtract, DEFAULT_TERM_EXTRACT_POLICY),
            _ => return None,
        };
        let (option, next) = parse_mode_option(bytes, self.pos + 2);
        self.pos = next;
        Some(ModeOverride {
            mode,
            option: option.unwrap_or(default),
        })
    }

    /// A `*` directly after a closing quote marks a prefix phrase.
    fn consume_prefix_marker(&mut self) -> bool {
        let mut chars = self.remaining().chars();
        if chars.next() != Some('*') {
            return false;
        }
        match chars.next() {
            None => {}
            Some(c) if self.is_space(c) || c == ')' => {}
            Some(_) => return false,
        }
        self.advance();
        true
    }

    fn is_space(&self, ch: char) -> bool {
        self.encoding.is_space(ch)
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek_char() {
            if !self.is_space(ch) {
                break;
            }
            self.advance();
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn consume_char(&mut self, expected: char) -> bool {
        if self.peek_char() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn advance(&mut self) {
        if let Some(ch) = self.peek_char() {
            self.pos += ch.len_utf8();
        }
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }
}

/// Fold one level's operands left to right.
///
/// The first operand has nothing to combine with: a leading `-` operand is
/// dropped, a leading `<` or `>` applies to the next combination, and any
/// other leading operator is ignored.
fn fold_operands(operands: Vec<(Option<BinaryKind>, Node)>, default_kind: BinaryKind) -> Node {
    let mut root: Option<Node> = None;
    let mut carried: Option<BinaryKind> = None;

    for (op, node) in operands {
        let Some(left) = root.take() else {
            match op {
                Some(BinaryKind::But) => log::debug!("dropping leading exclusion"),
                Some(BinaryKind::Lt | BinaryKind::Gt) => {
                    carried = op;
                    root = Some(node);
                }
                _ => root = Some(node),
            }
            continue;
        };
        let kind = op.or(carried.take()).unwrap_or(default_kind);
        root = Some(Node::BinaryOp {
            kind,
            left: Box::new(left),
            right: Box::new(node),
        });
    }

    root.unwrap_or(Node::Empty)
}
