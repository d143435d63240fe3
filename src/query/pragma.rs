//! Leading `*` directives: escalation (`*E`), default operator (`*D`) and
//! section weights (`*W`).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::ast::Operator;

/// Escalation policy from `*E<threshold>[,<secondary>]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Escalation {
    pub threshold: i32,
    pub secondary: Option<i32>,
}

impl Escalation {
    /// Fuzzier tiers a term may fall back through.
    pub fn steps(&self) -> u32 {
        self.threshold.unsigned_abs()
    }

    /// Escalations allowed across the whole query, if bounded.
    pub fn budget(&self) -> Option<u32> {
        self.secondary.map(i32::unsigned_abs)
    }
}

/// Per-section score multipliers from `*W`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionWeights {
    /// No `*W` given: every section counts once.
    #[default]
    Uniform,
    /// Sections not listed weigh zero.
    Listed(BTreeMap<u32, i32>),
}

impl SectionWeights {
    pub fn weight(&self, section: u32) -> i32 {
        match self {
            SectionWeights::Uniform => 1,
            SectionWeights::Listed(map) => map.get(&section).copied().unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PragmaSet {
    pub escalation: Option<Escalation>,
    pub default_op: Operator,
    pub section_weights: SectionWeights,
}

/// Parse the pragma block at the start of `input`.
///
/// Returns the pragmas and the byte offset where the query body begins.
/// Anything that does not read as a known directive is left for the body.
pub fn parse_pragmas(input: &str, default_op: Operator) -> (PragmaSet, usize) {
    let mut pragmas = PragmaSet {
        default_op,
        ..PragmaSet::default()
    };
    let bytes = input.as_bytes();
    let mut pos = 0;

    while bytes.get(pos) == Some(&b'*') {
        match bytes.get(pos + 1) {
            Some(b'E') => {
                pos = parse_escalation(bytes, pos + 2, &mut pragmas);
            }
            Some(b'D') => {
                pos = parse_default_op(bytes, pos + 2, &mut pragmas);
            }
            Some(b'W') => {
                pos = parse_weights(bytes, pos + 2, &mut pragmas);
            }
            _ => break,
        }
    }

    (pragmas, pos)
}

fn parse_escalation(bytes: &[u8], mut pos: usize, pragmas: &mut PragmaSet) -> usize {
    let (threshold, next) = parse_int(bytes, pos);
    pos = next;
    let mut secondary = None;
    if bytes.get(pos) == Some(&b',') {
        let (value, next) = parse_int(bytes, pos + 1);
        secondary = Some(value);
        pos = next;
    }
    pragmas.escalation = Some(Escalation {
        threshold,
        secondary,
    });
    pos
}

fn parse_default_op(bytes: &[u8], pos: usize, pragmas: &mut PragmaSet) -> usize {
    let end = bytes[pos..]
        .iter()
        .position(|&b| b == b'*' || b.is_ascii_whitespace())
        .map_or(bytes.len(), |n| pos + n);
    match &bytes[pos..end] {
        b"OR" => pragmas.default_op = Operator::Or,
        b"+" => pragmas.default_op = Operator::And,
        b"-" => pragmas.default_op = Operator::But,
        b">" => pragmas.default_op = Operator::Adjust,
        other => {
            log::debug!(
                "ignoring unknown default operator {:?}",
                String::from_utf8_lossy(other)
            );
        }
    }
    end
}

fn parse_weights(bytes: &[u8], mut pos: usize, pragmas: &mut PragmaSet) -> usize {
    let mut map = BTreeMap::new();
    loop {
        let (section, next) = parse_uint(bytes, pos);
        if section == 0 {
            break;
        }
        pos = next;
        let mut weight = 1;
        if bytes.get(pos) == Some(&b':') {
            let (value, next) = parse_int(bytes, pos + 1);
            weight = value;
            pos = next;
        }
        map.insert(section, weight);
        if bytes.get(pos) != Some(&b',') {
            break;
        }
        pos += 1;
    }
    pragmas.section_weights = SectionWeights::Listed(map);
    pos
}

/// Optional sign then digits. No digits reads as 0.
fn parse_int(bytes: &[u8], mut pos: usize) -> (i32, usize) {
    let negative = match bytes.get(pos) {
        Some(b'-') => {
            pos += 1;
            true
        }
        Some(b'+') => {
            pos += 1;
            false
        }
        _ => false,
    };
    let (magnitude, pos) = parse_digits(bytes, pos);
    let value = if negative { -magnitude } else { magnitude };
    (value.clamp(i32::MIN as i64, i32::MAX as i64) as i32, pos)
}

fn parse_uint(bytes: &[u8], pos: usize) -> (u32, usize) {
    let (value, pos) = parse_digits(bytes, pos);
    (value.min(u32::MAX as i64) as u32, pos)
}

fn parse_digits(bytes: &[u8], mut pos: usize) -> (i64, usize) {
    let mut value: i64 = 0;
    while let Some(&b) = bytes.get(pos) {
        if !b.is_ascii_digit() {
            break;
        }
        value = value.saturating_mul(10).saturating_add((b - b'0') as i64);
        pos += 1;
    }
    (value, pos)
}

/// Leading integer of a mode operator body (`*N5`), if any.
pub(crate) fn parse_mode_option(bytes: &[u8], pos: usize) -> (Option<i32>, usize) {
    let (value, next) = parse_int(bytes, pos);
    if next == pos { (None, pos) } else { (Some(value), next) }
}
