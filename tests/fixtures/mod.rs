//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use qrs::index::{Encoding, MemoryIndex};
use qrs::query::{Operator, Query, QueryExecutor, parse};
use qrs::records::{RecUnit, RecordId, RecordSet, RecordSetConfig};

/// Three documents: one with `a`, one with `b`, one with both.
pub fn abc_index() -> MemoryIndex {
    let mut idx = MemoryIndex::new();
    idx.add_document("a", &["a"]);
    idx.add_document("b", &["b"]);
    idx.add_document("a&b", &["a b"]);
    idx
}

/// A small two-section corpus (title, body).
pub fn corpus() -> MemoryIndex {
    let mut idx = MemoryIndex::new();
    idx.add_document(1, &["Rust parsers", "a recursive descent parser for boolean queries"]);
    idx.add_document(2, &["Search engines", "inverted index and posting lists with scores"]);
    idx.add_document(3, &["Query languages", "boolean operators and phrase search in queries"]);
    idx.add_document(4, &["Cooking", "a recipe for bread with flour and water"]);
    idx
}

pub fn parse_query(text: &str, default_op: Operator) -> Query {
    let (query, rest) = parse(text, default_op, 32, Encoding::Utf8).expect("query parses");
    assert!(rest.is_empty(), "unexpected remainder {:?}", rest);
    query
}

pub fn run(idx: &MemoryIndex, text: &str, default_op: Operator) -> RecordSet {
    let query = parse_query(text, default_op);
    QueryExecutor::new(idx).execute(&query).expect("query executes")
}

/// Document-unit set with the given `(key, score)` records, in order.
pub fn doc_set(records: &[(u32, i32)]) -> RecordSet {
    let mut set = RecordSet::new(RecordSetConfig::default()).expect("valid config");
    for &(key, score) in records {
        set.add(RecordId::new(key, 0, 0), score);
    }
    set
}

/// Section-unit set with the given `(key, section, score)` hits.
pub fn section_set(hits: &[(&str, u32, i32)]) -> RecordSet {
    let config = RecordSetConfig::new(RecUnit::Section, RecUnit::None, 0);
    let mut set = RecordSet::new(config).expect("valid config");
    for &(key, section, score) in hits {
        set.add(RecordId::new(key, section, 0), score);
    }
    set
}

/// Record keys in set order.
pub fn keys(set: &RecordSet) -> Vec<String> {
    set.iter().map(|r| r.key.to_string()).collect()
}

pub fn sorted_keys(set: &RecordSet) -> Vec<String> {
    let mut keys = keys(set);
    keys.sort();
    keys
}
