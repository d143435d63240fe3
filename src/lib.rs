//! # qrs - boolean full-text query compiler
//!
//! `qrs` turns a compact query language into an expression tree, evaluates it
//! against an inverted index, and combines per-term hits into a scored
//! record set.
//!
//! ## Architecture
//!
//! - [`query`] - Query parsing, pragmas, scoring and execution
//! - [`records`] - Scored record sets: set algebra, sorting and grouping
//! - [`index`] - The lookup interface queries run against, plus an in-memory index
//! - [`session`] - Statement sessions with `?` placeholders, local or over a stream
//! - [`config`] - Query configuration loadable from JSON
//!
//! ## Quick Start
//!
//! ```
//! use qrs::index::{Encoding, MemoryIndex};
//! use qrs::query::{Operator, QueryExecutor, parse};
//!
//! let mut index = MemoryIndex::new();
//! index.add_document("a", &["the quick brown fox"]);
//! index.add_document("b", &["the lazy dog"]);
//!
//! let (query, rest) = parse("+the -lazy", Operator::Or, 32, Encoding::Utf8).unwrap();
//! assert!(rest.is_empty());
//!
//! let results = QueryExecutor::new(&index).execute(&query).unwrap();
//! assert_eq!(results.nhits(), 1);
//! ```

pub mod config;
pub mod error;
pub mod index;
pub mod query;
pub mod records;
pub mod session;
pub mod utils;

pub use config::QueryConfig;
pub use error::{Error, Result};
