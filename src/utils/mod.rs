//! Shared text utilities.
//!
//! - [`tokenizer`] - whitespace tokenization and case folding used by the
//!   reference index

pub mod tokenizer;

pub use tokenizer::*;
