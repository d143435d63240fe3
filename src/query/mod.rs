pub mod ast;
pub mod executor;
pub mod parser;
pub mod pragma;
pub mod scorer;

pub use ast::{BinaryKind, ModeOverride, Node, Operator, Query, Term};
pub use executor::QueryExecutor;
pub use parser::{ParseOptions, parse, parse_with};
pub use pragma::{Escalation, PragmaSet, SectionWeights};
pub use scorer::{Scorer, ScoringPolicy, ScoringWeights};
