//! Record sets: the scored collections queries produce, with union,
//! intersection, subtraction, difference, sorting and grouping.

pub mod record;
pub mod set;
pub mod sort;

pub use record::{RecUnit, Record, RecordId, RecordKey, SubRecord};
pub use set::{RecordSet, RecordSetConfig};
pub use sort::{ByScore, GroupKey, RecordComparator, SortDirection};
