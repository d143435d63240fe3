//! The index capability the executor queries, and an in-memory reference
//! implementation.

pub mod memory;
pub mod types;

use std::sync::Arc;

use crate::error::Result;

pub use memory::MemoryIndex;
pub use types::*;

/// Read-only term lookup against a full-text index.
///
/// Implementations may block on storage. They are never mutated by queries,
/// so one index can serve many contexts at once.
pub trait Index {
    fn lookup(&self, req: &LookupRequest<'_>) -> Result<Postings<'_>>;
}

impl<T: Index + ?Sized> Index for &T {
    fn lookup(&self, req: &LookupRequest<'_>) -> Result<Postings<'_>> {
        (**self).lookup(req)
    }
}

impl<T: Index + ?Sized> Index for Box<T> {
    fn lookup(&self, req: &LookupRequest<'_>) -> Result<Postings<'_>> {
        (**self).lookup(req)
    }
}

impl<T: Index + ?Sized> Index for Arc<T> {
    fn lookup(&self, req: &LookupRequest<'_>) -> Result<Postings<'_>> {
        (**self).lookup(req)
    }
}
