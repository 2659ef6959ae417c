//! Three-outcome lookup result.
//!
//! Reference lookups distinguish "the index has no such value" from "the
//! index failed to answer". Cursor resolution treats the former as a normal
//! first-page / unbounded signal and the latter as a consistency failure, so
//! the two must never be folded into one `Option` or one error.

use crate::domain::error::IndexError;

/// Result of looking up a single reference in the ledger index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    /// The reference exists on the canonical chain.
    Found(T),
    /// The index answered, and there is no such reference.
    NotFound,
    /// The index could not answer.
    Failed(IndexError),
}

impl<T> From<Result<Option<T>, IndexError>> for Lookup<T> {
    fn from(result: Result<Option<T>, IndexError>) -> Self {
        match result {
            Ok(Some(value)) => Lookup::Found(value),
            Ok(None) => Lookup::NotFound,
            Err(err) => Lookup::Failed(err),
        }
    }
}
