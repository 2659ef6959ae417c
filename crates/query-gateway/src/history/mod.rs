//! Reorg-safe transaction history.
//!
//! [`TransactionHistory`] runs the two stages in order: resolve the cursor,
//! then assemble the page inside the resolved window.

pub mod assembler;
pub mod resolver;

pub use assembler::{shape_page, TransactionHistoryAssembler};
pub use resolver::{resolve_bounds, PaginationCursorResolver};

use crate::domain::error::{ApiError, IndexError, ReferenceError};
use crate::domain::types::{HistoryQuery, TxHistoryEntry};
use crate::ports::LedgerIndex;
use std::sync::Arc;

/// Failure of a history request after validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HistoryError {
    #[error(transparent)]
    Reference(#[from] ReferenceError),
    #[error(transparent)]
    Upstream(#[from] IndexError),
}

impl From<HistoryError> for ApiError {
    fn from(e: HistoryError) -> Self {
        match e {
            HistoryError::Reference(e) => e.into(),
            HistoryError::Upstream(e) => e.into(),
        }
    }
}

/// Resolver and assembler over one index.
pub struct TransactionHistory {
    resolver: PaginationCursorResolver,
    assembler: TransactionHistoryAssembler,
}

impl TransactionHistory {
    pub fn new(index: Arc<dyn LedgerIndex>, max_limit: usize) -> Self {
        Self {
            resolver: PaginationCursorResolver::new(Arc::clone(&index)),
            assembler: TransactionHistoryAssembler::new(index, max_limit),
        }
    }

    pub async fn page(&self, query: &HistoryQuery) -> Result<Vec<TxHistoryEntry>, HistoryError> {
        let bounds = self.resolver.resolve(query).await?;
        let page = self
            .assembler
            .assemble(&query.addresses, &bounds, query.limit)
            .await?;
        Ok(page)
    }
}
