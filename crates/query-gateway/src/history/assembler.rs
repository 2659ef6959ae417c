//! History page assembly.

use crate::domain::error::IndexError;
use crate::domain::types::{Address, IndexedTransaction, ResolvedBounds, TxHistoryEntry};
use crate::ports::LedgerIndex;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Queries the resolved window and shapes the result page.
pub struct TransactionHistoryAssembler {
    index: Arc<dyn LedgerIndex>,
    max_limit: usize,
}

impl TransactionHistoryAssembler {
    pub fn new(index: Arc<dyn LedgerIndex>, max_limit: usize) -> Self {
        Self { index, max_limit }
    }

    /// `min(requested, max)`, or the max when unspecified.
    pub fn effective_limit(&self, requested: Option<usize>) -> usize {
        requested.map_or(self.max_limit, |n| n.min(self.max_limit))
    }

    #[instrument(skip(self, addresses), fields(addresses = addresses.len()))]
    pub async fn assemble(
        &self,
        addresses: &[Address],
        bounds: &ResolvedBounds,
        requested_limit: Option<usize>,
    ) -> Result<Vec<TxHistoryEntry>, IndexError> {
        let limit = self.effective_limit(requested_limit);
        let transactions = self
            .index
            .transaction_history(addresses, bounds, limit)
            .await?;

        let page = shape_page(transactions, bounds, limit);
        debug!(returned = page.len(), limit, "Assembled history page");
        Ok(page)
    }
}

/// Keep in-window rows, order by `(block, tx index)` and truncate, whatever
/// the backend handed back.
pub fn shape_page(
    mut transactions: Vec<IndexedTransaction>,
    bounds: &ResolvedBounds,
    limit: usize,
) -> Vec<TxHistoryEntry> {
    transactions.retain(|tx| {
        let (block, idx) = tx.position();
        bounds.contains(block, idx)
    });
    transactions.sort_by_key(IndexedTransaction::position);
    transactions.truncate(limit);
    transactions.into_iter().map(TxHistoryEntry::from).collect()
}
