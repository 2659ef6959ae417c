//! Pagination cursor resolution.
//!
//! Turns the client's `(after, untilBlock)` hashes into block positions on
//! the current canonical chain, refusing cursors that a reorganization has
//! invalidated.

use crate::domain::error::ReferenceError;
use crate::domain::lookup::Lookup;
use crate::domain::types::{AfterCursor, BlockReference, HistoryQuery, ResolvedBounds, TransactionReference};
use crate::ports::LedgerIndex;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Resolves history cursors against a [`LedgerIndex`].
pub struct PaginationCursorResolver {
    index: Arc<dyn LedgerIndex>,
}

impl PaginationCursorResolver {
    pub fn new(index: Arc<dyn LedgerIndex>) -> Self {
        Self { index }
    }

    /// Look up both references concurrently and resolve them into bounds.
    ///
    /// Without `after` the transaction lookup is skipped entirely.
    #[instrument(skip(self, query), fields(until = %query.until_block, has_cursor = query.after.is_some()))]
    pub async fn resolve(&self, query: &HistoryQuery) -> Result<ResolvedBounds, ReferenceError> {
        let until_lookup = self.index.block_by_hash(&query.until_block);
        let after_lookup = async {
            match &query.after {
                Some(after) => Some(self.index.transaction_by_hash(&after.tx).await),
                None => None,
            }
        };

        let (until, after) = tokio::join!(until_lookup, after_lookup);

        let result = resolve_bounds(&query.until_block, query.after.as_ref(), until, after);
        match &result {
            Ok(bounds) => debug!(?bounds, "Resolved history bounds"),
            Err(e) => warn!(code = e.code(), error = ?e, "History cursor rejected"),
        }
        result
    }
}

/// Decide bounds from the two lookup outcomes.
///
/// Precedence: a cursor transaction found in a different block is reported
/// as `BlockMismatch` before any lookup failure is considered.
pub fn resolve_bounds(
    until_block: &str,
    after: Option<&AfterCursor>,
    until: Lookup<BlockReference>,
    after_tx: Option<Lookup<TransactionReference>>,
) -> Result<ResolvedBounds, ReferenceError> {
    if let (Some(cursor), Some(Lookup::Found(tx))) = (after, &after_tx) {
        if tx.block.hash != cursor.block {
            return Err(ReferenceError::BlockMismatch {
                tx: cursor.tx.clone(),
                expected_block: cursor.block.clone(),
                actual_block: tx.block.hash.clone(),
            });
        }
    }

    let until_block_number = match until {
        Lookup::Found(block) => Some(block.number),
        Lookup::NotFound => None,
        Lookup::Failed(cause) => {
            return Err(ReferenceError::BestBlockMismatch {
                until_block: until_block.to_owned(),
                cause,
            })
        }
    };

    let mut bounds = ResolvedBounds {
        until_block_number,
        ..Default::default()
    };

    match (after, after_tx) {
        (Some(_), Some(Lookup::Found(tx))) => {
            bounds.after_block_number = Some(tx.block.number);
            bounds.after_tx_index = Some(tx.tx_index);
            bounds.after_block = Some(tx.block);
        }
        (Some(cursor), Some(Lookup::Failed(cause))) => {
            return Err(ReferenceError::TxNotFound {
                tx: cursor.tx.clone(),
                cause,
            })
        }
        // NotFound or first page: start from genesis
        _ => {}
    }

    Ok(bounds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::IndexError;
    use crate::domain::types::{Address, BlockHash, IndexedTransaction, TxBody, TxHash, Utxo};
    use chrono::Utc;

    fn block(hash: &str, number: u64) -> BlockReference {
        BlockReference {
            hash: hash.into(),
            number,
            epoch: 0,
            slot: number,
        }
    }

    fn tx_in(hash: &str, block: BlockReference, tx_index: u32) -> TransactionReference {
        TransactionReference {
            hash: hash.into(),
            block,
            tx_index,
            included_at: Utc::now(),
        }
    }

    fn cursor(tx: &str, block: &str) -> AfterCursor {
        AfterCursor {
            tx: tx.into(),
            block: block.into(),
        }
    }

    #[test]
    fn test_first_page_is_bounded_by_until() {
        let bounds = resolve_bounds("cafe", None, Lookup::Found(block("cafe", 40)), None).unwrap();
        assert_eq!(bounds.until_block_number, Some(40));
        assert!(bounds.after_block_number.is_none());
        assert!(bounds.after_block.is_none());
    }

    #[test]
    fn test_until_not_found_is_unbounded() {
        let bounds = resolve_bounds("cafe", None, Lookup::NotFound, None).unwrap();
        assert_eq!(bounds, ResolvedBounds::default());
    }

    #[test]
    fn test_until_failure_is_best_block_mismatch() {
        let err = resolve_bounds("cafe", None, Lookup::Failed(IndexError::Timeout), None).unwrap_err();
        assert!(matches!(err, ReferenceError::BestBlockMismatch { .. }));
    }

    #[test]
    fn test_cursor_resolves_to_position() {
        let after = cursor("deadbeef", "feedface");
        let found = tx_in("deadbeef", block("feedface", 12), 3);
        let bounds = resolve_bounds(
            "cafe",
            Some(&after),
            Lookup::Found(block("cafe", 40)),
            Some(Lookup::Found(found)),
        )
        .unwrap();
        assert_eq!(bounds.after_block_number, Some(12));
        assert_eq!(bounds.after_tx_index, Some(3));
        assert_eq!(bounds.after_block.map(|b| b.hash), Some("feedface".to_string()));
        assert_eq!(bounds.until_block_number, Some(40));
    }

    #[test]
    fn test_reorged_cursor_is_block_mismatch_even_if_until_fails() {
        let after = cursor("deadbeef", "feedface");
        let moved = tx_in("deadbeef", block("00000", 12), 0);
        let err = resolve_bounds(
            "cafe",
            Some(&after),
            Lookup::Failed(IndexError::Unavailable("down".into())),
            Some(Lookup::Found(moved)),
        )
        .unwrap_err();
        assert_eq!(
            err,
            ReferenceError::BlockMismatch {
                tx: "deadbeef".into(),
                expected_block: "feedface".into(),
                actual_block: "00000".into(),
            }
        );
    }

    #[test]
    fn test_cursor_lookup_failure_is_tx_not_found() {
        let after = cursor("deadbeef", "feedface");
        let err = resolve_bounds(
            "cafe",
            Some(&after),
            Lookup::NotFound,
            Some(Lookup::Failed(IndexError::Query("boom".into()))),
        )
        .unwrap_err();
        assert!(matches!(err, ReferenceError::TxNotFound { ref tx, .. } if tx == "deadbeef"));
    }

    #[test]
    fn test_cursor_not_found_starts_from_genesis() {
        let after = cursor("deadbeef", "feedface");
        let bounds = resolve_bounds("cafe", Some(&after), Lookup::NotFound, Some(Lookup::NotFound)).unwrap();
        assert_eq!(bounds, ResolvedBounds::default());
    }

    #[test]
    fn test_until_failure_wins_over_cursor_failure() {
        let after = cursor("deadbeef", "feedface");
        let err = resolve_bounds(
            "cafe",
            Some(&after),
            Lookup::Failed(IndexError::Timeout),
            Some(Lookup::Failed(IndexError::Timeout)),
        )
        .unwrap_err();
        assert!(matches!(err, ReferenceError::BestBlockMismatch { .. }));
    }

    /// Both reference lookups park on one barrier, so they only complete
    /// when issued together.
    struct RendezvousIndex {
        barrier: tokio::sync::Barrier,
    }

    #[async_trait::async_trait]
    impl LedgerIndex for RendezvousIndex {
        async fn best_block(&self) -> Result<BlockReference, IndexError> {
            Err(IndexError::Timeout)
        }

        async fn block_by_hash(&self, hash: &BlockHash) -> Lookup<BlockReference> {
            self.barrier.wait().await;
            Lookup::Found(block(hash, 3))
        }

        async fn transaction_by_hash(&self, hash: &TxHash) -> Lookup<TransactionReference> {
            self.barrier.wait().await;
            Lookup::Found(tx_in(hash, block("feedface", 2), 9))
        }

        async fn utxos_for_addresses(&self, _: &[Address]) -> Result<Vec<Utxo>, IndexError> {
            Ok(Vec::new())
        }

        async fn utxo_sum_for_addresses(&self, _: &[Address]) -> Result<u64, IndexError> {
            Ok(0)
        }

        async fn transactions_touching(&self, _: &[Address]) -> Result<Vec<IndexedTransaction>, IndexError> {
            Ok(Vec::new())
        }

        async fn transaction_history(
            &self,
            _: &[Address],
            _: &ResolvedBounds,
            _: usize,
        ) -> Result<Vec<IndexedTransaction>, IndexError> {
            Ok(Vec::new())
        }

        async fn transaction_bodies(&self, _: &[TxHash]) -> Result<Vec<TxBody>, IndexError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_reference_lookups_run_concurrently() {
        let resolver = PaginationCursorResolver::new(Arc::new(RendezvousIndex {
            barrier: tokio::sync::Barrier::new(2),
        }));
        let query = HistoryQuery {
            addresses: vec!["addr1".into()],
            after: Some(cursor("deadbeef", "feedface")),
            until_block: "cafe".into(),
            limit: None,
        };

        let bounds = tokio::time::timeout(std::time::Duration::from_secs(2), resolver.resolve(&query))
            .await
            .expect("lookups were issued one after the other")
            .unwrap();

        assert_eq!(bounds.until_block_number, Some(3));
        assert_eq!(bounds.after_tx_index, Some(9));
    }
}
