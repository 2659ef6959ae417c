//! Outbound ports for the query gateway.
//!
//! The gateway never queries storage directly: everything it knows about the
//! chain comes through [`LedgerIndex`], and signed transactions leave through
//! [`TxRelay`].

use crate::domain::error::{IndexError, RelayError};
use crate::domain::lookup::Lookup;
use crate::domain::types::{
    Address, BlockHash, BlockReference, IndexedTransaction, ResolvedBounds, TransactionReference,
    TxBody, TxHash, Utxo,
};
use async_trait::async_trait;

/// Read-only view of the ledger index.
///
/// Reference lookups return [`Lookup`] so callers can tell an absent value
/// from a failed query.
#[async_trait]
pub trait LedgerIndex: Send + Sync {
    /// Current chain tip.
    async fn best_block(&self) -> Result<BlockReference, IndexError>;

    /// Block with the given hash on the canonical chain.
    async fn block_by_hash(&self, hash: &BlockHash) -> Lookup<BlockReference>;

    /// Transaction with the given hash and the block it is confirmed in.
    async fn transaction_by_hash(&self, hash: &TxHash) -> Lookup<TransactionReference>;

    /// Unspent outputs owned by any of `addresses`.
    async fn utxos_for_addresses(&self, addresses: &[Address]) -> Result<Vec<Utxo>, IndexError>;

    /// Sum of unspent output amounts owned by any of `addresses`.
    async fn utxo_sum_for_addresses(&self, addresses: &[Address]) -> Result<u64, IndexError>;

    /// Transactions whose inputs or outputs touch any of `addresses`.
    async fn transactions_touching(
        &self,
        addresses: &[Address],
    ) -> Result<Vec<IndexedTransaction>, IndexError>;

    /// Transactions touching `addresses` inside `bounds`, ordered by
    /// `(block number, tx index)`, at most `limit` of them.
    async fn transaction_history(
        &self,
        addresses: &[Address],
        bounds: &ResolvedBounds,
        limit: usize,
    ) -> Result<Vec<IndexedTransaction>, IndexError>;

    /// Raw bodies for the given hashes. Unknown hashes are omitted.
    async fn transaction_bodies(&self, hashes: &[TxHash]) -> Result<Vec<TxBody>, IndexError>;
}

/// Forwards signed transactions to the network.
#[async_trait]
pub trait TxRelay: Send + Sync {
    /// Submit raw transaction bytes; returns the relay's JSON reply.
    async fn submit(&self, signed_tx: Vec<u8>) -> Result<serde_json::Value, RelayError>;
}

/// Time source trait for testability
pub trait TimeSource: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> u64;
}

/// System time implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now_ms(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            // Clock before Unix epoch
            .unwrap_or(0)
    }
}
