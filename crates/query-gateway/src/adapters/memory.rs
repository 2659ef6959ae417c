//! In-memory ledger index.
//!
//! Holds a canonical chain, its transactions and the current UTXO set behind
//! a `parking_lot::RwLock`. Seeded from a JSON snapshot, mutated by tests to
//! simulate new tips and reorganizations, and able to fail on demand.

use crate::domain::error::IndexError;
use crate::domain::lookup::Lookup;
use crate::domain::types::{
    Address, BlockHash, BlockReference, IndexedTransaction, ResolvedBounds, TransactionReference,
    TxBody, TxHash, Utxo,
};
use crate::ports::LedgerIndex;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

/// Serialized form of the index contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerSnapshot {
    pub blocks: Vec<BlockReference>,
    pub transactions: Vec<SnapshotTransaction>,
    pub utxos: Vec<Utxo>,
}

/// A transaction plus its raw body, if the index keeps one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotTransaction {
    #[serde(flatten)]
    pub tx: IndexedTransaction,
    #[serde(default)]
    pub body: Option<String>,
}

#[derive(Debug, Default)]
struct Failures {
    all: Option<IndexError>,
    block_lookups: Option<IndexError>,
}

/// Thread-safe in-memory [`LedgerIndex`].
#[derive(Debug, Default)]
pub struct InMemoryLedgerIndex {
    state: RwLock<LedgerSnapshot>,
    failures: RwLock<Failures>,
}

impl InMemoryLedgerIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(mut snapshot: LedgerSnapshot) -> Self {
        snapshot.blocks.sort_by_key(|b| b.number);
        Self {
            state: RwLock::new(snapshot),
            failures: RwLock::default(),
        }
    }

    /// Load a JSON snapshot from disk.
    pub fn load_snapshot(path: &Path) -> Result<Self, IndexError> {
        let raw = std::fs::read(path)?;
        let snapshot: LedgerSnapshot = serde_json::from_slice(&raw)?;
        info!(
            path = %path.display(),
            blocks = snapshot.blocks.len(),
            transactions = snapshot.transactions.len(),
            utxos = snapshot.utxos.len(),
            "Loaded ledger snapshot"
        );
        Ok(Self::from_snapshot(snapshot))
    }

    /// Copy of the current contents.
    pub fn snapshot(&self) -> LedgerSnapshot {
        self.state.read().clone()
    }

    /// Append a block as the new tip.
    pub fn push_block(&self, block: BlockReference) {
        let mut state = self.state.write();
        state.blocks.retain(|b| b.number != block.number);
        state.blocks.push(block);
        state.blocks.sort_by_key(|b| b.number);
    }

    pub fn add_transaction(&self, tx: IndexedTransaction, body: Option<String>) {
        let mut state = self.state.write();
        state.transactions.retain(|t| t.tx.reference.hash != tx.reference.hash);
        state.transactions.push(SnapshotTransaction { tx, body });
    }

    pub fn add_utxo(&self, utxo: Utxo) {
        self.state.write().utxos.push(utxo);
    }

    /// Drop every block above `number`, along with the transactions and
    /// UTXOs confirmed in them.
    pub fn rollback_to(&self, number: u64) {
        let mut state = self.state.write();
        state.blocks.retain(|b| b.number <= number);
        state
            .transactions
            .retain(|t| t.tx.reference.block.number <= number);
        state.utxos.retain(|u| u.block_number <= number);
        warn!(tip = number, "Ledger index rolled back");
    }

    /// Make every subsequent query fail with `err`.
    pub fn fail_with(&self, err: IndexError) {
        self.failures.write().all = Some(err);
    }

    /// Make only `block_by_hash` fail with `err`.
    pub fn fail_block_lookups_with(&self, err: IndexError) {
        self.failures.write().block_lookups = Some(err);
    }

    /// Clear injected failures.
    pub fn recover(&self) {
        *self.failures.write() = Failures::default();
    }

    fn check(&self) -> Result<(), IndexError> {
        match &self.failures.read().all {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn touching<'a>(
        state: &'a LedgerSnapshot,
        addresses: &'a [Address],
    ) -> impl Iterator<Item = &'a IndexedTransaction> + 'a {
        state
            .transactions
            .iter()
            .map(|t| &t.tx)
            .filter(move |tx| tx.touches(addresses))
    }
}

#[async_trait]
impl LedgerIndex for InMemoryLedgerIndex {
    async fn best_block(&self) -> Result<BlockReference, IndexError> {
        self.check()?;
        self.state
            .read()
            .blocks
            .last()
            .cloned()
            .ok_or_else(|| IndexError::Unavailable("no blocks indexed".into()))
    }

    async fn block_by_hash(&self, hash: &BlockHash) -> Lookup<BlockReference> {
        if let Err(err) = self.check() {
            return Lookup::Failed(err);
        }
        if let Some(err) = &self.failures.read().block_lookups {
            return Lookup::Failed(err.clone());
        }
        let state = self.state.read();
        match state.blocks.iter().find(|b| &b.hash == hash) {
            Some(block) => Lookup::Found(block.clone()),
            None => Lookup::NotFound,
        }
    }

    async fn transaction_by_hash(&self, hash: &TxHash) -> Lookup<TransactionReference> {
        self.check()
            .map(|()| {
                self.state
                    .read()
                    .transactions
                    .iter()
                    .find(|t| &t.tx.reference.hash == hash)
                    .map(|t| t.tx.reference.clone())
            })
            .into()
    }

    async fn utxos_for_addresses(&self, addresses: &[Address]) -> Result<Vec<Utxo>, IndexError> {
        self.check()?;
        let wanted: HashSet<&Address> = addresses.iter().collect();
        Ok(self
            .state
            .read()
            .utxos
            .iter()
            .filter(|u| wanted.contains(&u.address))
            .cloned()
            .collect())
    }

    async fn utxo_sum_for_addresses(&self, addresses: &[Address]) -> Result<u64, IndexError> {
        self.check()?;
        let wanted: HashSet<&Address> = addresses.iter().collect();
        Ok(self
            .state
            .read()
            .utxos
            .iter()
            .filter(|u| wanted.contains(&u.address))
            .fold(0u64, |sum, u| sum.saturating_add(u.amount)))
    }

    async fn transactions_touching(
        &self,
        addresses: &[Address],
    ) -> Result<Vec<IndexedTransaction>, IndexError> {
        self.check()?;
        let state = self.state.read();
        let mut txs: Vec<_> = Self::touching(&state, addresses).cloned().collect();
        txs.sort_by_key(IndexedTransaction::position);
        Ok(txs)
    }

    async fn transaction_history(
        &self,
        addresses: &[Address],
        bounds: &ResolvedBounds,
        limit: usize,
    ) -> Result<Vec<IndexedTransaction>, IndexError> {
        self.check()?;
        let state = self.state.read();
        let mut txs: Vec<_> = Self::touching(&state, addresses)
            .filter(|tx| {
                let (block, idx) = tx.position();
                bounds.contains(block, idx)
            })
            .cloned()
            .collect();
        txs.sort_by_key(IndexedTransaction::position);
        txs.truncate(limit);
        Ok(txs)
    }

    async fn transaction_bodies(&self, hashes: &[TxHash]) -> Result<Vec<TxBody>, IndexError> {
        self.check()?;
        let state = self.state.read();
        Ok(hashes
            .iter()
            .filter_map(|hash| {
                state
                    .transactions
                    .iter()
                    .find(|t| &t.tx.reference.hash == hash)
                    .and_then(|t| t.body.clone())
                    .map(|body| TxBody {
                        hash: hash.clone(),
                        body,
                    })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::TxIo;
    use chrono::Utc;

    fn block(hash: &str, number: u64) -> BlockReference {
        BlockReference {
            hash: hash.into(),
            number,
            epoch: 1,
            slot: number * 10,
        }
    }

    fn tx(hash: &str, block: BlockReference, idx: u32, from: &str, to: &str) -> IndexedTransaction {
        IndexedTransaction {
            reference: TransactionReference {
                hash: hash.into(),
                block,
                tx_index: idx,
                included_at: Utc::now(),
            },
            inputs: vec![TxIo {
                address: from.into(),
                amount: 10,
            }],
            outputs: vec![TxIo {
                address: to.into(),
                amount: 9,
            }],
        }
    }

    #[tokio::test]
    async fn test_best_block_is_highest() {
        let index = InMemoryLedgerIndex::new();
        assert!(index.best_block().await.is_err());

        index.push_block(block("b2", 2));
        index.push_block(block("b1", 1));
        assert_eq!(index.best_block().await.unwrap().hash, "b2");
    }

    #[tokio::test]
    async fn test_lookups_distinguish_missing_and_failed() {
        let index = InMemoryLedgerIndex::new();
        index.push_block(block("b1", 1));

        assert!(matches!(index.block_by_hash(&"b1".to_string()).await, Lookup::Found(_)));
        assert_eq!(index.block_by_hash(&"nope".to_string()).await, Lookup::NotFound);

        index.fail_with(IndexError::Timeout);
        assert_eq!(
            index.block_by_hash(&"b1".to_string()).await,
            Lookup::Failed(IndexError::Timeout)
        );
        assert!(index.utxo_sum_for_addresses(&["a".into()]).await.is_err());

        index.recover();
        assert!(matches!(index.block_by_hash(&"b1".to_string()).await, Lookup::Found(_)));
    }

    #[tokio::test]
    async fn test_rollback_moves_transaction() {
        let index = InMemoryLedgerIndex::new();
        index.push_block(block("feedface", 5));
        index.add_transaction(tx("deadbeef", block("feedface", 5), 0, "a", "b"), None);

        index.rollback_to(4);
        assert_eq!(index.transaction_by_hash(&"deadbeef".to_string()).await, Lookup::NotFound);

        index.push_block(block("00000", 5));
        index.add_transaction(tx("deadbeef", block("00000", 5), 0, "a", "b"), None);
        match index.transaction_by_hash(&"deadbeef".to_string()).await {
            Lookup::Found(found) => assert_eq!(found.block.hash, "00000"),
            other => panic!("unexpected lookup {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_utxo_sum_and_bodies() {
        let index = InMemoryLedgerIndex::new();
        for (i, amount) in [5u64, 7].iter().enumerate() {
            index.add_utxo(Utxo {
                tx_hash: format!("t{}", i),
                index: 0,
                address: "a".into(),
                amount: *amount,
                block_number: 1,
            });
        }
        assert_eq!(index.utxo_sum_for_addresses(&["a".into()]).await.unwrap(), 12);
        assert_eq!(index.utxo_sum_for_addresses(&["z".into()]).await.unwrap(), 0);

        index.add_transaction(tx("t0", block("b1", 1), 0, "a", "b"), Some("84a4".into()));
        let bodies = index
            .transaction_bodies(&["t0".into(), "missing".into()])
            .await
            .unwrap();
        assert_eq!(bodies, vec![TxBody { hash: "t0".into(), body: "84a4".into() }]);
    }

    #[test]
    fn test_snapshot_json_shape() {
        let raw = serde_json::json!({
            "blocks": [{ "hash": "b1", "number": 1, "epoch": 0, "slot": 3 }],
            "transactions": [{
                "hash": "t1",
                "block": { "hash": "b1", "number": 1, "epoch": 0, "slot": 3 },
                "tx_index": 0,
                "included_at": "2024-01-01T00:00:00Z",
                "inputs": [],
                "outputs": [{ "address": "a", "amount": 1 }],
                "body": "84a4"
            }]
        });
        let snapshot: LedgerSnapshot = serde_json::from_value(raw).unwrap();
        assert_eq!(snapshot.transactions[0].tx.reference.hash, "t1");
        assert_eq!(snapshot.transactions[0].body.as_deref(), Some("84a4"));
        assert!(snapshot.utxos.is_empty());
    }

    #[test]
    fn test_load_snapshot_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        std::fs::write(&path, r#"{"blocks":[{"hash":"b1","number":1,"epoch":0,"slot":1}]}"#).unwrap();
        let index = InMemoryLedgerIndex::load_snapshot(&path).unwrap();
        assert_eq!(index.snapshot().blocks.len(), 1);

        let missing = InMemoryLedgerIndex::load_snapshot(&dir.path().join("nope.json"));
        assert!(matches!(missing, Err(IndexError::Unavailable(_))));
    }
}
