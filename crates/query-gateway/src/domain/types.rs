//! Core ledger types and the JSON shapes returned to clients.
//!
//! Index-side types (`BlockReference`, `TransactionReference`, ...) are
//! transient: they are built per request from backend results and never
//! persisted by the gateway. The `*View` / entry types are the wire format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque address identifier.
pub type Address = String;

/// Block hash as reported by the index.
pub type BlockHash = String;

/// Transaction hash as reported by the index.
pub type TxHash = String;

/// A position in the canonical chain at observation time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockReference {
    pub hash: BlockHash,
    pub number: u64,
    pub epoch: u64,
    pub slot: u64,
}

/// A transaction together with the block it is currently confirmed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReference {
    pub hash: TxHash,
    pub block: BlockReference,
    pub tx_index: u32,
    pub included_at: DateTime<Utc>,
}

impl TransactionReference {
    /// `(block number, tx index)` ordering key.
    pub fn position(&self) -> (u64, u32) {
        (self.block.number, self.tx_index)
    }
}

/// One transaction input or output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxIo {
    pub address: Address,
    pub amount: u64,
}

/// A transaction with its inputs and outputs, as the history query returns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedTransaction {
    #[serde(flatten)]
    pub reference: TransactionReference,
    pub inputs: Vec<TxIo>,
    pub outputs: Vec<TxIo>,
}

impl IndexedTransaction {
    pub fn position(&self) -> (u64, u32) {
        self.reference.position()
    }

    /// True if any input or output belongs to one of `addresses`.
    pub fn touches(&self, addresses: &[Address]) -> bool {
        self.inputs
            .iter()
            .chain(self.outputs.iter())
            .any(|io| addresses.iter().any(|a| a == &io.address))
    }
}

/// An unspent output owned by an address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
    pub tx_hash: TxHash,
    pub index: u32,
    pub address: Address,
    pub amount: u64,
    pub block_number: u64,
}

/// Raw transaction body keyed by hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxBody {
    pub hash: TxHash,
    pub body: String,
}

// =============================================================================
// HISTORY QUERY
// =============================================================================

/// Pagination cursor: the last transaction a client saw and the block it was
/// confirmed in at that time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AfterCursor {
    pub tx: TxHash,
    pub block: BlockHash,
}

/// A validated history request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryQuery {
    pub addresses: Vec<Address>,
    pub after: Option<AfterCursor>,
    pub until_block: BlockHash,
    pub limit: Option<usize>,
}

/// Query window produced by cursor resolution.
///
/// `after_*` absent means "from genesis"; `until_block_number` absent means
/// "up to the current tip".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedBounds {
    pub after_block_number: Option<u64>,
    pub after_tx_index: Option<u32>,
    pub after_block: Option<BlockReference>,
    pub until_block_number: Option<u64>,
}

impl ResolvedBounds {
    /// Whether a transaction at `(block_number, tx_index)` falls inside the window.
    ///
    /// The lower bound compares `(block, tx_index)` pairs, so a page that ended
    /// mid-block resumes with the rest of that block instead of skipping it.
    pub fn contains(&self, block_number: u64, tx_index: u32) -> bool {
        let after_cursor = match (self.after_block_number, self.after_tx_index) {
            (None, _) => true,
            (Some(after), None) => block_number > after,
            (Some(after), Some(idx)) => (block_number, tx_index) > (after, idx),
        };
        let before_until = self
            .until_block_number
            .map_or(true, |until| block_number <= until);
        after_cursor && before_until
    }
}

// =============================================================================
// WIRE RESPONSES
// =============================================================================

/// `GET /v2/bestblock`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BestBlockView {
    pub epoch: u64,
    pub slot: u64,
    pub hash: BlockHash,
    pub height: u64,
}

impl From<BlockReference> for BestBlockView {
    fn from(block: BlockReference) -> Self {
        Self {
            epoch: block.epoch,
            slot: block.slot,
            hash: block.hash,
            height: block.number,
        }
    }
}

/// `POST /txs/utxoForAddresses` item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtxoView {
    pub utxo_id: String,
    pub tx_hash: TxHash,
    pub tx_index: u32,
    pub receiver: Address,
    pub amount: u64,
    pub block_num: u64,
}

impl From<Utxo> for UtxoView {
    fn from(utxo: Utxo) -> Self {
        Self {
            utxo_id: format!("{}:{}", utxo.tx_hash, utxo.index),
            tx_hash: utxo.tx_hash,
            tx_index: utxo.index,
            receiver: utxo.address,
            amount: utxo.amount,
            block_num: utxo.block_number,
        }
    }
}

/// `POST /txs/utxoSumForAddresses`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtxoSumView {
    pub sum: u64,
}

/// Settlement state reported for history entries. The index only holds
/// confirmed transactions, so `Successful` is the only state it can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxState {
    Successful,
}

/// `POST /v2/txs/history` item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxHistoryEntry {
    pub hash: TxHash,
    pub tx_ordinal: u32,
    pub tx_state: TxState,
    pub last_update: DateTime<Utc>,
    pub block_num: u64,
    pub block_hash: BlockHash,
    pub time: DateTime<Utc>,
    pub epoch: u64,
    pub slot: u64,
    pub inputs: Vec<TxIo>,
    pub outputs: Vec<TxIo>,
}

impl From<IndexedTransaction> for TxHistoryEntry {
    fn from(tx: IndexedTransaction) -> Self {
        let IndexedTransaction {
            reference,
            inputs,
            outputs,
        } = tx;
        Self {
            hash: reference.hash,
            tx_ordinal: reference.tx_index,
            tx_state: TxState::Successful,
            last_update: reference.included_at,
            block_num: reference.block.number,
            block_hash: reference.block.hash,
            time: reference.included_at,
            epoch: reference.block.epoch,
            slot: reference.block.slot,
            inputs,
            outputs,
        }
    }
}

/// `GET /v2/importerhealthcheck`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImporterHealthView {
    pub code: u16,
    pub message: String,
}

/// `GET /status`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerStatusView {
    pub is_server_ok: bool,
    pub is_maintenance: bool,
}

/// Server push sent to WebSocket clients when the tip advances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PushNotification {
    #[serde(rename = "bestblock")]
    BestBlock { block: BestBlockView },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(number: u64) -> BlockReference {
        BlockReference {
            hash: format!("b{}", number),
            number,
            epoch: 1,
            slot: number * 20,
        }
    }

    #[test]
    fn test_bounds_without_cursor_start_at_genesis() {
        let bounds = ResolvedBounds {
            until_block_number: Some(10),
            ..Default::default()
        };
        assert!(bounds.contains(0, 0));
        assert!(bounds.contains(10, 5));
        assert!(!bounds.contains(11, 0));
    }

    #[test]
    fn test_bounds_cursor_excludes_earlier_positions_in_same_block() {
        let bounds = ResolvedBounds {
            after_block_number: Some(5),
            after_tx_index: Some(2),
            after_block: Some(block(5)),
            until_block_number: None,
        };
        assert!(!bounds.contains(5, 2));
        assert!(!bounds.contains(4, 9));
        assert!(bounds.contains(5, 3));
        assert!(bounds.contains(1_000, 0));
    }

    #[test]
    fn test_bounds_block_only_cursor_is_strictly_greater() {
        let bounds = ResolvedBounds {
            after_block_number: Some(5),
            ..Default::default()
        };
        assert!(!bounds.contains(5, 7));
        assert!(bounds.contains(6, 0));
    }

    #[test]
    fn test_utxo_view_id() {
        let view = UtxoView::from(Utxo {
            tx_hash: "abcd".into(),
            index: 3,
            address: "addr1".into(),
            amount: 42,
            block_number: 7,
        });
        assert_eq!(view.utxo_id, "abcd:3");
        assert_eq!(view.receiver, "addr1");
        assert_eq!(view.block_num, 7);
    }

    #[test]
    fn test_history_entry_is_always_successful() {
        let tx = IndexedTransaction {
            reference: TransactionReference {
                hash: "tx1".into(),
                block: block(9),
                tx_index: 1,
                included_at: Utc::now(),
            },
            inputs: vec![],
            outputs: vec![],
        };
        let entry = TxHistoryEntry::from(tx);
        assert_eq!(entry.tx_state, TxState::Successful);
        assert_eq!(entry.block_num, 9);
        assert_eq!(entry.tx_ordinal, 1);

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["tx_state"], "Successful");
        assert_eq!(json["block_hash"], "b9");
    }

    #[test]
    fn test_status_view_is_camel_case() {
        let json = serde_json::to_value(ServerStatusView {
            is_server_ok: true,
            is_maintenance: false,
        })
        .unwrap();
        assert_eq!(json["isServerOk"], true);
        assert_eq!(json["isMaintenance"], false);
    }

    #[test]
    fn test_push_notification_shape() {
        let note = PushNotification::BestBlock {
            block: BestBlockView::from(block(3)),
        };
        let json = serde_json::to_value(&note).unwrap();
        assert_eq!(json["type"], "bestblock");
        assert_eq!(json["block"]["height"], 3);
    }
}
