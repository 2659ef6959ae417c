//! Adapters for the query gateway.
//!
//! Infrastructure implementations of the outbound ports.

pub mod clock;
pub mod error_conversions;
pub mod memory;
pub mod relay;

pub use clock::ManualTimeSource;
pub use memory::{InMemoryLedgerIndex, LedgerSnapshot, SnapshotTransaction};
pub use relay::{DisabledTxRelay, HttpTxRelay};
