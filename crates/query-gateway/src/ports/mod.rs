//! Ports (hexagonal architecture boundaries).

pub mod outbound;

pub use outbound::{LedgerIndex, SystemTimeSource, TimeSource, TxRelay};
