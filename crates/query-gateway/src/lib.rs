//! Ledger query gateway: a read-only HTTP front for an indexed blockchain
//! ledger.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                        QUERY GATEWAY                             │
//! ├──────────────────────────────────────────────────────────────────┤
//! │   HTTP (axum)  ──  Tracing → CORS → BodyLimit → FaultBoundary    │
//! │        │                                                         │
//! │   api handlers ── validation (addresses, history, txsHashes)     │
//! │        │                                                         │
//! │   history: PaginationCursorResolver → TransactionHistoryAssembler│
//! │   health:  HealthChecker ◄── poller ──► ConnectionRegistry (/ws) │
//! │        │                                                         │
//! │   ports: LedgerIndex, TxRelay, TimeSource                        │
//! └────────┼─────────────────────────────────────────────────────────┘
//!          ▼
//!   ledger index / submission endpoint
//! ```
//!
//! History pagination is reorg-safe: the client's cursor `(tx, block)` is
//! re-resolved on every request, and a transaction that now lives in a
//! different block fails with `REFERENCE_BLOCK_MISMATCH` so the client can
//! restart from a fresh tip.
//!
//! # Usage
//!
//! ```ignore
//! use query_gateway::{adapters::InMemoryLedgerIndex, adapters::DisabledTxRelay};
//! use query_gateway::{GatewayConfig, GatewayService};
//!
//! let index = Arc::new(InMemoryLedgerIndex::new());
//! let service = GatewayService::new(GatewayConfig::default(), index, Arc::new(DisabledTxRelay))?;
//! service.start().await?;
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod adapters;
pub mod api;
pub mod domain;
pub mod health;
pub mod history;
pub mod middleware;
pub mod ports;
pub mod router;
pub mod service;
pub mod ws;

// Re-exports for public API
pub use domain::config::GatewayConfig;
pub use domain::error::{ApiError, ApiResult, GatewayError};
pub use domain::types::*;
pub use health::{HealthChecker, HealthStatus};
pub use history::TransactionHistory;
pub use middleware::GatewayMetrics;
pub use service::GatewayService;
pub use ws::ConnectionRegistry;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
