//! HTTP endpoint handlers.
//!
//! Each handler validates its input completely before the first backend call
//! and returns `ApiResult<Json<_>>`; failures render through the fault
//! boundary in [`crate::middleware::errors`].

pub mod addresses;
pub mod chain;
pub mod txs;

use crate::domain::config::LimitsConfig;
use crate::domain::version::ClientVersionPolicy;
use crate::health::HealthChecker;
use crate::history::TransactionHistory;
use crate::middleware::GatewayMetrics;
use crate::ports::{LedgerIndex, TxRelay};
use crate::ws::ConnectionRegistry;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub index: Arc<dyn LedgerIndex>,
    pub relay: Arc<dyn TxRelay>,
    pub history: Arc<TransactionHistory>,
    pub health: Arc<HealthChecker>,
    pub registry: Arc<ConnectionRegistry>,
    pub metrics: Arc<GatewayMetrics>,
    pub version_policy: Arc<ClientVersionPolicy>,
    pub limits: LimitsConfig,
}
