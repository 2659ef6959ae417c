//! Importer liveness.
//!
//! The chain tip is polled on a fixed interval. A tip that keeps moving means
//! the importer is healthy; a tip that stops moving for longer than the
//! staleness window is reported as stale; a failed poll is an error.

use crate::domain::error::{ApiError, IndexError};
use crate::domain::types::{BestBlockView, BlockReference, ImporterHealthView, PushNotification};
use crate::middleware::GatewayMetrics;
use crate::ports::{LedgerIndex, TimeSource};
use crate::ws::ConnectionRegistry;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

pub const IMPORTER_OK: &str = "Importer is OK";
pub const IMPORTER_STALE: &str =
    "Importer seems OK. Not enough time has passed since last valid request.";
pub const NOT_YET_POLLED: &str = "not yet polled";

/// Most recent classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Ok,
    Stale,
    Error(String),
}

impl HealthStatus {
    /// Importer health endpoint body, or the failure to report.
    pub fn to_view(&self) -> Result<ImporterHealthView, ApiError> {
        match self {
            HealthStatus::Ok => Ok(ImporterHealthView {
                code: 200,
                message: IMPORTER_OK.to_string(),
            }),
            HealthStatus::Stale => Ok(ImporterHealthView {
                code: 200,
                message: IMPORTER_STALE.to_string(),
            }),
            HealthStatus::Error(reason) => Err(ApiError::health(reason.clone())),
        }
    }
}

/// Last observed tip and when it last changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthSnapshot {
    pub last_observed_tip: Option<BlockReference>,
    pub last_changed_at_ms: u64,
    pub status: HealthStatus,
}

impl Default for HealthSnapshot {
    fn default() -> Self {
        Self {
            last_observed_tip: None,
            last_changed_at_ms: 0,
            status: HealthStatus::Error(NOT_YET_POLLED.to_string()),
        }
    }
}

/// Result of a single poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOutcome {
    pub status: HealthStatus,
    /// Set when the tip moved on this poll.
    pub new_tip: Option<BlockReference>,
}

/// Polls the chain tip and classifies importer liveness.
pub struct HealthChecker {
    index: Arc<dyn LedgerIndex>,
    clock: Arc<dyn TimeSource>,
    stale_after: Duration,
    snapshot: RwLock<HealthSnapshot>,
}

impl HealthChecker {
    pub fn new(index: Arc<dyn LedgerIndex>, clock: Arc<dyn TimeSource>, stale_after: Duration) -> Self {
        Self {
            index,
            clock,
            stale_after,
            snapshot: RwLock::new(HealthSnapshot::default()),
        }
    }

    /// Query the tip once and update the classification.
    pub async fn poll(&self) -> PollOutcome {
        let tip = self.index.best_block().await;
        self.observe(tip)
    }

    /// Fold one tip query result into the snapshot.
    pub fn observe(&self, tip: Result<BlockReference, IndexError>) -> PollOutcome {
        let now = self.clock.now_ms();
        let mut snapshot = self.snapshot.write();

        let outcome = match tip {
            Err(e) => PollOutcome {
                status: HealthStatus::Error(e.to_string()),
                new_tip: None,
            },
            Ok(tip) if snapshot.last_observed_tip.as_ref() != Some(&tip) => {
                snapshot.last_observed_tip = Some(tip.clone());
                snapshot.last_changed_at_ms = now;
                PollOutcome {
                    status: HealthStatus::Ok,
                    new_tip: Some(tip),
                }
            }
            Ok(_) => {
                let quiet_for = now.saturating_sub(snapshot.last_changed_at_ms);
                let status = if quiet_for < self.stale_after.as_millis() as u64 {
                    HealthStatus::Ok
                } else {
                    HealthStatus::Stale
                };
                PollOutcome {
                    status,
                    new_tip: None,
                }
            }
        };

        snapshot.status = outcome.status.clone();
        outcome
    }

    /// Latest classification. Never touches the index.
    pub fn status(&self) -> HealthStatus {
        self.snapshot.read().status.clone()
    }

    pub fn snapshot(&self) -> HealthSnapshot {
        self.snapshot.read().clone()
    }
}

/// Poll on `interval` until `shutdown` flips to true, broadcasting every new
/// tip to the registered push connections.
pub async fn run_health_poller(
    checker: Arc<HealthChecker>,
    registry: Arc<ConnectionRegistry>,
    metrics: Arc<GatewayMetrics>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    info!(interval_ms = interval.as_millis() as u64, "Health poller started");
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
                continue;
            }
        }

        let outcome = checker.poll().await;
        metrics.record_health_poll(!matches!(outcome.status, HealthStatus::Error(_)));

        match &outcome.status {
            HealthStatus::Ok => debug!("Importer healthy"),
            HealthStatus::Stale => warn!("Importer tip has not moved within the staleness window"),
            HealthStatus::Error(reason) => error!(reason = %reason, "Importer health poll failed"),
        }

        if let Some(tip) = outcome.new_tip {
            metrics.record_tip_change();
            let note = PushNotification::BestBlock {
                block: BestBlockView::from(tip),
            };
            match serde_json::to_string(&note) {
                Ok(message) => {
                    let delivered = registry.broadcast(&message);
                    metrics.record_ws_broadcast(delivered);
                    debug!(delivered, "Broadcast new tip");
                }
                Err(e) => error!(error = %e, "Failed to encode tip notification"),
            }
        }
    }

    info!("Health poller stopped");
}
