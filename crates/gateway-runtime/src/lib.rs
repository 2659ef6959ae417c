//! Runtime support for the gateway binary: configuration loading and
//! adapter construction.

pub mod config;

pub use config::{apply_env_overrides, load_config, ConfigLoadError};

use query_gateway::adapters::{DisabledTxRelay, HttpTxRelay, InMemoryLedgerIndex};
use query_gateway::domain::error::GatewayError;
use query_gateway::ports::{LedgerIndex, TxRelay};
use query_gateway::GatewayConfig;
use std::sync::Arc;
use tracing::{info, warn};

/// Build the ledger index named by the config.
pub fn build_index(config: &GatewayConfig) -> Result<Arc<dyn LedgerIndex>, GatewayError> {
    match &config.ledger.snapshot_path {
        Some(path) => Ok(Arc::new(InMemoryLedgerIndex::load_snapshot(path)?)),
        None => {
            warn!("No ledger snapshot configured, serving an empty index");
            Ok(Arc::new(InMemoryLedgerIndex::new()))
        }
    }
}

/// Build the relay named by the config.
pub fn build_relay(config: &GatewayConfig) -> Result<Arc<dyn TxRelay>, GatewayError> {
    match &config.relay.endpoint {
        Some(endpoint) => {
            info!(endpoint = %endpoint, "Relaying signed transactions");
            Ok(Arc::new(HttpTxRelay::new(endpoint.clone(), config.relay.timeout)?))
        }
        None => {
            info!("No relay endpoint configured, /txs/signed is disabled");
            Ok(Arc::new(DisabledTxRelay))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_config_builds_empty_index_and_disabled_relay() {
        let config = GatewayConfig::default();
        let index = build_index(&config).unwrap();
        assert!(index.best_block().await.is_err());

        let relay = build_relay(&config).unwrap();
        assert!(relay.submit(vec![1]).await.is_err());
    }

    #[test]
    fn test_missing_snapshot_is_an_error() {
        let mut config = GatewayConfig::default();
        config.ledger.snapshot_path = Some("/nonexistent/ledger.json".into());
        assert!(matches!(build_index(&config), Err(GatewayError::Index(_))));
    }
}
