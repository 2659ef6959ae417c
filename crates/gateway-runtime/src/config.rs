//! Configuration loading: optional TOML file, then `LQG_*` environment
//! overrides, then validation.

use query_gateway::GatewayConfig;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(String),
    #[error(transparent)]
    Invalid(#[from] query_gateway::domain::config::ConfigError),
}

/// Load from `path` (if given), apply environment overrides and validate.
pub fn load_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigLoadError> {
    let mut config = match path {
        Some(path) => {
            let content = std::fs::read_to_string(path).map_err(|source| ConfigLoadError::Read {
                path: path.display().to_string(),
                source,
            })?;
            toml::from_str(&content).map_err(|e| ConfigLoadError::Parse(e.to_string()))?
        }
        None => GatewayConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    config.validate()?;
    Ok(config)
}

/// Apply `LQG_*` overrides read through `lookup`. Unparseable values are
/// logged and ignored.
pub fn apply_env_overrides(config: &mut GatewayConfig, lookup: impl Fn(&str) -> Option<String>) {
    fn parse<T: std::str::FromStr>(key: &str, raw: String) -> Option<T> {
        match raw.trim().parse() {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(key, value = %raw, "Ignoring unparseable environment override");
                None
            }
        }
    }

    if let Some(port) = lookup("LQG_PORT").and_then(|v| parse("LQG_PORT", v)) {
        config.http.port = port;
    }
    if let Some(limit) = lookup("LQG_ADDRESSES_REQUEST_LIMIT").and_then(|v| parse("LQG_ADDRESSES_REQUEST_LIMIT", v)) {
        config.limits.addresses_request_limit = limit;
    }
    if let Some(limit) = lookup("LQG_API_RESPONSE_LIMIT").and_then(|v| parse("LQG_API_RESPONSE_LIMIT", v)) {
        config.limits.api_response_limit = limit;
    }
    if let Some(limit) = lookup("LQG_TXS_HASHES_REQUEST_LIMIT").and_then(|v| parse("LQG_TXS_HASHES_REQUEST_LIMIT", v)) {
        config.limits.txs_hashes_request_limit = limit;
    }
    if let Some(endpoint) = lookup("LQG_RELAY_ENDPOINT").filter(|v| !v.trim().is_empty()) {
        config.relay.endpoint = Some(endpoint);
    }
    if let Some(path) = lookup("LQG_LEDGER_SNAPSHOT").filter(|v| !v.trim().is_empty()) {
        config.ledger.snapshot_path = Some(path.into());
    }
    if let Some(expose) = lookup("LQG_EXPOSE_INTERNAL_ERRORS").and_then(|v| parse("LQG_EXPOSE_INTERNAL_ERRORS", v)) {
        config.errors.expose_internal_messages = expose;
    }

    debug!(port = config.http.port, "Environment overrides applied");
}
