//! Gateway configuration with validation.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Main gateway configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// HTTP server configuration
    pub http: HttpConfig,
    /// Request cardinality limits
    pub limits: LimitsConfig,
    /// Importer health polling
    pub health: HealthConfig,
    /// `/status` maintenance policy
    pub status: StatusConfig,
    /// WebSocket push channel
    pub websocket: WebSocketConfig,
    /// CORS configuration
    pub cors: CorsConfig,
    /// Signed transaction relay
    pub relay: RelayConfig,
    /// Ledger index source
    pub ledger: LedgerConfig,
    /// Error rendering policy
    pub errors: ErrorsConfig,
}

impl GatewayConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.limits.addresses_request_limit == 0 {
            return Err(ConfigError::InvalidLimit(
                "addresses_request_limit cannot be 0".into(),
            ));
        }

        if self.limits.api_response_limit == 0 {
            return Err(ConfigError::InvalidLimit(
                "api_response_limit cannot be 0".into(),
            ));
        }

        if self.limits.txs_hashes_request_limit == 0 {
            return Err(ConfigError::InvalidLimit(
                "txs_hashes_request_limit cannot be 0".into(),
            ));
        }

        if self.http.max_body_size == 0 {
            return Err(ConfigError::InvalidLimit("max_body_size cannot be 0".into()));
        }

        if self.health.poll_interval.is_zero() {
            return Err(ConfigError::InvalidDuration(
                "health poll_interval cannot be 0".into(),
            ));
        }

        if self.health.stale_after.is_zero() {
            return Err(ConfigError::InvalidDuration(
                "health stale_after cannot be 0".into(),
            ));
        }

        if crate::domain::version::parse_version(&self.status.min_mobile_version).is_none() {
            return Err(ConfigError::Invalid(format!(
                "min_mobile_version '{}' is not a dotted numeric version",
                self.status.min_mobile_version
            )));
        }

        if self.websocket.enabled && self.websocket.message_buffer_size == 0 {
            return Err(ConfigError::InvalidLimit(
                "websocket message_buffer_size cannot be 0".into(),
            ));
        }

        Ok(())
    }

    /// Get HTTP server bind address
    pub fn http_addr(&self) -> SocketAddr {
        SocketAddr::new(self.http.host, self.http.port)
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Bind address
    pub host: IpAddr,
    /// Port (default: 8082)
    pub port: u16,
    /// Max request body size in bytes
    pub max_body_size: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
            port: 8082,
            max_body_size: 1024 * 1024, // 1MB
        }
    }
}

/// Request limits, enforced before any backend call
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Max addresses per request
    pub addresses_request_limit: usize,
    /// Max items per response (and max history `limit`)
    pub api_response_limit: usize,
    /// Max hashes per txBodies request
    pub txs_hashes_request_limit: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            addresses_request_limit: 50,
            api_response_limit: 50,
            txs_hashes_request_limit: 150,
        }
    }
}

/// Importer health polling
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Interval between chain tip polls
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
    /// Unchanged tip older than this is reported as stale
    #[serde(with = "humantime_serde")]
    pub stale_after: Duration,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(20),
            stale_after: Duration::from_secs(5 * 60),
        }
    }
}

/// Maintenance flag policy for `/status`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusConfig {
    /// Request header carrying `<platform> / <version>`
    pub client_version_header: String,
    /// Mobile clients below this version are told the server is in maintenance
    pub min_mobile_version: String,
    /// Header prefixes identifying mobile clients
    pub mobile_prefixes: Vec<String>,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            client_version_header: "client-version".to_string(),
            min_mobile_version: "2.2.2".to_string(),
            mobile_prefixes: vec![
                "android / ".to_string(),
                "ios / ".to_string(),
                "- /".to_string(),
            ],
        }
    }
}

/// WebSocket push channel
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebSocketConfig {
    /// Accept WebSocket upgrades on `/ws`
    pub enabled: bool,
    /// Max registered connections
    pub max_connections: usize,
    /// Per-connection outbound buffer
    pub message_buffer_size: usize,
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_connections: 1024,
            message_buffer_size: 64,
        }
    }
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Enable CORS
    pub enabled: bool,
    /// Allowed origins ("*" for all)
    pub allowed_origins: Vec<String>,
    /// Allowed methods
    pub allowed_methods: Vec<String>,
    /// Allowed headers
    pub allowed_headers: Vec<String>,
    /// Max age for preflight cache
    pub max_age: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed_origins: vec!["*".to_string()],
            allowed_methods: vec!["GET".to_string(), "POST".to_string(), "OPTIONS".to_string()],
            allowed_headers: vec!["Content-Type".to_string(), "client-version".to_string()],
            max_age: 86400, // 24 hours
        }
    }
}

/// Signed transaction relay
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Submission endpoint; `None` disables `/txs/signed`
    pub endpoint: Option<String>,
    /// Per-submission timeout
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Ledger index source
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// JSON snapshot seeding the in-memory index
    pub snapshot_path: Option<PathBuf>,
}

/// Error rendering policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorsConfig {
    /// Echo backend error text to clients. Leaks internal details; when
    /// disabled, upstream messages are replaced and only the code is kept.
    pub expose_internal_messages: bool,
}

impl Default for ErrorsConfig {
    fn default() -> Self {
        Self {
            expose_internal_messages: true,
        }
    }
}

/// Configuration errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// Invalid size or count limit
    #[error("invalid limit: {0}")]
    InvalidLimit(String),
    /// Invalid duration value
    #[error("invalid duration: {0}")]
    InvalidDuration(String),
    /// General configuration error
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Duration serialization as `"20s"`, `"500ms"`, `"5m"` or plain seconds
pub mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if duration.subsec_millis() != 0 {
            serializer.serialize_str(&format!("{}ms", duration.as_millis()))
        } else {
            serializer.serialize_str(&format!("{}s", duration.as_secs()))
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_duration(&s).map_err(serde::de::Error::custom)
    }

    pub fn parse_duration(s: &str) -> Result<Duration, &'static str> {
        let s = s.trim();
        // "ms" before "s" and "m"
        if let Some(ms) = s.strip_suffix("ms") {
            ms.trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| "invalid milliseconds")
        } else if let Some(secs) = s.strip_suffix('s') {
            secs.trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| "invalid seconds")
        } else if let Some(mins) = s.strip_suffix('m') {
            mins.trim()
                .parse::<u64>()
                .ok()
                .and_then(|m| m.checked_mul(60))
                .map(Duration::from_secs)
                .ok_or("invalid minutes")
        } else {
            s.parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| "invalid duration format")
        }
    }
}
