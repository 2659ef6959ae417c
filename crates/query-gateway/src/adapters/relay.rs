//! Signed transaction relays.

use crate::domain::error::RelayError;
use crate::ports::TxRelay;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// POSTs raw transaction bytes as `application/cbor` to a submission
/// endpoint and hands back its JSON reply.
pub struct HttpTxRelay {
    client: Client,
    endpoint: String,
}

impl HttpTxRelay {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, RelayError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(2))
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl TxRelay for HttpTxRelay {
    async fn submit(&self, signed_tx: Vec<u8>) -> Result<Value, RelayError> {
        let size = signed_tx.len();
        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "application/cbor")
            .body(signed_tx)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "Relay rejected transaction");
            return Err(RelayError::Rejected {
                status: status.as_u16(),
                body: text,
            });
        }

        debug!(size, status = status.as_u16(), "Transaction relayed");

        // Some submit APIs answer with a bare tx id rather than JSON.
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
    }
}

/// Relay used when no endpoint is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledTxRelay;

#[async_trait]
impl TxRelay for DisabledTxRelay {
    async fn submit(&self, _signed_tx: Vec<u8>) -> Result<Value, RelayError> {
        Err(RelayError::NotConfigured)
    }
}
