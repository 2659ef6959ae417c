//! Error conversions from infrastructure types.
//!
//! These conversions involve I/O types and belong in the adapters layer.

use crate::domain::error::{IndexError, RelayError};

impl From<std::io::Error> for IndexError {
    fn from(e: std::io::Error) -> Self {
        IndexError::Unavailable(e.to_string())
    }
}

impl From<serde_json::Error> for IndexError {
    fn from(e: serde_json::Error) -> Self {
        IndexError::Query(format!("malformed ledger data: {}", e))
    }
}

impl From<reqwest::Error> for RelayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() {
            RelayError::Transport(format!("cannot connect to relay: {}", e))
        } else {
            RelayError::Transport(e.to_string())
        }
    }
}
