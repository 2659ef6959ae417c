//! Gateway error taxonomy.
//!
//! Every failure a handler can produce maps onto one [`ApiError`] with a
//! stable machine-readable `code`, kept apart from the human-readable
//! message so the message can be withheld without losing the code.

use crate::domain::types::{BlockHash, TxHash};
use serde::Serialize;
use std::fmt;

/// Stable error codes returned in the `error.code` field.
pub mod codes {
    // Validation
    pub const MISSING_BODY: &str = "MISSING_BODY";
    pub const MALFORMED_JSON: &str = "MALFORMED_JSON";
    pub const MISSING_ADDRESSES: &str = "MISSING_ADDRESSES";
    pub const ADDRESSES_NOT_STRINGS: &str = "ADDRESSES_NOT_STRINGS";
    pub const TOO_MANY_ADDRESSES: &str = "TOO_MANY_ADDRESSES";
    pub const INVALID_LIMIT: &str = "INVALID_LIMIT";
    pub const LIMIT_EXCEEDED: &str = "LIMIT_EXCEEDED";
    pub const MALFORMED_CURSOR: &str = "MALFORMED_CURSOR";
    pub const MISSING_UNTIL_BLOCK: &str = "MISSING_UNTIL_BLOCK";
    pub const MISSING_TX_HASHES: &str = "MISSING_TX_HASHES";
    pub const TX_HASHES_OUT_OF_RANGE: &str = "TX_HASHES_OUT_OF_RANGE";
    pub const INVALID_SIGNED_TX: &str = "INVALID_SIGNED_TX";

    // Rejected by the HTTP stack before reaching a handler
    pub const PAYLOAD_TOO_LARGE: &str = "PAYLOAD_TOO_LARGE";
    pub const ROUTE_NOT_FOUND: &str = "ROUTE_NOT_FOUND";
    pub const METHOD_NOT_ALLOWED: &str = "METHOD_NOT_ALLOWED";
    pub const REQUEST_REJECTED: &str = "REQUEST_REJECTED";

    // Reference consistency
    pub const REFERENCE_BEST_BLOCK_MISMATCH: &str = "REFERENCE_BEST_BLOCK_MISMATCH";
    pub const REFERENCE_TX_NOT_FOUND: &str = "REFERENCE_TX_NOT_FOUND";
    pub const REFERENCE_BLOCK_MISMATCH: &str = "REFERENCE_BLOCK_MISMATCH";

    // Backend
    pub const UPSTREAM_ERROR: &str = "UPSTREAM_ERROR";
    pub const HEALTH_CHECK_FAILED: &str = "HEALTH_CHECK_FAILED";
    pub const RELAY_ERROR: &str = "RELAY_ERROR";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}

/// Malformed or out-of-bounds request input. Always detected before any
/// backend call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("error, no body")]
    MissingBody,
    #[error("request body is not valid JSON: {0}")]
    MalformedJson(String),
    #[error("error, no addresses.")]
    MissingAddresses,
    #[error("addresses must be an array of strings")]
    AddressesNotStrings,
    #[error("addresses request length {count} exceeds limit {limit}")]
    TooManyAddresses { count: usize, limit: usize },
    #[error("limit must be a positive integer")]
    InvalidLimit,
    #[error("limit {requested} exceeds api response limit {limit}")]
    LimitExceeded { requested: u64, limit: usize },
    #[error("after must carry both tx and block hashes")]
    MalformedCursor,
    #[error("untilBlock is required")]
    MissingUntilBlock,
    #[error("txBodies: must contain an array named txsHashes")]
    MissingTxHashes,
    #[error("txsHashes request length should be (0, {limit}]")]
    TxHashesOutOfRange { count: usize, limit: usize },
    #[error("signedTx must be a non-empty base64 string")]
    InvalidSignedTx,
}

impl ValidationError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingBody => codes::MISSING_BODY,
            Self::MalformedJson(_) => codes::MALFORMED_JSON,
            Self::MissingAddresses => codes::MISSING_ADDRESSES,
            Self::AddressesNotStrings => codes::ADDRESSES_NOT_STRINGS,
            Self::TooManyAddresses { .. } => codes::TOO_MANY_ADDRESSES,
            Self::InvalidLimit => codes::INVALID_LIMIT,
            Self::LimitExceeded { .. } => codes::LIMIT_EXCEEDED,
            Self::MalformedCursor => codes::MALFORMED_CURSOR,
            Self::MissingUntilBlock => codes::MISSING_UNTIL_BLOCK,
            Self::MissingTxHashes => codes::MISSING_TX_HASHES,
            Self::TxHashesOutOfRange { .. } => codes::TX_HASHES_OUT_OF_RANGE,
            Self::InvalidSignedTx => codes::INVALID_SIGNED_TX,
        }
    }
}

/// A client-supplied chain reference no longer matches the canonical chain.
///
/// The display text is the bare code: clients match on it to decide to
/// restart pagination.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReferenceError {
    /// The `untilBlock` lookup failed.
    #[error("REFERENCE_BEST_BLOCK_MISMATCH")]
    BestBlockMismatch {
        until_block: BlockHash,
        cause: IndexError,
    },
    /// The cursor transaction lookup failed.
    #[error("REFERENCE_TX_NOT_FOUND")]
    TxNotFound { tx: TxHash, cause: IndexError },
    /// The cursor transaction now lives in a different block.
    #[error("REFERENCE_BLOCK_MISMATCH")]
    BlockMismatch {
        tx: TxHash,
        expected_block: BlockHash,
        actual_block: BlockHash,
    },
}

impl ReferenceError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::BestBlockMismatch { .. } => codes::REFERENCE_BEST_BLOCK_MISMATCH,
            Self::TxNotFound { .. } => codes::REFERENCE_TX_NOT_FOUND,
            Self::BlockMismatch { .. } => codes::REFERENCE_BLOCK_MISMATCH,
        }
    }
}

/// The ledger index failed to answer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IndexError {
    #[error("ledger index unavailable: {0}")]
    Unavailable(String),
    #[error("ledger index query failed: {0}")]
    Query(String),
    #[error("ledger index timed out")]
    Timeout,
}

/// The signed-transaction relay failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RelayError {
    #[error("transaction relay is not configured")]
    NotConfigured,
    #[error("relay rejected transaction ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("relay transport error: {0}")]
    Transport(String),
}

/// Failure category, which decides the HTTP status and whether the message
/// comes from inside the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    Validation,
    ReferenceConsistency,
    Upstream,
    Health,
    Relay,
    Internal,
}

impl ErrorKind {
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation => 400,
            Self::ReferenceConsistency => 409,
            Self::Upstream | Self::Relay => 502,
            Self::Health => 503,
            Self::Internal => 500,
        }
    }

    /// Messages of these kinds carry backend text.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::Upstream | Self::Health | Self::Relay | Self::Internal
        )
    }
}

/// Error returned by every HTTP handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub kind: ErrorKind,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn new(kind: ErrorKind, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind,
            code,
            message: message.into(),
        }
    }

    /// Health poll failed or has not run yet
    pub fn health(reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::Health, codes::HEALTH_CHECK_FAILED, reason)
    }

    /// Internal error
    pub fn internal(details: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, codes::INTERNAL_ERROR, details)
    }

    pub fn status_code(&self) -> u16 {
        self.kind.status_code()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::new(ErrorKind::Validation, e.code(), e.to_string())
    }
}

impl From<ReferenceError> for ApiError {
    fn from(e: ReferenceError) -> Self {
        Self::new(ErrorKind::ReferenceConsistency, e.code(), e.to_string())
    }
}

impl From<IndexError> for ApiError {
    fn from(e: IndexError) -> Self {
        Self::new(ErrorKind::Upstream, codes::UPSTREAM_ERROR, e.to_string())
    }
}

impl From<RelayError> for ApiError {
    fn from(e: RelayError) -> Self {
        Self::new(ErrorKind::Relay, codes::RELAY_ERROR, e.to_string())
    }
}

/// Result type for handler operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Gateway-level errors (startup and serving, not per request)
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Server socket bind error
    #[error("server bind error: {0}")]
    Bind(String),

    /// Server stopped with an I/O error
    #[error("server error: {0}")]
    Serve(String),

    /// Ledger index could not be prepared
    #[error("ledger index error: {0}")]
    Index(#[from] IndexError),

    /// Transaction relay could not be prepared
    #[error("relay error: {0}")]
    Relay(#[from] RelayError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_error_message_is_code() {
        let err = ReferenceError::BlockMismatch {
            tx: "deadbeef".into(),
            expected_block: "feedface".into(),
            actual_block: "00000".into(),
        };
        assert_eq!(err.to_string(), "REFERENCE_BLOCK_MISMATCH");

        let api: ApiError = err.into();
        assert_eq!(api.code, codes::REFERENCE_BLOCK_MISMATCH);
        assert_eq!(api.kind, ErrorKind::ReferenceConsistency);
        assert_eq!(api.status_code(), 409);
    }

    #[test]
    fn test_validation_error_codes() {
        let err = ValidationError::TooManyAddresses {
            count: 51,
            limit: 50,
        };
        assert_eq!(err.code(), codes::TOO_MANY_ADDRESSES);
        assert!(err.to_string().contains("exceeds limit 50"));

        let api: ApiError = err.into();
        assert_eq!(api.status_code(), 400);
        assert!(!api.kind.is_internal());
    }

    #[test]
    fn test_upstream_error_is_internal() {
        let api: ApiError = IndexError::Query("relation \"tx\" does not exist".into()).into();
        assert_eq!(api.code, codes::UPSTREAM_ERROR);
        assert_eq!(api.status_code(), 502);
        assert!(api.kind.is_internal());
    }

    #[test]
    fn test_display_includes_code() {
        let api = ApiError::health("not yet polled");
        assert_eq!(api.to_string(), "[HEALTH_CHECK_FAILED] not yet polled");
    }
}
