//! Domain layer: ledger types, request validation, error taxonomy and
//! configuration. Nothing here performs I/O.

pub mod config;
pub mod correlation;
pub mod error;
pub mod lookup;
pub mod types;
pub mod validation;
pub mod version;

pub use config::{GatewayConfig, LimitsConfig};
pub use correlation::CorrelationId;
pub use error::{ApiError, ApiResult, ErrorKind, GatewayError, IndexError, ReferenceError, RelayError, ValidationError};
pub use lookup::Lookup;
pub use types::*;
pub use version::ClientVersionPolicy;
