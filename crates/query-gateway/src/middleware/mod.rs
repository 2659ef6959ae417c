//! Middleware stack for the query gateway.
//!
//! Layer order (outermost first): Tracing → CORS → fault boundary → body
//! limit → handler.

pub mod cors;
pub mod errors;
pub mod metrics;
pub mod tracing;

pub use cors::create_cors_layer;
pub use errors::{fault_boundary, generic_message, rejection_error, FaultPolicy};
pub use metrics::{GatewayMetrics, RequestTimer};
pub use self::tracing::TracingLayer;
