//! Fault boundary: the one place handler failures become HTTP responses.
//!
//! `ApiError` renders itself as `{"error": {"code", "message"}}` and leaves a
//! copy in the response extensions. [`fault_boundary`] picks that copy up to
//! log it, count it and, when configured, withhold backend error text.

use crate::domain::error::{codes, ApiError, ErrorKind};
use crate::middleware::metrics::{GatewayMetrics, RequestTimer};
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::{error, warn};

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = error_body(self.code, &self.message);
        let mut response = (status, Json(body)).into_response();
        response.extensions_mut().insert(self);
        response
    }
}

fn error_body(code: &str, message: &str) -> serde_json::Value {
    serde_json::json!({
        "error": {
            "code": code,
            "message": message,
        }
    })
}

/// Replacement text used when backend messages are withheld.
pub fn generic_message(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::Upstream => "ledger index request failed",
        ErrorKind::Health => "importer health check failed",
        ErrorKind::Relay => "transaction relay failed",
        ErrorKind::Internal => "internal error",
        ErrorKind::Validation | ErrorKind::ReferenceConsistency => "request rejected",
    }
}

/// Error for a failure response that did not come from a handler, such as a
/// body-limit, routing or extractor rejection.
pub fn rejection_error(status: StatusCode) -> ApiError {
    if status.is_server_error() {
        return ApiError::internal(status.canonical_reason().unwrap_or("internal error"));
    }
    let (code, message) = match status {
        StatusCode::PAYLOAD_TOO_LARGE => (codes::PAYLOAD_TOO_LARGE, "request body too large"),
        StatusCode::NOT_FOUND => (codes::ROUTE_NOT_FOUND, "no such endpoint"),
        StatusCode::METHOD_NOT_ALLOWED => (codes::METHOD_NOT_ALLOWED, "method not allowed"),
        _ => (
            codes::REQUEST_REJECTED,
            status.canonical_reason().unwrap_or("request rejected"),
        ),
    };
    ApiError::new(ErrorKind::Validation, code, message)
}

/// Render `err` keeping the status the response already had.
fn render_with_status(err: ApiError, status: StatusCode) -> Response {
    let mut response = err.into_response();
    *response.status_mut() = status;
    response
}

/// State for [`fault_boundary`].
#[derive(Clone)]
pub struct FaultPolicy {
    pub expose_internal_messages: bool,
    pub metrics: Arc<GatewayMetrics>,
}

/// Log, count and optionally redact every failed request. Failure
/// responses produced outside the handlers are rewritten into the same JSON
/// error shape.
pub async fn fault_boundary(State(policy): State<FaultPolicy>, req: Request, next: Next) -> Response {
    let timer = RequestTimer::new(Arc::clone(&policy.metrics));
    let path = req.uri().path().to_owned();
    let response = next.run(req).await;
    let status = response.status();

    let (err, response) = match response.extensions().get::<ApiError>().cloned() {
        Some(err) => (err, response),
        None if status.is_client_error() || status.is_server_error() => {
            let err = rejection_error(status);
            (err.clone(), render_with_status(err, status))
        }
        None => {
            timer.finish(true);
            return response;
        }
    };
    timer.finish(false);

    match err.kind {
        ErrorKind::Validation => {
            policy.metrics.record_validation_rejection();
            warn!(path = %path, code = err.code, message = %err.message, "Request rejected");
        }
        ErrorKind::ReferenceConsistency => {
            policy.metrics.record_reference_mismatch();
            warn!(path = %path, code = err.code, "Stale history reference");
        }
        ErrorKind::Upstream | ErrorKind::Health | ErrorKind::Relay | ErrorKind::Internal => {
            policy.metrics.record_upstream_error();
            error!(path = %path, code = err.code, message = %err.message, "Request failed");
        }
    }

    if policy.expose_internal_messages || !err.kind.is_internal() {
        return response;
    }

    render_with_status(
        ApiError::new(err.kind, err.code, generic_message(err.kind)),
        response.status(),
    )
}
