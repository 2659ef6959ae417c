//! Chain tip, liveness and server status endpoints.

use super::AppState;
use crate::domain::error::ApiResult;
use crate::domain::types::{BestBlockView, ImporterHealthView, ServerStatusView};
use crate::ws::serve_connection;
use axum::{
    extract::{ws::WebSocketUpgrade, State},
    http::HeaderMap,
    response::Response,
    Json,
};
use std::sync::Arc;
use tracing::instrument;

/// `GET /v2/bestblock`
#[instrument(skip_all)]
pub async fn best_block(State(state): State<AppState>) -> ApiResult<Json<BestBlockView>> {
    let tip = state.index.best_block().await?;
    Ok(Json(tip.into()))
}

/// `GET /v2/importerhealthcheck`. Reads the last poll result only.
pub async fn importer_health(State(state): State<AppState>) -> ApiResult<Json<ImporterHealthView>> {
    state.health.status().to_view().map(Json)
}

/// `GET /status`
pub async fn server_status(State(state): State<AppState>, headers: HeaderMap) -> Json<ServerStatusView> {
    let client_version = headers
        .get(state.version_policy.header())
        .and_then(|v| v.to_str().ok());

    Json(ServerStatusView {
        is_server_ok: true,
        is_maintenance: state.version_policy.is_maintenance(client_version),
    })
}

/// `GET /metrics`
pub async fn metrics(State(state): State<AppState>) -> Json<serde_json::Value> {
    let mut body = state.metrics.to_json();
    body["websocket"]["registered"] = state.registry.connection_count().into();
    Json(body)
}

/// `GET /ws`
pub async fn ws_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    let registry = Arc::clone(&state.registry);
    let metrics = Arc::clone(&state.metrics);
    ws.on_upgrade(move |socket| serve_connection(socket, registry, metrics))
}
