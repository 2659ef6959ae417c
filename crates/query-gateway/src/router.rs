//! Route table and middleware stack.

use crate::api::{addresses, chain, txs, AppState};
use crate::domain::config::GatewayConfig;
use crate::middleware::{create_cors_layer, fault_boundary, FaultPolicy, TracingLayer};
use axum::{
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;

/// Build the HTTP router over `state`.
pub fn build_router(state: AppState, config: &GatewayConfig) -> Router {
    let policy = FaultPolicy {
        expose_internal_messages: config.errors.expose_internal_messages,
        metrics: Arc::clone(&state.metrics),
    };

    let mut router = Router::new()
        .route("/v2/bestblock", get(chain::best_block))
        .route("/v2/importerhealthcheck", get(chain::importer_health))
        .route("/status", get(chain::server_status))
        .route("/metrics", get(chain::metrics))
        .route("/v2/addresses/filterUsed", post(addresses::filter_used))
        .route("/txs/utxoForAddresses", post(addresses::utxos_for_addresses))
        .route("/txs/utxoSumForAddresses", post(addresses::utxo_sum_for_addresses))
        .route("/v2/txs/history", post(txs::history))
        .route("/txs/txBodies", post(txs::tx_bodies))
        .route("/txs/signed", post(txs::submit_signed));

    if config.websocket.enabled {
        router = router.route("/ws", get(chain::ws_upgrade));
    }

    // Layers only wrap what is registered before them, the fallback included.
    router = router.fallback(not_found);

    // Each layer wraps everything added before it; tracing is outermost.
    // The body limit sits inside the fault boundary so its 413 is rendered
    // and counted like any other rejection.
    router
        .layer(RequestBodyLimitLayer::new(config.http.max_body_size))
        .layer(from_fn_with_state(policy, fault_boundary))
        .layer(create_cors_layer(&config.cors))
        .layer(TracingLayer::new())
        .with_state(state)
}

/// Unknown paths; the fault boundary renders the error body.
async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}
