//! Transaction endpoints: history, bodies and signed submission.

use super::AppState;
use crate::domain::error::ApiResult;
use crate::domain::types::TxHistoryEntry;
use crate::domain::validation::{decode_signed_tx, parse_body, validate_history_request, validate_tx_hashes};
use axum::{extract::State, Json};
use bytes::Bytes;
use serde_json::{Map, Value};
use tracing::{info, instrument};

/// `POST /v2/txs/history`
#[instrument(skip_all)]
pub async fn history(State(state): State<AppState>, raw: Bytes) -> ApiResult<Json<Vec<TxHistoryEntry>>> {
    let body = parse_body(&raw)?;
    let query = validate_history_request(
        body.as_ref(),
        state.limits.addresses_request_limit,
        state.limits.api_response_limit,
    )?;
    let page = state.history.page(&query).await?;
    Ok(Json(page))
}

/// `POST /txs/txBodies`
#[instrument(skip_all)]
pub async fn tx_bodies(State(state): State<AppState>, raw: Bytes) -> ApiResult<Json<Map<String, Value>>> {
    let body = parse_body(&raw)?;
    let hashes = validate_tx_hashes(body.as_ref(), state.limits.txs_hashes_request_limit)?;
    let bodies = state.index.transaction_bodies(&hashes).await?;
    Ok(Json(
        bodies
            .into_iter()
            .map(|b| (b.hash, Value::String(b.body)))
            .collect(),
    ))
}

/// `POST /txs/signed`
#[instrument(skip_all)]
pub async fn submit_signed(State(state): State<AppState>, raw: Bytes) -> ApiResult<Json<Value>> {
    let body = parse_body(&raw)?;
    let signed_tx = decode_signed_tx(body.as_ref())?;
    let size = signed_tx.len();
    let reply = state.relay.submit(signed_tx).await?;
    info!(size, "Signed transaction relayed");
    Ok(Json(reply))
}
