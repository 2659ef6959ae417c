//! Address-set endpoints: usage filter, UTXOs and UTXO sum.

use super::AppState;
use crate::domain::error::ApiResult;
use crate::domain::types::{Address, IndexedTransaction, UtxoSumView, UtxoView};
use crate::domain::validation::{parse_body, validate_address_body};
use axum::{extract::State, Json};
use bytes::Bytes;
use std::collections::HashSet;
use tracing::{debug, instrument};

fn addresses_from(state: &AppState, raw: &Bytes) -> ApiResult<Vec<Address>> {
    let body = parse_body(raw)?;
    Ok(validate_address_body(
        body.as_ref(),
        state.limits.addresses_request_limit,
    )?)
}

/// `POST /v2/addresses/filterUsed`
#[instrument(skip_all)]
pub async fn filter_used(State(state): State<AppState>, raw: Bytes) -> ApiResult<Json<Vec<Address>>> {
    let addresses = addresses_from(&state, &raw)?;
    let transactions = state.index.transactions_touching(&addresses).await?;
    let used = used_addresses(&addresses, &transactions);
    debug!(requested = addresses.len(), used = used.len(), "Filtered used addresses");
    Ok(Json(used))
}

/// Requested addresses seen in any input or output, each once, in request
/// order.
pub fn used_addresses(requested: &[Address], transactions: &[IndexedTransaction]) -> Vec<Address> {
    let seen: HashSet<&str> = transactions
        .iter()
        .flat_map(|tx| tx.inputs.iter().chain(tx.outputs.iter()))
        .map(|io| io.address.as_str())
        .collect();

    let mut emitted = HashSet::new();
    requested
        .iter()
        .filter(|a| seen.contains(a.as_str()) && emitted.insert(a.as_str()))
        .cloned()
        .collect()
}

/// `POST /txs/utxoForAddresses`
#[instrument(skip_all)]
pub async fn utxos_for_addresses(State(state): State<AppState>, raw: Bytes) -> ApiResult<Json<Vec<UtxoView>>> {
    let addresses = addresses_from(&state, &raw)?;
    let utxos = state.index.utxos_for_addresses(&addresses).await?;
    Ok(Json(utxos.into_iter().map(UtxoView::from).collect()))
}

/// `POST /txs/utxoSumForAddresses`
#[instrument(skip_all)]
pub async fn utxo_sum_for_addresses(State(state): State<AppState>, raw: Bytes) -> ApiResult<Json<UtxoSumView>> {
    let addresses = addresses_from(&state, &raw)?;
    let sum = state.index.utxo_sum_for_addresses(&addresses).await?;
    Ok(Json(UtxoSumView { sum }))
}
