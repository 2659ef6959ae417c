//! WebSocket push connection.
//!
//! Clients only listen: every new chain tip is pushed as
//! `{"type":"bestblock","block":{...}}`. Inbound frames other than ping and
//! close are ignored.

use crate::middleware::GatewayMetrics;
use crate::ws::registry::ConnectionRegistry;
use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Drive one upgraded socket until either side goes away.
pub async fn serve_connection(
    socket: WebSocket,
    registry: Arc<ConnectionRegistry>,
    metrics: Arc<GatewayMetrics>,
) {
    let (id, mut outbound) = match registry.register() {
        Ok(registered) => registered,
        Err(e) => {
            warn!(error = %e, "Rejecting WebSocket connection");
            let mut socket = socket;
            let _ = socket.send(Message::Close(None)).await;
            return;
        }
    };

    metrics.record_ws_connect();
    info!(connection_id = %id, "New WebSocket connection");

    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            pushed = outbound.recv() => {
                let Some(text) = pushed else { break };
                if let Err(e) = sink.send(Message::Text(text)).await {
                    debug!(connection_id = %id, error = %e, "Push failed");
                    break;
                }
            }
            incoming = stream.next() => {
                match incoming {
                    Some(Ok(Message::Ping(data))) => {
                        if sink.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        debug!(connection_id = %id, "WebSocket close received");
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(connection_id = %id, error = %e, "WebSocket error");
                        break;
                    }
                }
            }
        }
    }

    registry.remove(&id);
    metrics.record_ws_disconnect();
    info!(connection_id = %id, "WebSocket connection closed");
}
