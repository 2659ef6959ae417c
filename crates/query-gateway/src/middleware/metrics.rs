//! Gateway counters, exposed as JSON at `GET /metrics`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Query gateway metrics
#[derive(Debug, Default)]
pub struct GatewayMetrics {
    // Request counters
    pub requests_total: AtomicU64,
    pub requests_success: AtomicU64,
    pub requests_error: AtomicU64,

    // Failures by kind
    pub validation_rejected: AtomicU64,
    pub reference_mismatches: AtomicU64,
    pub upstream_errors: AtomicU64,

    // Health poller
    pub health_polls: AtomicU64,
    pub health_poll_failures: AtomicU64,
    pub tip_changes: AtomicU64,

    // WebSocket
    pub websocket_connections: AtomicU64,
    pub websocket_broadcasts: AtomicU64,
    pub websocket_messages_sent: AtomicU64,

    // Latency tracking (simplified)
    pub total_latency_ms: AtomicU64,
    pub request_count_for_latency: AtomicU64,
}

impl GatewayMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finished request
    pub fn record_request(&self, success: bool, latency_ms: u64) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);

        if success {
            self.requests_success.fetch_add(1, Ordering::Relaxed);
        } else {
            self.requests_error.fetch_add(1, Ordering::Relaxed);
        }

        self.total_latency_ms.fetch_add(latency_ms, Ordering::Relaxed);
        self.request_count_for_latency.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_validation_rejection(&self) {
        self.validation_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reference_mismatch(&self) {
        self.reference_mismatches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_upstream_error(&self) {
        self.upstream_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one health poll and whether it reached the index
    pub fn record_health_poll(&self, success: bool) {
        self.health_polls.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.health_poll_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_tip_change(&self) {
        self.tip_changes.fetch_add(1, Ordering::Relaxed);
    }

    /// Record WebSocket connection
    pub fn record_ws_connect(&self) {
        self.websocket_connections.fetch_add(1, Ordering::Relaxed);
    }

    /// Record WebSocket disconnection
    pub fn record_ws_disconnect(&self) {
        self.websocket_connections.fetch_sub(1, Ordering::Relaxed);
    }

    /// Record a broadcast and how many connections received it
    pub fn record_ws_broadcast(&self, delivered: usize) {
        self.websocket_broadcasts.fetch_add(1, Ordering::Relaxed);
        self.websocket_messages_sent
            .fetch_add(delivered as u64, Ordering::Relaxed);
    }

    /// Get average latency in ms
    pub fn average_latency_ms(&self) -> f64 {
        let total = self.total_latency_ms.load(Ordering::Relaxed);
        let count = self.request_count_for_latency.load(Ordering::Relaxed);
        if count == 0 {
            0.0
        } else {
            total as f64 / count as f64
        }
    }

    /// Export metrics as JSON
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "requests": {
                "total": self.requests_total.load(Ordering::Relaxed),
                "success": self.requests_success.load(Ordering::Relaxed),
                "error": self.requests_error.load(Ordering::Relaxed),
            },
            "failures": {
                "validation": self.validation_rejected.load(Ordering::Relaxed),
                "reference_mismatch": self.reference_mismatches.load(Ordering::Relaxed),
                "upstream": self.upstream_errors.load(Ordering::Relaxed),
            },
            "health": {
                "polls": self.health_polls.load(Ordering::Relaxed),
                "poll_failures": self.health_poll_failures.load(Ordering::Relaxed),
                "tip_changes": self.tip_changes.load(Ordering::Relaxed),
            },
            "websocket": {
                "connections": self.websocket_connections.load(Ordering::Relaxed),
                "broadcasts": self.websocket_broadcasts.load(Ordering::Relaxed),
                "messages_sent": self.websocket_messages_sent.load(Ordering::Relaxed),
            },
            "latency": {
                "average_ms": self.average_latency_ms(),
            }
        })
    }
}

/// Request timing helper
pub struct RequestTimer {
    start: Instant,
    metrics: Arc<GatewayMetrics>,
}

impl RequestTimer {
    pub fn new(metrics: Arc<GatewayMetrics>) -> Self {
        Self {
            start: Instant::now(),
            metrics,
        }
    }

    pub fn finish(self, success: bool) {
        let latency_ms = self.start.elapsed().as_millis() as u64;
        self.metrics.record_request(success, latency_ms);
    }
}
