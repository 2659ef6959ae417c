//! Query gateway service: wires ports, components and the HTTP server.

use crate::api::AppState;
use crate::domain::config::GatewayConfig;
use crate::domain::error::GatewayError;
use crate::domain::version::ClientVersionPolicy;
use crate::health::{run_health_poller, HealthChecker};
use crate::history::TransactionHistory;
use crate::middleware::GatewayMetrics;
use crate::ports::{LedgerIndex, SystemTimeSource, TimeSource, TxRelay};
use crate::router::build_router;
use crate::ws::ConnectionRegistry;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info};

/// Query gateway service state
pub struct GatewayService {
    config: GatewayConfig,
    state: AppState,
    shutdown_tx: watch::Sender<bool>,
}

impl GatewayService {
    /// Create a new gateway over the given index and relay
    pub fn new(
        config: GatewayConfig,
        index: Arc<dyn LedgerIndex>,
        relay: Arc<dyn TxRelay>,
    ) -> Result<Self, GatewayError> {
        Self::with_clock(config, index, relay, Arc::new(SystemTimeSource))
    }

    /// Same as [`GatewayService::new`] with an explicit time source
    pub fn with_clock(
        config: GatewayConfig,
        index: Arc<dyn LedgerIndex>,
        relay: Arc<dyn TxRelay>,
        clock: Arc<dyn TimeSource>,
    ) -> Result<Self, GatewayError> {
        config
            .validate()
            .map_err(|e| GatewayError::Config(e.to_string()))?;

        let history = Arc::new(TransactionHistory::new(
            Arc::clone(&index),
            config.limits.api_response_limit,
        ));
        let health = Arc::new(HealthChecker::new(
            Arc::clone(&index),
            clock,
            config.health.stale_after,
        ));
        let registry = Arc::new(ConnectionRegistry::new(
            config.websocket.max_connections,
            config.websocket.message_buffer_size,
        ));

        let state = AppState {
            index,
            relay,
            history,
            health,
            registry,
            metrics: Arc::new(GatewayMetrics::new()),
            version_policy: Arc::new(ClientVersionPolicy::new(&config.status)),
            limits: config.limits.clone(),
        };

        let (shutdown_tx, _) = watch::channel(false);

        Ok(Self {
            config,
            state,
            shutdown_tx,
        })
    }

    /// HTTP router with all routes and middleware
    pub fn router(&self) -> Router {
        build_router(self.state.clone(), &self.config)
    }

    /// Bind the configured address and serve until [`GatewayService::shutdown`]
    pub async fn start(&self) -> Result<(), GatewayError> {
        let listener = TcpListener::bind(self.config.http_addr())
            .await
            .map_err(|e| GatewayError::Bind(format!("{}: {}", self.config.http_addr(), e)))?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener
    pub async fn serve(&self, listener: TcpListener) -> Result<(), GatewayError> {
        let addr: Option<SocketAddr> = listener.local_addr().ok();
        info!(addr = ?addr, "Starting query gateway");

        let poller = tokio::spawn(run_health_poller(
            Arc::clone(&self.state.health),
            Arc::clone(&self.state.registry),
            Arc::clone(&self.state.metrics),
            self.config.health.poll_interval,
            self.shutdown_tx.subscribe(),
        ));

        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let result = axum::serve(listener, self.router())
            .with_graceful_shutdown(async move {
                // A closed channel also means shut down
                let _ = shutdown_rx.wait_for(|stop| *stop).await;
                info!("Received shutdown signal");
            })
            .await;

        self.shutdown();
        if let Err(e) = poller.await {
            error!(error = %e, "Health poller task failed");
        }

        match result {
            Ok(()) => {
                info!("Query gateway stopped");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "HTTP server error");
                Err(GatewayError::Serve(e.to_string()))
            }
        }
    }

    /// Trigger graceful shutdown
    pub fn shutdown(&self) {
        self.shutdown_tx.send_replace(true);
    }

    /// Get metrics
    pub fn metrics(&self) -> Arc<GatewayMetrics> {
        Arc::clone(&self.state.metrics)
    }

    /// Get the health checker
    pub fn health(&self) -> Arc<HealthChecker> {
        Arc::clone(&self.state.health)
    }

    /// Get the push connection registry
    pub fn registry(&self) -> Arc<ConnectionRegistry> {
        Arc::clone(&self.state.registry)
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}
