//! Ledger query gateway executable.

use anyhow::{Context, Result};
use clap::Parser;
use gateway_runtime::{build_index, build_relay, load_config};
use query_gateway::GatewayService;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Read-only query gateway for an indexed ledger
#[derive(Parser, Debug)]
#[command(name = "gateway-runtime")]
#[command(about = "Serve chain tip, UTXO, history and importer health queries over HTTP")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the HTTP port
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .with_thread_ids(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = load_config(args.config.as_deref()).context("loading configuration")?;
    if let Some(port) = args.port {
        config.http.port = port;
    }

    let index = build_index(&config).context("building ledger index")?;
    let relay = build_relay(&config).context("building transaction relay")?;

    let service = Arc::new(GatewayService::new(config, index, relay)?);
    let mut running = {
        let service = Arc::clone(&service);
        tokio::spawn(async move { service.start().await })
    };

    info!(addr = %service.config().http_addr(), "Gateway is running. Press Ctrl+C to stop.");

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("Shutting down");
            service.shutdown();
            running.await??;
        }
        // Server exited on its own, e.g. the port was taken
        result = &mut running => {
            if let Err(e) = result? {
                error!(error = %e, "Gateway stopped");
                return Err(e.into());
            }
        }
    }

    Ok(())
}
