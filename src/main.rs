//! Wager relay (v1)
//!
//! HTTP backend that submits stake and payout transactions to a Sui
//! wager pool and keeps a local mirror of each successful one.
//!
//! # Architecture Overview
//!
//! ```text
//!   Client ──▶ http (axum) ──▶ game::service ──▶ blockchain::operations ──▶ Sui node
//!                                   │                     │
//!                                   ▼                     ├─ coins (gas / payment)
//!                               storage                   ├─ transaction (unsafe_moveCall)
//!                         (mirror records)                └─ executor (sign, execute, events)
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use wager_relay::blockchain::{HttpTransport, Signer, SuiClient, WagerOperations};
use wager_relay::config::{load_config, load_from_env};
use wager_relay::observability::{logging, metrics};
use wager_relay::storage::{GameStore, MemoryStore};
use wager_relay::{GameService, HttpServer};

#[derive(Parser, Debug)]
#[command(name = "wager-relay", version, about = "Sui wager pool relay")]
struct Cli {
    /// Path to a TOML config file. Without it, defaults plus WAGER_* overrides apply.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => load_from_env()?,
    };

    logging::init_logging(&config.observability, config.is_production());
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "wager-relay starting");

    tracing::info!(
        bind_address = %config.listener.bind_address,
        rpc_url = %config.chain.rpc_url,
        package_id = %config.chain.package_id,
        pool_id = %config.chain.pool_id,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let signer = Arc::new(Signer::from_env()?);
    tracing::info!(address = %signer.address(), "Signer loaded");

    let transport = HttpTransport::new(&config.chain.rpc_url, config.chain.rpc_timeout_secs)?;
    let client = SuiClient::new(Arc::new(transport));
    let operations = WagerOperations::new(client, signer, &config.chain);

    if let Err(e) = operations.validate_pool_config().await {
        tracing::warn!(error = %e, "Pool validation failed; continuing");
    }

    let store = match &config.storage.persistence_path {
        Some(path) => MemoryStore::load_from_file(path)?,
        None => MemoryStore::new(None),
    };
    let store_handle = store.clone();
    let store: Arc<dyn GameStore> = Arc::new(store);

    let service = GameService::new(Arc::new(operations), store, config.storage.history_limit);

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(config, service);
    server.run(listener).await?;

    match store_handle.save_to_file() {
        Ok(()) => tracing::info!(
            stakes = store_handle.stake_count(),
            pay_winners = store_handle.payout_count(),
            "Records flushed"
        ),
        Err(e) => tracing::error!(error = %e, "Failed to flush records on shutdown"),
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
