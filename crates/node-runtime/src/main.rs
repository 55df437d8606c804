//! # Ledger Core Node
//!
//! Single-node runtime of the ledger core. Documents enter through the
//! transaction and block services; see the `node_runtime` library for the
//! wiring and `config` for the `LC_*` variables.

use anyhow::{Context, Result};
use node_runtime::{NodeConfig, NodeRuntime};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config = NodeConfig::load().context("Failed to load configuration")?;

    let filter = EnvFilter::try_new(&config.log_filter)
        .with_context(|| format!("Invalid log filter {:?}", config.log_filter))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let runtime = NodeRuntime::new(config).context("Failed to build the ledger core")?;
    let feed = runtime.start();

    info!("Node is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    runtime.shutdown();
    feed.await?;
    info!("Shutdown complete");
    Ok(())
}
