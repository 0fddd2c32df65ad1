//! Delegate-Chain node entry point.

use anyhow::{Context, Result};
use node_runtime::{Engine, NodeConfig};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from("config.json"), PathBuf::from);
    let config = NodeConfig::load(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_filter.clone())),
        )
        .init();

    info!("Starting Delegate-Chain node");
    let engine = Engine::new(config);
    let handles = engine.start().await?;

    // Loops are spawned tasks; they stop when the runtime shuts down.
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
            Ok(())
        }
        outcome = handles.sync_loop => {
            match outcome {
                Ok(Err(e)) => {
                    // Persistence failed mid-rollback; continuing could
                    // corrupt the chain.
                    error!(error = %e, "Halting: chain state may be inconsistent");
                    Err(e.into())
                }
                _ => Ok(()),
            }
        }
    }
}
