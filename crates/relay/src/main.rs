//! Main entry point for the game relay.
//!
//! Loads configuration, applies command-line overrides, installs logging,
//! and runs the relay until a termination signal arrives.

mod cli;
mod config;
mod logging;
mod shutdown;

use anyhow::{anyhow, Result};
use clap::Parser;
use game_relay::RelayServer;
use std::sync::Arc;
use tracing::{error, info};

use crate::cli::Args;
use crate::config::AppConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration first (before logging setup)
    let mut config = AppConfig::load_from_file(&args.config).await?;
    config.apply_args(&args);
    config
        .validate()
        .map_err(|e| anyhow!("Configuration validation failed: {}", e))?;

    logging::setup_logging(&config.logging)?;

    info!("🚀 Game Relay v{}", env!("CARGO_PKG_VERSION"));
    info!("📋 Configuration Summary:");
    info!("  📂 Config file: {}", args.config.display());
    info!("  🌐 Bind address: {}", config.server.bind_address);
    info!("  🛣️ Endpoint path: {}", config.server.path);
    info!("  👥 Max connections: {}", config.server.max_connections);
    info!(
        "  📬 Outbound queue per connection: {}",
        config.server.outbound_queue_capacity
    );

    let server = Arc::new(RelayServer::new(config.to_server_config()?));

    let signal_server = server.clone();
    tokio::spawn(async move {
        match shutdown::wait_for_signal().await {
            Ok(()) => {
                if let Err(e) = signal_server.shutdown().await {
                    error!("Error during shutdown: {}", e);
                }
            }
            Err(e) => error!("Failed to install signal handlers: {}", e),
        }
    });

    if let Err(e) = server.start().await {
        error!("❌ Relay error: {}", e);
        return Err(e.into());
    }

    info!("✅ Relay shutdown complete");
    Ok(())
}
