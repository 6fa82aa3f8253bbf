//! Command-line argument parsing for the relay binary.
//!
//! Every option except `--config` overrides the matching setting from the
//! configuration file.

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the game relay.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Real-time position relay for multiplayer games", long_about = None)]
pub struct Args {
    /// Configuration file path
    ///
    /// If the file doesn't exist, a default configuration will be created.
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Bind address (e.g., 0.0.0.0:8080)
    #[arg(short, long)]
    pub bind: Option<String>,

    /// WebSocket endpoint path (e.g., /game)
    #[arg(short, long)]
    pub path: Option<String>,

    /// Maximum number of concurrent connections
    #[arg(long)]
    pub max_connections: Option<usize>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Output logs in JSON format
    #[arg(long)]
    pub json_logs: bool,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            config: PathBuf::from("config.toml"),
            bind: None,
            path: None,
            max_connections: None,
            log_level: None,
            json_logs: false,
        }
    }
}
