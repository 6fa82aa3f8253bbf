//! Server configuration types and defaults.

use std::net::SocketAddr;

/// Default WebSocket path of the game relay endpoint.
pub const DEFAULT_PATH: &str = "/game";

/// Configuration structure for the relay server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// The socket address to bind the server to
    pub bind_address: SocketAddr,

    /// Request path the WebSocket endpoint answers on
    pub path: String,

    /// Maximum number of concurrent connections allowed
    pub max_connections: usize,

    /// Frames buffered per connection before further frames to it are dropped
    pub outbound_queue_capacity: usize,
}

impl ServerConfig {
    /// Checks the values a server cannot run with.
    pub fn validate(&self) -> Result<(), String> {
        if !self.path.starts_with('/') {
            return Err(format!("Endpoint path must start with '/': {}", self.path));
        }
        if self.max_connections == 0 {
            return Err("max_connections must be at least 1".to_string());
        }
        if self.outbound_queue_capacity == 0 {
            return Err("outbound_queue_capacity must be at least 1".to_string());
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 8080)),
            path: DEFAULT_PATH.to_string(),
            max_connections: 1000,
            outbound_queue_capacity: 256,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_address.to_string(), "127.0.0.1:8080");
        assert_eq!(config.path, "/game");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_relative_path() {
        let config = ServerConfig {
            path: "game".to_string(),
            ..Default::default()
        };
        assert!(config.validate().unwrap_err().contains("must start with '/'"));
    }

    #[test]
    fn rejects_zero_limits() {
        let config = ServerConfig {
            max_connections: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ServerConfig {
            outbound_queue_capacity: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
