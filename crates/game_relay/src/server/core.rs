//! Core relay server implementation.
//!
//! This module contains the `RelayServer` struct: it owns the connection
//! registry and the protocol handler, binds the listener, and runs the
//! accept loop until shutdown is requested.

use crate::config::ServerConfig;
use crate::connection::ConnectionRegistry;
use crate::error::RelayError;
use crate::protocol::ProtocolHandler;
use crate::server::handlers::handle_connection;
use socket2::{Domain, Protocol, Socket, Type};
use std::net::{SocketAddr, TcpListener as StdTcpListener};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{watch, Semaphore};
use tracing::{error, info, warn};

/// Listen backlog handed to the OS.
const LISTEN_BACKLOG: i32 = 1024;

/// The game relay server.
///
/// One instance owns one registry. Every connection task gets a clone of
/// the protocol handler, which shares that registry; nothing is global.
pub struct RelayServer {
    /// Server configuration settings
    config: Arc<ServerConfig>,

    /// Open connections and their player IDs
    registry: Arc<ConnectionRegistry>,

    /// Protocol state machine shared by all connection tasks
    handler: ProtocolHandler,

    /// One permit per allowed connection, held from accept until the
    /// connection task ends
    connection_slots: Arc<Semaphore>,

    /// Flips to `true` once shutdown is requested
    shutdown_sender: watch::Sender<bool>,
}

impl RelayServer {
    /// Creates a new relay server with the specified configuration.
    pub fn new(config: ServerConfig) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let handler = ProtocolHandler::new(registry.clone());
        let (shutdown_sender, _) = watch::channel(false);
        let connection_slots = Arc::new(Semaphore::new(
            config.max_connections.min(Semaphore::MAX_PERMITS),
        ));

        Self {
            config: Arc::new(config),
            registry,
            handler,
            connection_slots,
            shutdown_sender,
        }
    }

    /// Binds the configured address and serves until shutdown.
    pub async fn start(&self) -> Result<(), RelayError> {
        let listener = self.bind().await?;
        self.serve(listener).await
    }

    /// Creates the TCP listener for the configured bind address.
    pub async fn bind(&self) -> Result<TcpListener, RelayError> {
        self.config.validate().map_err(RelayError::Config)?;

        let address = self.config.bind_address;
        let socket = Socket::new(Domain::for_address(address), Type::STREAM, Some(Protocol::TCP))
            .map_err(|e| RelayError::Network(format!("Socket creation failed: {e}")))?;
        if let Err(e) = socket.set_reuse_address(true) {
            warn!("Failed to set SO_REUSEADDR: {}", e);
        }

        socket
            .bind(&address.into())
            .map_err(|e| RelayError::Network(format!("Bind to {address} failed: {e}")))?;
        socket
            .listen(LISTEN_BACKLOG)
            .map_err(|e| RelayError::Network(format!("Listen failed: {e}")))?;
        socket
            .set_nonblocking(true)
            .map_err(|e| RelayError::Network(format!("Failed to make socket non-blocking: {e}")))?;

        let std_listener: StdTcpListener = socket.into();
        let listener = TcpListener::from_std(std_listener)
            .map_err(|e| RelayError::Network(format!("Tokio listener creation failed: {e}")))?;

        info!("✅ Listener bound on {}", address);
        Ok(listener)
    }

    /// Runs the accept loop on an already bound listener.
    ///
    /// Each accepted stream is handled on its own task. Returns once
    /// [`RelayServer::shutdown`] has been called.
    pub async fn serve(&self, listener: TcpListener) -> Result<(), RelayError> {
        let local_addr = listener
            .local_addr()
            .map_err(|e| RelayError::Network(format!("Listener has no local address: {e}")))?;
        info!(
            "🚀 Relay listening on ws://{}{}",
            local_addr, self.config.path
        );

        let mut shutdown_receiver = self.shutdown_sender.subscribe();

        loop {
            let stopping = *shutdown_receiver.borrow_and_update();
            if stopping {
                break;
            }

            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, addr)) => self.accept(stream, addr),
                    Err(e) => error!("Failed to accept connection: {}", e),
                },
                _ = shutdown_receiver.changed() => {
                    info!("Shutdown signal received");
                }
            }
        }

        info!(
            "Relay stopped accepting connections ({} still open)",
            self.registry.len()
        );
        Ok(())
    }

    fn accept(&self, stream: tokio::net::TcpStream, addr: SocketAddr) {
        // Handshakes in flight count against the limit too.
        let permit = match self.connection_slots.clone().try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                warn!(
                    "Refusing connection from {}: limit of {} connections reached",
                    addr, self.config.max_connections
                );
                return;
            }
        };

        if let Err(e) = stream.set_nodelay(true) {
            warn!("Failed to set TCP_NODELAY for {}: {}", addr, e);
        }

        let handler = self.handler.clone();
        let config = self.config.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, addr, handler, config).await {
                warn!("Connection from {} ended with error: {}", addr, e);
            }
            drop(permit);
        });
    }

    /// Asks the accept loop to stop.
    pub async fn shutdown(&self) -> Result<(), RelayError> {
        info!("🛑 Shutting down relay...");
        self.shutdown_sender.send_replace(true);
        Ok(())
    }

    /// Number of currently open connections.
    pub fn connection_count(&self) -> usize {
        self.registry.len()
    }

    /// Connections that can still be accepted before the limit is reached.
    pub fn available_slots(&self) -> usize {
        self.connection_slots.available_permits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{timeout, Duration};

    fn test_config() -> ServerConfig {
        ServerConfig {
            bind_address: "127.0.0.1:0".parse().unwrap(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn bind_picks_ephemeral_port() {
        let server = RelayServer::new(test_config());
        let listener = server.bind().await.unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), 0);
    }

    #[tokio::test]
    async fn bind_rejects_invalid_config() {
        let server = RelayServer::new(ServerConfig {
            path: "no-slash".to_string(),
            ..test_config()
        });
        assert!(matches!(server.bind().await, Err(RelayError::Config(_))));
    }

    #[tokio::test]
    async fn shutdown_before_serve_returns_immediately() {
        let server = RelayServer::new(test_config());
        let listener = server.bind().await.unwrap();
        server.shutdown().await.unwrap();

        let result = timeout(Duration::from_secs(1), server.serve(listener)).await;
        assert!(matches!(result, Ok(Ok(()))));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn shutdown_stops_running_server() {
        let server = Arc::new(RelayServer::new(test_config()));
        let listener = server.bind().await.unwrap();

        let running = {
            let server = server.clone();
            tokio::spawn(async move { server.serve(listener).await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        server.shutdown().await.unwrap();

        let result = timeout(Duration::from_secs(1), running).await;
        assert!(matches!(result, Ok(Ok(Ok(())))));
        assert_eq!(server.connection_count(), 0);
    }

    #[test]
    fn slots_match_connection_limit() {
        let server = RelayServer::new(ServerConfig {
            max_connections: 3,
            ..test_config()
        });
        assert_eq!(server.available_slots(), 3);
    }
}
