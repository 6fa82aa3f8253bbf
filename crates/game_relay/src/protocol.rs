//! Per-connection protocol state machine.
//!
//! A session moves `Connecting -> Open -> Closed`. While open, each text
//! frame is decoded, stamped with the sender's player ID where the protocol
//! calls for it, and fanned out to the other players. Closing the transport
//! unregisters the connection and announces a `LEAVE` to everyone left.

use crate::broadcast::{BroadcastReport, Broadcaster};
use crate::connection::{ClientConnection, ConnectionRegistry};
use crate::messaging::types::{JOIN, LEAVE, MOVE};
use crate::messaging::{self, ClientMessage, RelayMessage};
use crate::types::{ConnectionId, PlayerId};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Lifecycle of a single connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Transport accepted, not yet registered.
    Connecting,
    /// Registered and relaying frames.
    Open,
    /// Torn down. Terminal.
    Closed,
}

/// What happened to one inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The frame was fanned out to the other players.
    Relayed {
        kind: &'static str,
        report: BroadcastReport,
    },
    /// The frame was not valid JSON and was dropped.
    Dropped,
    /// The session is not open; the frame was ignored.
    Ignored,
}

/// Protocol-side view of one connection.
#[derive(Debug)]
pub struct RelaySession {
    connection: Arc<ClientConnection>,
    player_id: Option<PlayerId>,
    state: ConnectionState,
}

impl RelaySession {
    pub fn new(connection: Arc<ClientConnection>) -> Self {
        Self {
            connection,
            player_id: None,
            state: ConnectionState::Connecting,
        }
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection.id()
    }

    /// The player ID assigned when the session opened.
    pub fn player_id(&self) -> Option<PlayerId> {
        self.player_id
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }
}

/// Interprets inbound frames and drives the broadcaster.
#[derive(Debug, Clone)]
pub struct ProtocolHandler {
    registry: Arc<ConnectionRegistry>,
    broadcaster: Broadcaster,
}

impl ProtocolHandler {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        let broadcaster = Broadcaster::new(registry.clone());
        Self {
            registry,
            broadcaster,
        }
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Registers the session's connection and moves it to `Open`.
    ///
    /// Nothing is broadcast here; other players learn about the newcomer
    /// when it sends `JOIN`.
    pub fn open(&self, session: &mut RelaySession) -> PlayerId {
        if let (ConnectionState::Open, Some(player_id)) = (session.state, session.player_id) {
            return player_id;
        }

        let player_id = self.registry.register(session.connection.clone());
        session.player_id = Some(player_id);
        session.state = ConnectionState::Open;

        info!(
            "👋 Player {} connected from {} (connection {})",
            player_id,
            session.connection.remote_addr(),
            session.connection.id()
        );
        player_id
    }

    /// Handles one inbound text frame.
    pub fn handle_text(&self, session: &RelaySession, text: &str) -> FrameOutcome {
        let player_id = match (session.state, session.player_id) {
            (ConnectionState::Open, Some(player_id)) => player_id,
            _ => {
                debug!(
                    "Ignoring frame on connection {} in state {:?}",
                    session.connection.id(),
                    session.state
                );
                return FrameOutcome::Ignored;
            }
        };

        let message = match messaging::decode(text) {
            Ok(message) => message,
            Err(e) => {
                debug!("Dropping frame from player {}: {}", player_id, e);
                return FrameOutcome::Dropped;
            }
        };

        let (kind, outbound) = match message {
            ClientMessage::Join => (JOIN, RelayMessage::Join { id: player_id }),
            ClientMessage::Move(update) => (
                MOVE,
                RelayMessage::Move {
                    id: player_id,
                    update,
                },
            ),
            ClientMessage::Passthrough(raw) => ("PASSTHROUGH", RelayMessage::Passthrough(raw)),
        };

        let text = match messaging::encode(&outbound) {
            Ok(text) => text,
            Err(e) => {
                error!("Failed to encode {} from player {}: {}", kind, player_id, e);
                return FrameOutcome::Dropped;
            }
        };

        let report = self
            .broadcaster
            .broadcast_to_others(session.connection.id(), &text);
        debug!(
            "📨 Relayed {} from player {} to {} recipient(s)",
            kind, player_id, report.delivered
        );

        FrameOutcome::Relayed { kind, report }
    }

    /// Tears the session down after its transport closed.
    ///
    /// Returns the player ID that left, or `None` when the session had
    /// already been torn down.
    pub fn close(&self, session: &mut RelaySession) -> Option<PlayerId> {
        session.state = ConnectionState::Closed;
        self.close_connection(session.connection.id())
    }

    /// Unregisters a connection and, if it was still registered, tells every
    /// remaining player that it left.
    ///
    /// Safe to call any number of times; only the first call broadcasts.
    pub fn close_connection(&self, connection_id: ConnectionId) -> Option<PlayerId> {
        let player_id = self.registry.unregister(connection_id)?;

        match messaging::encode(&RelayMessage::Leave { id: player_id }) {
            Ok(text) => {
                let report = self.broadcaster.broadcast_to_all(&text);
                debug!(
                    "Announced {} of player {} to {} recipient(s)",
                    LEAVE, player_id, report.delivered
                );
            }
            Err(e) => error!("Failed to encode {} for player {}: {}", LEAVE, player_id, e),
        }

        info!("👋 Player {} disconnected (connection {})", player_id, connection_id);
        Some(player_id)
    }
}
