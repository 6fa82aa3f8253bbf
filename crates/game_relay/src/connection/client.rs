//! Client connection representation.
//!
//! A [`ClientConnection`] is the relay's handle on one live WebSocket. It
//! never touches the socket directly: frames go into a bounded queue that a
//! per-connection writer task drains, so a fan-out never waits on a slow peer.

use crate::error::SendError;
use crate::types::ConnectionId;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_tungstenite::tungstenite::Message;

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Sending half of a connection's outbound queue.
pub type OutboundSender = mpsc::Sender<Message>;
/// Receiving half of a connection's outbound queue, owned by the writer task.
pub type OutboundReceiver = mpsc::Receiver<Message>;

/// Represents an individual client connection to the relay.
#[derive(Debug)]
pub struct ClientConnection {
    /// Identifier unique among open connections
    id: ConnectionId,

    /// The remote network address of the client
    remote_addr: SocketAddr,

    /// Outbound frame queue feeding the writer task
    sender: OutboundSender,
}

impl ClientConnection {
    /// Creates a connection handle around the sending half of its outbound queue.
    pub fn new(remote_addr: SocketAddr, sender: OutboundSender) -> Self {
        Self {
            id: NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
            remote_addr,
            sender,
        }
    }

    /// Creates a connection together with a fresh outbound queue of `capacity` frames.
    pub fn with_queue(remote_addr: SocketAddr, capacity: usize) -> (Self, OutboundReceiver) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self::new(remote_addr, sender), receiver)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn remote_addr(&self) -> SocketAddr {
        self.remote_addr
    }

    /// Whether the writer side has shut down.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Queues a text frame without waiting.
    pub fn send_text(&self, text: &str) -> Result<(), SendError> {
        self.send(Message::text(text.to_owned()))
    }

    /// Queues an arbitrary frame without waiting.
    pub fn send(&self, message: Message) -> Result<(), SendError> {
        self.sender.try_send(message).map_err(|e| match e {
            TrySendError::Full(_) => SendError::QueueFull,
            TrySendError::Closed(_) => SendError::Closed,
        })
    }
}
