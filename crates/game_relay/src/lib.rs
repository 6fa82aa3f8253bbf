//! # Game Relay - Real-Time Position Sync
//!
//! A small relay server for multiplayer 2D games. Clients connect over a
//! WebSocket endpoint, get a server-assigned player ID, and every state
//! update one client sends is fanned out to the other connected clients.
//!
//! The relay holds **no game state** beyond the set of open connections and
//! their player IDs. It never validates positions and never replays history.
//!
//! ## Architecture Overview
//!
//! ### Core Components
//!
//! * **Connection Registry** - Open connections and their player IDs
//! * **Message Codec** - Classifies inbound text frames and builds outbound ones
//! * **Broadcaster** - Fans a frame out to every peer but the sender, or to all
//! * **Protocol Handler** - Connection lifecycle and per-frame dispatch
//!
//! ### Message Flow
//!
//! 1. Client opens a WebSocket on the configured path (default `/game`)
//! 2. Server assigns a [`PlayerId`] and registers the connection
//! 3. `JOIN` and `MOVE` frames are stamped with the sender's ID and relayed
//! 4. Any other JSON frame is forwarded to the other clients byte-for-byte
//! 5. On disconnect every remaining client receives `{"type":"LEAVE","id":...}`
//!
//! ## Usage
//!
//! ```rust,no_run
//! use game_relay::{RelayServer, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), game_relay::RelayError> {
//!     let server = RelayServer::new(ServerConfig::default());
//!     server.start().await
//! }
//! ```

pub mod broadcast;
pub mod config;
pub mod connection;
pub mod error;
pub mod messaging;
pub mod protocol;
pub mod server;
pub mod types;

pub use broadcast::{BroadcastReport, Broadcaster};
pub use config::ServerConfig;
pub use connection::{ClientConnection, ConnectionRegistry, RegistryEntry};
pub use error::{CodecError, RelayError, SendError};
pub use messaging::{ClientMessage, MoveUpdate, RelayMessage};
pub use protocol::{ConnectionState, FrameOutcome, ProtocolHandler, RelaySession};
pub use server::RelayServer;
pub use types::{ConnectionId, PlayerId};
