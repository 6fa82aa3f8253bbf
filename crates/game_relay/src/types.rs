//! Identity types shared across the relay.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Ephemeral identifier handed to a connection when it is accepted.
///
/// A player ID lives exactly as long as its connection and is never
/// persisted. It goes out on the wire as the hyphenated UUID string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub Uuid);

impl PlayerId {
    /// Creates a new random player ID using UUID v4.
    ///
    /// 122 random bits make collisions between live connections a
    /// non-concern in practice.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PlayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Process-local identifier of a transport connection.
///
/// Unique among open connections; handed out by a monotonically increasing
/// counter so it is in practice unique for the lifetime of the process too.
pub type ConnectionId = u64;
