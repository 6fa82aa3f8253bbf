//! Error types for the relay.
//!
//! None of these are ever reported back to a connected client; the wire
//! protocol has no error reply. They surface in logs and at the server
//! startup boundary.

use thiserror::Error;

/// Errors raised while starting or running the relay server.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Socket creation, binding, accepting or handshake failures.
    #[error("Network error: {0}")]
    Network(String),

    /// Invalid server configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors produced by the message codec.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The inbound frame is not valid JSON.
    #[error("Malformed frame: {0}")]
    Malformed(#[source] serde_json::Error),

    /// An outbound message failed to serialize.
    #[error("Failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Why a frame could not be queued for a single recipient.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SendError {
    /// The connection's writer has gone away.
    #[error("connection closed")]
    Closed,

    /// The outbound queue is saturated; the recipient is not keeping up.
    #[error("outbound queue full")]
    QueueFull,
}
