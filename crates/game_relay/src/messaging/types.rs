//! Message type definitions for the relay wire protocol.
//!
//! Every frame on the wire is a JSON object discriminated by a `type` field.
//! Clients may send `JOIN`, `MOVE`, or anything else (relayed verbatim).
//! `LEAVE` is only ever produced by the server when a transport closes.

use crate::types::PlayerId;
use serde::Serialize;
use serde_json::Number;

/// Wire name of the join announcement.
pub const JOIN: &str = "JOIN";
/// Wire name of a movement update.
pub const MOVE: &str = "MOVE";
/// Wire name of the server-generated departure notice.
pub const LEAVE: &str = "LEAVE";

/// Position and velocity reported by a client in a `MOVE` frame.
///
/// Numbers are kept exactly as the client wrote them, so an integer `-3`
/// is relayed as `-3` and `2.0` as `2.0`.
///
/// # Example
///
/// ```json
/// { "x": 1.5, "y": 2.0, "velX": -3, "grounded": false }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoveUpdate {
    pub x: Number,
    pub y: Number,
    #[serde(rename = "velX")]
    pub vel_x: Number,
    pub grounded: bool,
}

impl Default for MoveUpdate {
    fn default() -> Self {
        Self {
            x: Number::from(0),
            y: Number::from(0),
            vel_x: Number::from(0),
            grounded: true,
        }
    }
}

/// A decoded frame received from a client.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    /// The client announces its presence.
    Join,
    /// The client reports a new position.
    Move(MoveUpdate),
    /// Any other payload, kept byte-for-byte as received.
    Passthrough(String),
}

/// A message the relay sends to clients.
///
/// Recognized variants are serialized with `type` first and `id` second.
/// [`RelayMessage::Passthrough`] is never re-serialized; the codec emits the
/// stored text unchanged.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum RelayMessage {
    Join {
        id: PlayerId,
    },
    Move {
        id: PlayerId,
        #[serde(flatten)]
        update: MoveUpdate,
    },
    Leave {
        id: PlayerId,
    },
    #[serde(skip)]
    Passthrough(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn wire_type(message: &RelayMessage) -> String {
        let value: Value = serde_json::to_value(message).unwrap();
        value["type"].as_str().unwrap().to_string()
    }

    #[test]
    fn wire_tags_match_type_names() {
        let id = PlayerId::new();
        assert_eq!(wire_type(&RelayMessage::Join { id }), JOIN);
        assert_eq!(
            wire_type(&RelayMessage::Move {
                id,
                update: MoveUpdate::default()
            }),
            MOVE
        );
        assert_eq!(wire_type(&RelayMessage::Leave { id }), LEAVE);
    }
}
