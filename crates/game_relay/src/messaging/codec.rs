//! Decoding of client frames and encoding of relay messages.

use super::types::{ClientMessage, MoveUpdate, RelayMessage, JOIN, MOVE};
use crate::error::CodecError;
use serde_json::{Number, Value};

/// Decodes a raw text frame received from a client.
///
/// Only input that is not valid JSON is rejected. A missing or non-string
/// `type`, or a type name the relay does not interpret (client-sent `LEAVE`
/// included), yields [`ClientMessage::Passthrough`] holding `raw` unchanged.
///
/// `MOVE` fields are defaulted one by one: a missing or wrong-typed `x`, `y`
/// or `velX` becomes `0`, a missing or wrong-typed `grounded` becomes `true`.
pub fn decode(raw: &str) -> Result<ClientMessage, CodecError> {
    let value: Value = serde_json::from_str(raw).map_err(CodecError::Malformed)?;

    let message = match value.get("type").and_then(Value::as_str) {
        Some(JOIN) => ClientMessage::Join,
        Some(MOVE) => ClientMessage::Move(move_update_from(&value)),
        _ => ClientMessage::Passthrough(raw.to_owned()),
    };

    Ok(message)
}

/// Encodes a relay message as wire text.
///
/// Passthrough messages are returned exactly as they were received.
pub fn encode(message: &RelayMessage) -> Result<String, CodecError> {
    match message {
        RelayMessage::Passthrough(raw) => Ok(raw.clone()),
        other => serde_json::to_string(other).map_err(CodecError::Encode),
    }
}

fn move_update_from(value: &Value) -> MoveUpdate {
    let defaults = MoveUpdate::default();
    MoveUpdate {
        x: number_field(value, "x").unwrap_or(defaults.x),
        y: number_field(value, "y").unwrap_or(defaults.y),
        vel_x: number_field(value, "velX").unwrap_or(defaults.vel_x),
        grounded: value
            .get("grounded")
            .and_then(Value::as_bool)
            .unwrap_or(defaults.grounded),
    }
}

fn number_field(value: &Value, key: &str) -> Option<Number> {
    value.get(key).and_then(Value::as_number).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PlayerId;
    use serde_json::json;

    #[test]
    fn decodes_join() {
        assert_eq!(decode(r#"{"type":"JOIN"}"#).unwrap(), ClientMessage::Join);
    }

    #[test]
    fn join_ignores_extra_fields() {
        let message = decode(r#"{"type":"JOIN","name":"steve","id":"spoofed"}"#).unwrap();
        assert_eq!(message, ClientMessage::Join);
    }

    #[test]
    fn decodes_full_move() {
        let message =
            decode(r#"{"type":"MOVE","x":1.5,"y":2.0,"velX":-3,"grounded":false}"#).unwrap();
        let update = match message {
            ClientMessage::Move(update) => update,
            other => panic!("expected MOVE, got {other:?}"),
        };
        assert_eq!(update.x.as_f64(), Some(1.5));
        assert_eq!(update.y.as_f64(), Some(2.0));
        assert_eq!(update.vel_x.as_i64(), Some(-3));
        assert!(!update.grounded);
    }

    #[test]
    fn empty_move_uses_defaults() {
        let message = decode(r#"{"type":"MOVE"}"#).unwrap();
        assert_eq!(message, ClientMessage::Move(MoveUpdate::default()));
    }

    #[test]
    fn wrong_typed_move_fields_default_independently() {
        let message =
            decode(r#"{"type":"MOVE","x":"left","y":7,"velX":null,"grounded":"yes"}"#).unwrap();
        let update = match message {
            ClientMessage::Move(update) => update,
            other => panic!("expected MOVE, got {other:?}"),
        };
        assert_eq!(update.x, Number::from(0));
        assert_eq!(update.y, Number::from(7));
        assert_eq!(update.vel_x, Number::from(0));
        assert!(update.grounded);
    }

    #[test]
    fn unknown_type_is_passed_through_verbatim() {
        let raw = r#"{"type":"PING",  "nonce":"abc"}"#;
        assert_eq!(decode(raw).unwrap(), ClientMessage::Passthrough(raw.to_string()));
    }

    #[test]
    fn client_leave_is_not_honored() {
        let raw = r#"{"type":"LEAVE","id":"someone-else"}"#;
        assert_eq!(decode(raw).unwrap(), ClientMessage::Passthrough(raw.to_string()));
    }

    #[test]
    fn missing_or_non_string_type_is_passed_through() {
        for raw in [r#"{"x":1}"#, r#"{"type":5}"#, r#"[1,2,3]"#, "42", r#""JOIN""#] {
            assert_eq!(
                decode(raw).unwrap(),
                ClientMessage::Passthrough(raw.to_string()),
                "input: {raw}"
            );
        }
    }

    #[test]
    fn type_names_are_case_sensitive() {
        let raw = r#"{"type":"join"}"#;
        assert_eq!(decode(raw).unwrap(), ClientMessage::Passthrough(raw.to_string()));
    }

    #[test]
    fn invalid_json_is_a_decode_failure() {
        for raw in ["", "not json", r#"{"type":"MOVE""#, "{'type':'JOIN'}"] {
            assert!(
                matches!(decode(raw), Err(CodecError::Malformed(_))),
                "input: {raw:?}"
            );
        }
    }

    #[test]
    fn encodes_join_and_leave_with_id() {
        let id = PlayerId::new();
        let join = encode(&RelayMessage::Join { id }).unwrap();
        assert_eq!(join, format!(r#"{{"type":"JOIN","id":"{id}"}}"#));

        let leave = encode(&RelayMessage::Leave { id }).unwrap();
        assert_eq!(leave, format!(r#"{{"type":"LEAVE","id":"{id}"}}"#));
    }

    #[test]
    fn encodes_move_in_wire_order() {
        let id = PlayerId::new();
        let update = match decode(r#"{"type":"MOVE","x":1.5,"y":2.0,"velX":-3,"grounded":false}"#)
            .unwrap()
        {
            ClientMessage::Move(update) => update,
            other => panic!("expected MOVE, got {other:?}"),
        };

        let text = encode(&RelayMessage::Move { id, update }).unwrap();
        assert_eq!(
            text,
            format!(r#"{{"type":"MOVE","id":"{id}","x":1.5,"y":2.0,"velX":-3,"grounded":false}}"#)
        );
    }

    #[test]
    fn encodes_default_move() {
        let id = PlayerId::new();
        let text = encode(&RelayMessage::Move {
            id,
            update: MoveUpdate::default(),
        })
        .unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(
            value,
            json!({"type": "MOVE", "id": id.to_string(), "x": 0, "y": 0, "velX": 0, "grounded": true})
        );
    }

    #[test]
    fn passthrough_is_not_reserialized() {
        let raw = "{ \"type\" : \"EMOTE\", \"kind\":\"wave\" }";
        let text = encode(&RelayMessage::Passthrough(raw.to_string())).unwrap();
        assert_eq!(text, raw);
    }
}
