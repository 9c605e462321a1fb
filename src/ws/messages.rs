//! WebSocket message types: envelope and commands.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Top-level WebSocket message envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsMessage {
    /// Client-provided ID for requests; server-generated for events.
    pub id: String,
    /// Message type discriminator.
    #[serde(rename = "type")]
    pub msg_type: WsMessageType,
    /// ISO-8601 timestamp.
    pub timestamp: DateTime<Utc>,
    /// Variant-specific payload.
    pub payload: serde_json::Value,
}

impl WsMessage {
    /// Builds a server message stamped with the current time.
    #[must_use]
    pub fn new(id: String, msg_type: WsMessageType, payload: serde_json::Value) -> Self {
        Self {
            id,
            msg_type,
            timestamp: Utc::now(),
            payload,
        }
    }

    /// Builds an error message with a numeric code.
    #[must_use]
    pub fn error(id: String, code: u32, message: &str) -> Self {
        Self::new(
            id,
            WsMessageType::Error,
            serde_json::json!({ "code": code, "message": message }),
        )
    }
}

/// Discriminator for WebSocket message types.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WsMessageType {
    /// Client → Server command.
    Command,
    /// Server → Client response to a command.
    Response,
    /// Server → Client broadcast event.
    Event,
    /// Server → Client error.
    Error,
}

/// Commands that a client can send in the payload of a `command` message.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum WsCommand {
    /// Follow events for specific addresses. Use `["*"]` for all events.
    Subscribe {
        /// Addresses to follow.
        addresses: Vec<String>,
    },
    /// Stop following addresses. `"*"` clears the wildcard.
    Unsubscribe {
        /// Addresses to drop.
        addresses: Vec<String>,
    },
    /// Get the current ledger state.
    GetState,
    /// Check whether an address staked this round.
    VerifyStake {
        /// Address to check.
        address: String,
    },
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn subscribe_command_parses() {
        let payload = serde_json::json!({ "command": "subscribe", "addresses": ["*"] });
        let Ok(cmd) = serde_json::from_value::<WsCommand>(payload) else {
            panic!("valid command");
        };
        assert_eq!(
            cmd,
            WsCommand::Subscribe {
                addresses: vec!["*".to_string()]
            }
        );
    }

    #[test]
    fn unit_command_parses() {
        let payload = serde_json::json!({ "command": "get_state" });
        assert!(matches!(
            serde_json::from_value::<WsCommand>(payload),
            Ok(WsCommand::GetState)
        ));
    }

    #[test]
    fn envelope_uses_type_key() {
        let msg = WsMessage::error("abc".to_string(), 400, "bad");
        let json = serde_json::to_value(&msg).unwrap_or_default();
        assert_eq!(json["type"], "error");
        assert_eq!(json["payload"]["code"], 400);
    }
}
