//! Chat wire protocol.
//!
//! JSON frames exchanged over the room WebSocket. Inbound frames carry the
//! sender's display name and team alongside the message; outbound frames
//! echo only the message and display name to every room member.

use serde::{Deserialize, Serialize};

/// Inbound chat frame, sent by a client over the room WebSocket.
///
/// All four fields are required; frames missing any of them fail to parse
/// and are dropped by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatFrame {
    /// Message body.
    pub message: String,
    /// Display name as the client wants it shown.
    pub username: String,
    /// Room name the client claims the message belongs to.
    pub room: String,
    /// Team name used to attribute the persisted message.
    pub team: String,
}

/// Outbound chat frame, fanned out to every member of the room group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatBroadcast {
    pub message: String,
    pub username: String,
}

impl ChatBroadcast {
    /// Build the outbound frame for an accepted inbound frame.
    pub fn from_frame(frame: &ChatFrame) -> Self {
        Self {
            message: frame.message.clone(),
            username: frame.username.clone(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parse_inbound_frame() {
        let frame: ChatFrame = serde_json::from_str(
            r#"{"message":"hi","username":"alice","room":"alice_puzzle1","team":"teamA"}"#,
        )
        .unwrap();

        assert_eq!(frame.message, "hi");
        assert_eq!(frame.username, "alice");
        assert_eq!(frame.room, "alice_puzzle1");
        assert_eq!(frame.team, "teamA");
    }

    #[test]
    fn inbound_frame_requires_all_fields() {
        let missing_team = r#"{"message":"hi","username":"alice","room":"alice_puzzle1"}"#;
        assert!(serde_json::from_str::<ChatFrame>(missing_team).is_err());
    }

    #[test]
    fn broadcast_carries_only_message_and_username() {
        let frame: ChatFrame = serde_json::from_str(
            r#"{"message":"hi","username":"alice","room":"alice_puzzle1","team":"teamA"}"#,
        )
        .unwrap();

        let out = serde_json::to_value(ChatBroadcast::from_frame(&frame)).unwrap();
        assert_eq!(
            out,
            serde_json::json!({"message": "hi", "username": "alice"})
        );
    }
}
