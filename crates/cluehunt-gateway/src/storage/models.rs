//! Data models for Cluehunt gateway storage.

use serde::{Deserialize, Serialize};

/// A registered hunt team. Chat messages are attributed to teams, and each
/// team owns exactly one [`HuntInfo`] row.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Team {
    pub id: String,
    pub name: String,
    pub created_at: i64,
}

/// A persisted chat message.
///
/// `name` is the display name exactly as the client supplied it; it is not
/// required to match the authenticated principal.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ChatMessage {
    pub id: i64,
    pub name: String,
    pub team_id: String,
    pub room: String,
    pub content: String,
    pub created_at: i64,
}

/// Per-team hunt progress record controlling hint timing.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct HuntInfo {
    pub team_id: String,
    pub level: i64,
    pub hints_shown: i64,
    pub hint_requested: i64,
    pub next_hint_release: Option<i64>,
}

impl HuntInfo {
    /// Whether a hint timer is armed for this team.
    pub const fn is_armed(&self) -> bool {
        self.hint_requested != 0 && self.next_hint_release.is_some()
    }
}

/// Append-only audit record of a game-progression event.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct HuntEvent {
    pub id: i64,
    pub time: i64,
    pub team_id: String,
    pub event_type: String,
    pub level: i64,
}

/// Kinds of [`HuntEvent`] the gateway writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HuntEventType {
    /// A team asked for a hint and the release timer was armed.
    HintRequested,
    /// An armed hint timer fired and the hint was released.
    HintReleased,
}

impl HuntEventType {
    /// Database representation of the event type.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HintRequested => "HINT_REQ",
            Self::HintReleased => "HINT_REL",
        }
    }
}
