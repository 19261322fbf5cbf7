//! Wire format of the per-race spectator channel.
//!
//! Every frame is a JSON object discriminated by its `type` field. Heartbeat
//! pings are answered by the channel itself and never reach subscribers.
use chrono::{DateTime, Utc};
use racetrail_core::{RaceInfo, RaceStatus, SeedInfo, WsParticipant};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const KNOWN_KINDS: [&str; 5] = [
    "race_state",
    "leaderboard_update",
    "player_update",
    "race_status_change",
    "spectator_count",
];

const PING: &str = "ping";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceSnapshot {
    pub race: RaceInfo,
    #[serde(default)]
    pub seed: SeedInfo,
    #[serde(default)]
    pub participants: Vec<WsParticipant>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardUpdate {
    pub participants: Vec<WsParticipant>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerUpdate {
    pub player: WsParticipant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub status: RaceStatus,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpectatorCount {
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    RaceState(RaceSnapshot),
    LeaderboardUpdate(LeaderboardUpdate),
    PlayerUpdate(PlayerUpdate),
    RaceStatusChange(StatusChange),
    SpectatorCount(SpectatorCount),
}

impl ServerMessage {
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::RaceState(_) => "race_state",
            Self::LeaderboardUpdate(_) => "leaderboard_update",
            Self::PlayerUpdate(_) => "player_update",
            Self::RaceStatusChange(_) => "race_status_change",
            Self::SpectatorCount(_) => "spectator_count",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Auth { token: String },
    Pong,
}

impl ClientMessage {
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// A frame the channel should act on.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Ping,
    Message(Box<ServerMessage>),
}

/// Why a frame was dropped.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("malformed frame: {0}")]
    Malformed(#[source] serde_json::Error),
    #[error("frame has no type")]
    MissingType,
    #[error("unknown frame type {0:?}")]
    UnknownType(String),
    #[error("invalid {kind} frame: {source}")]
    Invalid {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}

impl FrameError {
    /// The frame was not JSON at all.
    #[must_use]
    pub const fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed(_))
    }
}

/// Parse one text frame.
///
/// # Errors
///
/// Returns a [`FrameError`] describing why the frame must be dropped.
pub fn classify(text: &str) -> Result<Inbound, FrameError> {
    let value: Value = serde_json::from_str(text).map_err(FrameError::Malformed)?;
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or(FrameError::MissingType)?
        .to_string();
    if kind == PING {
        return Ok(Inbound::Ping);
    }
    if !KNOWN_KINDS.contains(&kind.as_str()) {
        return Err(FrameError::UnknownType(kind));
    }
    serde_json::from_value(value)
        .map(|message| Inbound::Message(Box::new(message)))
        .map_err(|source| FrameError::Invalid { kind, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_known_frames() {
        let frame = r#"{"type": "spectator_count", "count": 12}"#;
        assert_eq!(
            classify(frame).unwrap(),
            Inbound::Message(Box::new(ServerMessage::SpectatorCount(SpectatorCount {
                count: 12
            })))
        );
        assert_eq!(classify(r#"{"type": "ping"}"#).unwrap(), Inbound::Ping);

        let frame = r#"{"type": "race_status_change", "status": "running",
                        "started_at": "2026-03-06T19:00:00Z"}"#;
        let Inbound::Message(message) = classify(frame).unwrap() else {
            panic!("expected a message");
        };
        assert_eq!(message.kind(), "race_status_change");
    }

    #[test]
    fn rejects_unknown_and_broken_frames() {
        assert!(classify("{oops").unwrap_err().is_malformed());
        assert!(matches!(classify("[1, 2]"), Err(FrameError::MissingType)));
        assert!(matches!(
            classify(r#"{"type": "chat", "text": "gg"}"#),
            Err(FrameError::UnknownType(kind)) if kind == "chat"
        ));
        assert!(matches!(
            classify(r#"{"type": "player_update"}"#),
            Err(FrameError::Invalid { .. })
        ));
    }

    #[test]
    fn client_messages_match_wire_shape() {
        let auth = ClientMessage::Auth {
            token: "t0k".into(),
        };
        let value: Value = serde_json::from_str(&auth.to_json().unwrap()).unwrap();
        assert_eq!(value, serde_json::json!({"type": "auth", "token": "t0k"}));
        assert_eq!(ClientMessage::Pong.to_json().unwrap(), r#"{"type":"pong"}"#);
    }
}
