//! Client intents and the acknowledgement the server sends back.

use serde::{Deserialize, Serialize};

use crate::{Ballot, GameSettings, Phase, RoomCode};

// ---------------------------------------------------------------------------
// Intent
// ---------------------------------------------------------------------------

/// Something a player asks the server to do.
///
/// Internally tagged with kebab-case names, so the client sends
/// `{ "type": "cast-vote", "room_code": "ABCDE", "ballot": { "suspect": 4 } }`.
/// Everything except `create-room` names the room it targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Intent {
    CreateRoom {
        name: String,
    },
    JoinRoom {
        room_code: RoomCode,
        name: String,
    },
    LeaveRoom {
        room_code: RoomCode,
    },
    StartGame {
        room_code: RoomCode,
        #[serde(default)]
        settings: GameSettings,
    },
    RevealWord {
        room_code: RoomCode,
    },
    NextPhase {
        room_code: RoomCode,
        phase: Phase,
    },
    RerollGame {
        room_code: RoomCode,
    },
    CastVote {
        room_code: RoomCode,
        ballot: Ballot,
    },
    ConfirmElimination {
        room_code: RoomCode,
    },
    ToggleReady {
        room_code: RoomCode,
    },
    RejoinRoom {
        room_code: RoomCode,
    },
}

impl Intent {
    /// The room this intent targets. `None` only for `create-room`.
    pub fn room_code(&self) -> Option<&RoomCode> {
        match self {
            Self::CreateRoom { .. } => None,
            Self::JoinRoom { room_code, .. }
            | Self::LeaveRoom { room_code }
            | Self::StartGame { room_code, .. }
            | Self::RevealWord { room_code }
            | Self::NextPhase { room_code, .. }
            | Self::RerollGame { room_code }
            | Self::CastVote { room_code, .. }
            | Self::ConfirmElimination { room_code }
            | Self::ToggleReady { room_code }
            | Self::RejoinRoom { room_code } => Some(room_code),
        }
    }

    /// The wire name, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CreateRoom { .. } => "create-room",
            Self::JoinRoom { .. } => "join-room",
            Self::LeaveRoom { .. } => "leave-room",
            Self::StartGame { .. } => "start-game",
            Self::RevealWord { .. } => "reveal-word",
            Self::NextPhase { .. } => "next-phase",
            Self::RerollGame { .. } => "reroll-game",
            Self::CastVote { .. } => "cast-vote",
            Self::ConfirmElimination { .. } => "confirm-elimination",
            Self::ToggleReady { .. } => "toggle-ready",
            Self::RejoinRoom { .. } => "rejoin-room",
        }
    }
}

/// An intent plus an optional correlation id.
///
/// When `request_id` is present the server answers with an [`Ack`]
/// carrying the same id; without it the intent is fire-and-forget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentRequest {
    #[serde(default)]
    pub request_id: Option<u64>,
    pub intent: Intent,
}

// ---------------------------------------------------------------------------
// Ack
// ---------------------------------------------------------------------------

/// Category of a rejected intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The room (or the player's seat in it) does not exist.
    NotFound,
    /// A host-only intent from someone who is not the host.
    Unauthorized,
    /// The intent does not fit the room's current state, or carries
    /// values the room cannot accept (bad name, bad settings).
    InvalidState,
}

/// Structured reason attached to a failed [`Ack`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AckError {
    pub kind: ErrorKind,
    pub message: String,
}

/// The server's answer to an [`IntentRequest`] with a request id.
///
/// Sent only to the caller, never broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub request_id: u64,
    pub ok: bool,
    /// The room the caller is now in, set by create/join/rejoin.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_code: Option<RoomCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<AckError>,
}

impl Ack {
    /// A successful acknowledgement.
    pub fn success(request_id: u64, room_code: Option<RoomCode>) -> Self {
        Self {
            request_id,
            ok: true,
            room_code,
            error: None,
        }
    }

    /// A failed acknowledgement.
    pub fn failure(request_id: u64, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            request_id,
            ok: false,
            room_code: None,
            error: Some(AckError {
                kind,
                message: message.into(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PlayerId;

    #[test]
    fn test_intent_cast_vote_json_format() {
        let intent = Intent::CastVote {
            room_code: RoomCode::new("ABCDE"),
            ballot: Ballot::Suspect(PlayerId(4)),
        };
        let json = serde_json::to_value(&intent).unwrap();

        assert_eq!(json["type"], "cast-vote");
        assert_eq!(json["room_code"], "ABCDE");
        assert_eq!(json["ballot"]["suspect"], 4);
    }

    #[test]
    fn test_intent_start_game_without_settings_uses_defaults() {
        let intent: Intent =
            serde_json::from_str(r#"{"type":"start-game","room_code":"abcde"}"#).unwrap();

        match intent {
            Intent::StartGame { room_code, settings } => {
                // RoomCode is transparent on the wire; normalization
                // happens when the engine looks the room up.
                assert_eq!(room_code.as_str(), "abcde");
                assert_eq!(settings, GameSettings::default());
            }
            other => panic!("unexpected intent {other:?}"),
        }
    }

    #[test]
    fn test_intent_room_code_none_only_for_create_room() {
        let create = Intent::CreateRoom { name: "Ana".into() };
        assert!(create.room_code().is_none());

        let leave = Intent::LeaveRoom {
            room_code: RoomCode::new("QWERT"),
        };
        assert_eq!(leave.room_code().map(RoomCode::as_str), Some("QWERT"));
        assert_eq!(leave.kind(), "leave-room");
    }

    #[test]
    fn test_intent_request_without_request_id() {
        let req: IntentRequest = serde_json::from_str(
            r#"{"intent":{"type":"reveal-word","room_code":"ABCDE"}}"#,
        )
        .unwrap();
        assert_eq!(req.request_id, None);
    }

    #[test]
    fn test_ack_success_omits_error_field() {
        let ack = Ack::success(7, Some(RoomCode::new("ZZZZZ")));
        let json = serde_json::to_value(&ack).unwrap();

        assert_eq!(json["ok"], true);
        assert_eq!(json["room_code"], "ZZZZZ");
        assert!(json.get("error").is_none());
    }
}
