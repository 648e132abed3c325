//! Core wire types: identities, connection-level system messages, and the
//! envelope every frame travels in.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Ack, IntentRequest, ServerEvent};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// The canonical identity of a player.
///
/// Allocated by the server on first connect and stable for as long as the
/// player keeps their session (reconnects included). Every room, round,
/// and vote refers to players by this id, never by connection.
///
/// `#[serde(transparent)]` puts it on the wire as a plain number.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// The short human-shareable code identifying a room, e.g. `"K3Q9Z"`.
///
/// Codes are uppercase ASCII alphanumerics. [`RoomCode::new`] normalizes
/// whatever a player typed (surrounding spaces, lowercase) so lookups are
/// forgiving.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    /// Builds a code from user input, trimming and uppercasing it.
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_ascii_uppercase())
    }

    /// The code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// SystemMessage — connection plumbing
// ---------------------------------------------------------------------------

/// Connection-level messages: handshake, keep-alive, close, and errors
/// that are not tied to a specific intent.
///
/// Internally tagged, so a heartbeat looks like
/// `{ "type": "Heartbeat", "client_time": 123 }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SystemMessage {
    // -- Connection lifecycle --
    /// Client → Server, must be the first frame.
    ///
    /// `reconnect_token` is present when the client is resuming a previous
    /// session (it got the token in an earlier `Welcome`).
    Hello {
        version: u32,
        #[serde(default)]
        reconnect_token: Option<String>,
    },

    /// Server → Client: the handshake succeeded.
    Welcome {
        player_id: PlayerId,
        reconnect_token: String,
        server_time: u64,
    },

    /// Either direction: "I'm closing this connection."
    Disconnect { reason: String },

    // -- Heartbeat --
    /// Client → Server keep-alive.
    Heartbeat { client_time: u64 },

    /// Server → Client, echoes `client_time` for RTT measurement.
    HeartbeatAck { client_time: u64, server_time: u64 },

    // -- Errors --
    /// Server → Client: a connection-level failure.
    /// `code` follows HTTP conventions (400 bad request, 401 unknown token).
    Error { code: u16, message: String },
}

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

/// What an envelope carries.
///
/// Adjacently tagged: `{ "type": "Event", "data": { ... } }`. The outer tag
/// lets the connection handler route a frame without looking inside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Payload {
    /// Handshake, heartbeat, disconnect, connection errors.
    System(SystemMessage),

    /// Client → Server: a game intent.
    Intent(IntentRequest),

    /// Server → Client: the answer to an intent that carried a request id.
    Ack(Ack),

    /// Server → Client: a pushed room or game event.
    Event(ServerEvent),
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// The top-level frame. Every message on the wire is an `Envelope`.
///
/// ```text
/// ┌──────────────────────────────────┐
/// │ seq: 42                          │  ← per-sender counter
/// │ timestamp: 15000                 │  ← ms since server start
/// │ ┌──────────────────────────────┐ │
/// │ │ payload: Event(GameUpdate …) │ │
/// │ └──────────────────────────────┘ │
/// └──────────────────────────────────┘
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Auto-incrementing sequence number. Each side keeps its own counter.
    pub seq: u64,

    /// Milliseconds since the server started.
    pub timestamp: u64,

    /// The actual message content.
    pub payload: Payload,
}

// =========================================================================
// Tests
// =========================================================================
