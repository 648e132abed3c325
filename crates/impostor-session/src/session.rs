//! Session types: the server's record of a player's connection.

use std::time::Instant;

use impostor_protocol::PlayerId;
use impostor_transport::ConnectionId;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Configuration for session behavior.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    /// How long (in seconds) a dropped player keeps their seat before
    /// they are treated as having left.
    ///
    /// Default: 0, which disables reconnection: a dropped connection
    /// leaves its room immediately.
    pub reconnect_grace_secs: u64,
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// The lifecycle of a session.
///
/// ```text
///   Connected ──(disconnect)──→ Disconnected ──(grace elapsed)──→ Expired
///       ↑                            │
///       └────────(resume)────────────┘
/// ```
///
/// A `Connected` session records which socket currently speaks for the
/// player, so a late close from an already-replaced socket is ignored.
#[derive(Debug, Clone)]
pub enum SessionState {
    /// Bound to a live connection.
    Connected { connection: ConnectionId },

    /// Lost its connection at `since`.
    Disconnected { since: Instant },

    /// Grace period elapsed; awaiting cleanup.
    Expired,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A single player's session.
#[derive(Debug, Clone)]
pub struct Session {
    /// The canonical player identity.
    pub player_id: PlayerId,

    /// Current lifecycle state.
    pub state: SessionState,

    /// Secret the client presents in `Hello` to resume this session.
    /// 32 hex characters (128 bits of randomness).
    pub reconnect_token: String,
}

impl Session {
    /// The connection currently bound to this session, if any.
    pub fn connection(&self) -> Option<ConnectionId> {
        match self.state {
            SessionState::Connected { connection } => Some(connection),
            _ => None,
        }
    }
}
