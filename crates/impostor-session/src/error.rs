//! Error types for the session layer.

use impostor_protocol::PlayerId;

/// Errors that can occur while resuming a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The reconnect token is not one the server issued, or its session
    /// has already been cleaned up.
    #[error("invalid reconnection token")]
    InvalidToken,

    /// The grace period elapsed before the player came back.
    #[error("session expired for player {0}")]
    SessionExpired(PlayerId),
}
