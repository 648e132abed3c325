//! Unified error type for the impostor server.

use impostor_game::GameError;
use impostor_protocol::ProtocolError;
use impostor_room::RoomError;
use impostor_session::SessionError;
use impostor_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum ImpostorError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, bad handshake).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (unknown or expired reconnect token).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A room-level error.
    #[error(transparent)]
    Room(#[from] RoomError),

    /// A game-level error, e.g. a word bank that failed to load.
    #[error(transparent)]
    Game(#[from] GameError),

    /// The engine task has stopped.
    #[error("engine is not running")]
    EngineStopped,
}
