//! Error types for the room layer.

use impostor_game::GameError;
use impostor_protocol::{ErrorKind, PlayerId, RoomCode};

/// Errors that can occur during room operations.
///
/// Every variant is answered to the caller only, through
/// [`RoomError::kind`] and its message.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist.
    #[error("room {0} not found")]
    NotFound(RoomCode),

    /// The player is not a member of this room.
    #[error("player {player} is not in room {room}")]
    NotInRoom { player: PlayerId, room: RoomCode },

    /// The player already belongs to a room.
    #[error("player {player} is already in room {room}")]
    AlreadyInRoom { player: PlayerId, room: RoomCode },

    /// A host-only intent from somebody else.
    #[error("only the host can {action}")]
    Unauthorized { action: &'static str },

    /// Joins are only accepted in the lobby.
    #[error("the game in room {0} has already started")]
    GameInProgress(RoomCode),

    /// The room is full.
    #[error("room {0} is full")]
    RoomFull(RoomCode),

    /// Another member already uses this name (case and spacing ignored).
    #[error("the name \"{0}\" is already taken in this room")]
    DuplicateName(String),

    /// Empty, or longer than the limit once normalized.
    #[error("invalid player name \"{0}\"")]
    InvalidName(String),

    /// Not enough members to deal a round.
    #[error("need at least {needed} players, have {present}")]
    NotEnoughPlayers { needed: usize, present: usize },

    /// The round engine rejected the operation.
    #[error(transparent)]
    Game(#[from] GameError),
}

impl RoomError {
    /// The category reported in the caller's ack.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) | Self::NotInRoom { .. } => ErrorKind::NotFound,
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::InvalidName(_)
            | Self::AlreadyInRoom { .. }
            | Self::GameInProgress(_)
            | Self::RoomFull(_)
            | Self::DuplicateName(_)
            | Self::NotEnoughPlayers { .. }
            | Self::Game(_) => ErrorKind::InvalidState,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use impostor_protocol::Phase;

    #[test]
    fn test_kind_maps_taxonomy() {
        let code = RoomCode::new("ABCDE");
        assert_eq!(RoomError::NotFound(code.clone()).kind(), ErrorKind::NotFound);
        assert_eq!(
            RoomError::Unauthorized { action: "start the game" }.kind(),
            ErrorKind::Unauthorized
        );
        assert_eq!(RoomError::RoomFull(code).kind(), ErrorKind::InvalidState);
        assert_eq!(
            RoomError::from(GameError::WrongPhase {
                action: "vote",
                phase: Phase::Lobby
            })
            .kind(),
            ErrorKind::InvalidState
        );
        assert_eq!(
            RoomError::from(GameError::ImpostorCountOutOfRange { requested: 5, players: 4 }).kind(),
            ErrorKind::InvalidState
        );
        assert_eq!(
            RoomError::InvalidName("   ".to_string()).kind(),
            ErrorKind::InvalidState
        );
    }

    #[test]
    fn test_game_error_message_is_transparent() {
        let err = RoomError::from(GameError::VotingOpen);
        assert_eq!(err.to_string(), "voting is still open");
    }
}
