//! Room configuration.

use impostor_game::COLORS;
use serde::{Deserialize, Serialize};

/// Largest room the identity palette can color without repeats.
pub const MAX_ROOM_SIZE: usize = COLORS.len();

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Limits shared by every room in a registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Minimum members to start a round. A room that drops below this is
    /// torn down.
    pub min_players: usize,

    /// Maximum members a room accepts.
    pub max_players: usize,

    /// Length of generated room codes.
    pub code_length: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            min_players: 3,
            max_players: 12,
            code_length: 5,
        }
    }
}

impl RoomConfig {
    /// Pulls the player limits into a usable range: at least one member,
    /// at most [`MAX_ROOM_SIZE`], and `max_players >= min_players`.
    pub fn clamped(self) -> Self {
        let min_players = self.min_players.clamp(1, MAX_ROOM_SIZE);
        let max_players = self.max_players.clamp(min_players, MAX_ROOM_SIZE);
        if min_players != self.min_players || max_players != self.max_players {
            tracing::warn!(
                min_players = self.min_players,
                max_players = self.max_players,
                clamped_min = min_players,
                clamped_max = max_players,
                "room player limits out of range, clamping"
            );
        }
        Self {
            min_players,
            max_players,
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_config_default() {
        let config = RoomConfig::default();
        assert_eq!(config.min_players, 3);
        assert_eq!(config.max_players, 12);
        assert_eq!(config.code_length, 5);
    }

    #[test]
    fn test_clamped_default_is_unchanged() {
        let config = RoomConfig::default().clamped();
        assert_eq!(config.min_players, 3);
        assert_eq!(config.max_players, 12);
    }

    #[test]
    fn test_clamped_zero_minimum_becomes_one() {
        let config = RoomConfig {
            min_players: 0,
            ..RoomConfig::default()
        }
        .clamped();
        assert_eq!(config.min_players, 1);
        assert_eq!(config.max_players, 12);
    }

    #[test]
    fn test_clamped_maximum_below_minimum_is_raised() {
        let config = RoomConfig {
            min_players: 6,
            max_players: 4,
            code_length: 5,
        }
        .clamped();
        assert_eq!(config.min_players, 6);
        assert_eq!(config.max_players, 6);
    }

    #[test]
    fn test_clamped_maximum_capped_at_palette_size() {
        let config = RoomConfig {
            max_players: 50,
            ..RoomConfig::default()
        }
        .clamped();
        assert_eq!(config.max_players, COLORS.len());
        assert_eq!(MAX_ROOM_SIZE, 20);
    }
}
