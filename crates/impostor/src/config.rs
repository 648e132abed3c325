//! Server configuration, read from `IMPOSTOR_*` environment variables.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use impostor_room::RoomConfig;
use impostor_session::SessionConfig;
use serde::{Deserialize, Serialize};

/// Everything the `impostor-server` binary can be told at startup.
///
/// | Variable | Default |
/// |---|---|
/// | `IMPOSTOR_BIND` | `0.0.0.0:8080` |
/// | `IMPOSTOR_WORDS` | built-in bank |
/// | `IMPOSTOR_RECONNECT_GRACE_SECS` | `0` |
/// | `IMPOSTOR_IDLE_TIMEOUT_SECS` | `30` |
/// | `IMPOSTOR_MIN_PLAYERS` | `3` |
/// | `IMPOSTOR_MAX_PLAYERS` | `12` |
/// | `IMPOSTOR_SEED` | OS entropy |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind: String,
    /// JSON word bank to load instead of the built-in one.
    pub words: Option<PathBuf>,
    pub reconnect_grace_secs: u64,
    /// Connections silent for this long are closed.
    pub idle_timeout_secs: u64,
    pub min_players: usize,
    pub max_players: usize,
    /// Fixed RNG seed, for reproducible sessions.
    pub seed: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let rooms = RoomConfig::default();
        Self {
            bind: "0.0.0.0:8080".to_string(),
            words: None,
            reconnect_grace_secs: 0,
            idle_timeout_secs: 30,
            min_players: rooms.min_players,
            max_players: rooms.max_players,
            seed: None,
        }
    }
}

impl ServerConfig {
    /// Loads config from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads config through `lookup`. Unset or unparsable values fall back
    /// to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let config = Self {
            bind: lookup("IMPOSTOR_BIND").unwrap_or(defaults.bind),
            words: lookup("IMPOSTOR_WORDS")
                .filter(|path| !path.is_empty())
                .map(PathBuf::from),
            reconnect_grace_secs: parse(&lookup, "IMPOSTOR_RECONNECT_GRACE_SECS")
                .unwrap_or(defaults.reconnect_grace_secs),
            idle_timeout_secs: parse(&lookup, "IMPOSTOR_IDLE_TIMEOUT_SECS")
                .unwrap_or(defaults.idle_timeout_secs),
            min_players: parse(&lookup, "IMPOSTOR_MIN_PLAYERS").unwrap_or(defaults.min_players),
            max_players: parse(&lookup, "IMPOSTOR_MAX_PLAYERS").unwrap_or(defaults.max_players),
            seed: parse(&lookup, "IMPOSTOR_SEED"),
        };

        tracing::info!(
            bind = %config.bind,
            words = ?config.words,
            reconnect_grace_secs = config.reconnect_grace_secs,
            idle_timeout_secs = config.idle_timeout_secs,
            min_players = config.min_players,
            max_players = config.max_players,
            seeded = config.seed.is_some(),
            "server config loaded"
        );
        config
    }

    /// Room limits, clamped to a playable range.
    pub fn room_config(&self) -> RoomConfig {
        RoomConfig {
            min_players: self.min_players,
            max_players: self.max_players,
            ..RoomConfig::default()
        }
        .clamped()
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            reconnect_grace_secs: self.reconnect_grace_secs,
        }
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

fn parse<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparsable setting");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_from_lookup_empty_env_uses_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[]));
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.session_config().reconnect_grace_secs, 0);
        assert_eq!(config.room_config().min_players, 3);
    }

    #[test]
    fn test_from_lookup_reads_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("IMPOSTOR_BIND", "127.0.0.1:9000"),
            ("IMPOSTOR_WORDS", "/srv/words.json"),
            ("IMPOSTOR_RECONNECT_GRACE_SECS", "30"),
            ("IMPOSTOR_MAX_PLAYERS", "8"),
            ("IMPOSTOR_SEED", "7"),
        ]));

        assert_eq!(config.bind, "127.0.0.1:9000");
        assert_eq!(config.words, Some(PathBuf::from("/srv/words.json")));
        assert_eq!(config.reconnect_grace_secs, 30);
        assert_eq!(config.room_config().max_players, 8);
        assert_eq!(config.seed, Some(7));
    }

    #[test]
    fn test_from_lookup_bad_number_falls_back() {
        let config = ServerConfig::from_lookup(lookup(&[("IMPOSTOR_IDLE_TIMEOUT_SECS", "soon")]));
        assert_eq!(config.idle_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_room_config_zero_minimum_clamps_to_one() {
        let config = ServerConfig::from_lookup(lookup(&[("IMPOSTOR_MIN_PLAYERS", "0")]));
        assert_eq!(config.room_config().min_players, 1);
    }

    #[test]
    fn test_room_config_maximum_below_minimum_is_raised() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("IMPOSTOR_MIN_PLAYERS", "5"),
            ("IMPOSTOR_MAX_PLAYERS", "2"),
        ]));
        let rooms = config.room_config();
        assert_eq!(rooms.min_players, 5);
        assert_eq!(rooms.max_players, 5);
    }

    #[test]
    fn test_room_config_maximum_capped_at_palette_size() {
        let config = ServerConfig::from_lookup(lookup(&[("IMPOSTOR_MAX_PLAYERS", "50")]));
        assert_eq!(config.room_config().max_players, impostor_room::MAX_ROOM_SIZE);
    }
}
