//! The session manager: issues player identities and tracks which
//! connection speaks for which player.
//!
//! # Concurrency note
//!
//! `SessionManager` is a plain struct over `HashMap`s. It is owned by the
//! engine task and never shared, so no locking happens here.

use std::collections::HashMap;
use std::time::Duration;
use std::time::Instant;

use impostor_protocol::PlayerId;
use impostor_transport::ConnectionId;
use rand::Rng;

use crate::{Session, SessionConfig, SessionError, SessionState};

/// Manages all player sessions.
///
/// ## Lifecycle
///
/// ```text
/// open() ──→ [Connected] ──disconnect()──→ [Disconnected] ──expire_stale()──→ [Expired]
///                 ↑                              │                              │
///                 └────────── resume() ──────────┘                     cleanup_expired()
/// ```
pub struct SessionManager {
    /// All sessions, keyed by player.
    sessions: HashMap<PlayerId, Session>,

    /// Reconnect token → player. Kept in sync with `sessions`.
    tokens: HashMap<String, PlayerId>,

    /// Live connection → player. Only `Connected` sessions appear here.
    connections: HashMap<ConnectionId, PlayerId>,

    next_player: u64,

    config: SessionConfig,
}

impl SessionManager {
    /// Creates a new, empty session manager with the given config.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            sessions: HashMap::new(),
            tokens: HashMap::new(),
            connections: HashMap::new(),
            next_player: 1,
            config,
        }
    }

    /// The configuration this manager was built with.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Issues a brand-new player identity bound to `connection`.
    pub fn open(&mut self, connection: ConnectionId) -> &Session {
        let player_id = PlayerId(self.next_player);
        self.next_player += 1;

        let token = generate_token();
        self.tokens.insert(token.clone(), player_id);
        self.connections.insert(connection, player_id);

        tracing::info!(%player_id, %connection, "session opened");

        self.sessions.entry(player_id).or_insert(Session {
            player_id,
            state: SessionState::Connected { connection },
            reconnect_token: token,
        })
    }

    /// Rebinds an existing player identity to `connection`.
    ///
    /// A still-connected session is taken over: the new socket wins and the
    /// replaced connection is returned so the caller can close it.
    ///
    /// # Errors
    /// - [`SessionError::InvalidToken`] — token not recognized
    /// - [`SessionError::SessionExpired`] — grace period elapsed
    pub fn resume(
        &mut self,
        connection: ConnectionId,
        token: &str,
    ) -> Result<(&Session, Option<ConnectionId>), SessionError> {
        let player_id = self
            .tokens
            .get(token)
            .copied()
            .ok_or(SessionError::InvalidToken)?;
        let grace = Duration::from_secs(self.config.reconnect_grace_secs);

        let session = self
            .sessions
            .get_mut(&player_id)
            .ok_or(SessionError::InvalidToken)?;

        let replaced = match session.state {
            SessionState::Connected { connection: old } => Some(old),
            SessionState::Disconnected { since } => {
                if since.elapsed() > grace {
                    session.state = SessionState::Expired;
                    return Err(SessionError::SessionExpired(player_id));
                }
                None
            }
            SessionState::Expired => return Err(SessionError::SessionExpired(player_id)),
        };

        session.state = SessionState::Connected { connection };
        if let Some(old) = replaced {
            self.connections.remove(&old);
        }
        self.connections.insert(connection, player_id);

        tracing::info!(%player_id, %connection, replaced = replaced.is_some(), "session resumed");
        Ok((&*session, replaced))
    }

    /// Records that `connection` closed.
    ///
    /// Returns the player it was speaking for, or `None` if the connection
    /// was unknown or had already been replaced by a newer one.
    pub fn disconnect(&mut self, connection: ConnectionId) -> Option<PlayerId> {
        let player_id = self.connections.remove(&connection)?;
        let session = self.sessions.get_mut(&player_id)?;

        if session.connection() != Some(connection) {
            return None;
        }
        session.state = SessionState::Disconnected {
            since: Instant::now(),
        };

        tracing::info!(%player_id, %connection, "player disconnected, grace period started");
        Some(player_id)
    }

    /// Forgets a player entirely, invalidating their token.
    pub fn remove(&mut self, player_id: PlayerId) -> Option<Session> {
        let session = self.sessions.remove(&player_id)?;
        self.tokens.remove(&session.reconnect_token);
        if let Some(connection) = session.connection() {
            self.connections.remove(&connection);
        }
        Some(session)
    }

    /// Expires every disconnected session whose grace period has elapsed.
    ///
    /// Returns the expired players so the caller can remove them from
    /// their rooms before [`cleanup_expired`](Self::cleanup_expired).
    pub fn expire_stale(&mut self) -> Vec<PlayerId> {
        let grace = Duration::from_secs(self.config.reconnect_grace_secs);
        let mut expired = Vec::new();

        for session in self.sessions.values_mut() {
            if let SessionState::Disconnected { since } = session.state {
                if since.elapsed() > grace {
                    session.state = SessionState::Expired;
                    expired.push(session.player_id);
                    tracing::info!(
                        player_id = %session.player_id,
                        "session expired (grace period elapsed)"
                    );
                }
            }
        }

        expired.sort();
        expired
    }

    /// Removes all expired sessions.
    pub fn cleanup_expired(&mut self) {
        let tokens = &mut self.tokens;
        self.sessions.retain(|_, session| {
            if matches!(session.state, SessionState::Expired) {
                tokens.remove(&session.reconnect_token);
                false
            } else {
                true
            }
        });
    }

    /// The player a live connection speaks for.
    pub fn player_for(&self, connection: ConnectionId) -> Option<PlayerId> {
        self.connections.get(&connection).copied()
    }

    /// The live connection of a player, if they are connected.
    pub fn connection_of(&self, player_id: PlayerId) -> Option<ConnectionId> {
        self.sessions.get(&player_id).and_then(Session::connection)
    }

    /// Looks up a session by player ID.
    pub fn get(&self, player_id: &PlayerId) -> Option<&Session> {
        self.sessions.get(player_id)
    }

    /// Returns the number of sessions (any state).
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns `true` if there are no sessions.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Generates a random 32-character hex string (128 bits of entropy).
fn generate_token() -> String {
    let bytes: [u8; 16] = rand::rng().random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

// =========================================================================
// Tests
// =========================================================================
