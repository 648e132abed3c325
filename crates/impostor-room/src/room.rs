//! The room record: members, host, settings, and the room's game.

use impostor_game::GameSession;
use impostor_protocol::{
    GameSettings, MemberSummary, Phase, PlayerId, RoomCode, RoomSnapshot, ServerEvent,
};
use rand::Rng;

use crate::{Outbox, RoomError};

/// Longest accepted display name, in characters.
pub const MAX_NAME_CHARS: usize = 24;

const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// A room member, in join order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub id: PlayerId,
    pub name: String,
}

/// One room.
///
/// Members keep their join order for the room's whole life. The host is
/// always one of the members.
#[derive(Debug)]
pub struct Room {
    code: RoomCode,
    pub(crate) members: Vec<Member>,
    pub(crate) host: PlayerId,
    pub(crate) settings: GameSettings,
    pub(crate) game: GameSession,
    max_players: usize,
}

impl Room {
    pub(crate) fn new(code: RoomCode, creator: Member, max_players: usize) -> Self {
        Self {
            code,
            host: creator.id,
            members: vec![creator],
            settings: GameSettings::default(),
            game: GameSession::new(),
            max_players,
        }
    }

    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    pub fn host(&self) -> PlayerId {
        self.host
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn member(&self, id: PlayerId) -> Option<&Member> {
        self.members.iter().find(|m| m.id == id)
    }

    pub fn is_member(&self, id: PlayerId) -> bool {
        self.member(id).is_some()
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    pub fn game(&self) -> &GameSession {
        &self.game
    }

    pub fn phase(&self) -> Phase {
        self.game.phase()
    }

    pub fn is_full(&self) -> bool {
        self.members.len() >= self.max_players
    }

    pub fn member_ids(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.members.iter().map(|m| m.id)
    }

    /// `true` if `name` matches an existing member's name, ignoring case.
    /// `name` must already be normalized.
    pub fn name_taken(&self, name: &str) -> bool {
        let key = name.to_lowercase();
        self.members.iter().any(|m| m.name.to_lowercase() == key)
    }

    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            code: self.code.clone(),
            host: self.host,
            phase: self.phase(),
            members: self
                .members
                .iter()
                .map(|m| MemberSummary {
                    id: m.id,
                    name: m.name.clone(),
                    is_host: m.id == self.host,
                })
                .collect(),
            settings: self.settings.clone(),
            max_players: self.max_players,
        }
    }

    /// `(id, name)` pairs in join order, as the round engine wants them.
    pub(crate) fn seats(&self) -> Vec<(PlayerId, String)> {
        self.members
            .iter()
            .map(|m| (m.id, m.name.clone()))
            .collect()
    }

    pub(crate) fn require_host(&self, player: PlayerId, action: &'static str) -> Result<(), RoomError> {
        if self.host == player {
            Ok(())
        } else {
            Err(RoomError::Unauthorized { action })
        }
    }

    /// Pushes the room snapshot to everyone, then each member's own view
    /// while a game is on.
    pub(crate) fn publish(&self, outbox: &mut Outbox) {
        let update = ServerEvent::RoomUpdated {
            room: self.snapshot(),
        };
        outbox.broadcast(self.member_ids(), &update);

        if self.phase() != Phase::Lobby {
            for id in self.member_ids() {
                self.push_view(id, outbox);
            }
        }
    }

    /// Pushes the current state to one member only.
    pub(crate) fn push_state_to(&self, player: PlayerId, outbox: &mut Outbox) {
        outbox.send(
            player,
            ServerEvent::RoomUpdated {
                room: self.snapshot(),
            },
        );
        if self.phase() != Phase::Lobby {
            self.push_view(player, outbox);
        }
    }

    fn push_view(&self, player: PlayerId, outbox: &mut Outbox) {
        if let Some(view) = self.game.view_for(player, &self.code, self.host) {
            outbox.send(player, ServerEvent::GameUpdate { view });
        }
    }
}

/// Trims a display name and collapses inner whitespace.
pub fn normalize_name(raw: &str) -> Result<String, RoomError> {
    let name = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let chars = name.chars().count();
    if chars == 0 || chars > MAX_NAME_CHARS {
        return Err(RoomError::InvalidName(raw.trim().to_string()));
    }
    Ok(name)
}

/// A random code of `len` characters from `A–Z0–9`.
pub fn generate_code<R: Rng + ?Sized>(len: usize, rng: &mut R) -> RoomCode {
    let code: String = (0..len)
        .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
        .collect();
    RoomCode::new(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn room() -> Room {
        Room::new(
            RoomCode::new("ABCDE"),
            Member {
                id: PlayerId(1),
                name: "Ana".into(),
            },
            3,
        )
    }

    #[test]
    fn test_normalize_name_collapses_whitespace() {
        assert_eq!(normalize_name("  Ana   Maria ").unwrap(), "Ana Maria");
    }

    #[test]
    fn test_normalize_name_rejects_blank_and_too_long() {
        assert!(matches!(normalize_name("   "), Err(RoomError::InvalidName(_))));
        let long = "x".repeat(MAX_NAME_CHARS + 1);
        assert!(matches!(normalize_name(&long), Err(RoomError::InvalidName(_))));
        assert!(normalize_name(&"é".repeat(MAX_NAME_CHARS)).is_ok());
    }

    #[test]
    fn test_name_taken_ignores_case() {
        let room = room();
        assert!(room.name_taken("ana"));
        assert!(room.name_taken("ANA"));
        assert!(!room.name_taken("Bea"));
    }

    #[test]
    fn test_generate_code_uses_alphabet_and_length() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..50 {
            let code = generate_code(5, &mut rng);
            assert_eq!(code.as_str().len(), 5);
            assert!(code.as_str().bytes().all(|b| CODE_ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn test_snapshot_marks_host_and_keeps_join_order() {
        let mut room = room();
        room.members.push(Member {
            id: PlayerId(2),
            name: "Bea".into(),
        });

        let snapshot = room.snapshot();

        assert_eq!(snapshot.phase, Phase::Lobby);
        assert_eq!(snapshot.members[0].name, "Ana");
        assert!(snapshot.members[0].is_host);
        assert!(!snapshot.members[1].is_host);
    }

    #[test]
    fn test_publish_in_lobby_sends_only_room_updates() {
        let room = room();
        let mut outbox = Outbox::new();

        room.publish(&mut outbox);

        assert_eq!(outbox.len(), 1);
        assert!(matches!(
            outbox.events_for(PlayerId(1)).next(),
            Some(ServerEvent::RoomUpdated { .. })
        ));
    }

    #[test]
    fn test_require_host_rejects_others() {
        let room = room();
        assert!(room.require_host(PlayerId(1), "start the game").is_ok());
        assert!(matches!(
            room.require_host(PlayerId(2), "start the game"),
            Err(RoomError::Unauthorized { .. })
        ));
    }
}
