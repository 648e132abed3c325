//! Room registry: creates and tears down rooms, enforces host authority,
//! and routes every intent to the right [`GameSession`](impostor_game::GameSession).

use std::collections::HashMap;
use std::sync::Arc;

use impostor_game::{CastOutcome, WordBank};
use impostor_protocol::{
    Ballot, ExitReason, GameSettings, Intent, Phase, PlayerId, RoomCode, ServerEvent,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;

use crate::room::{Member, generate_code, normalize_name};
use crate::{Outbox, Room, RoomConfig, RoomError};

/// `ForceLobby` reason when a room drops below the minimum.
pub const REASON_NOT_ENOUGH_PLAYERS: &str = "not-enough-players";

/// `ForceLobby` reason on engine shutdown.
pub const REASON_SHUTDOWN: &str = "server-shutdown";

/// Owns every active room and tracks which player is in which room.
///
/// All methods run to completion synchronously; the caller serializes
/// access (the server's engine task is the only owner). Events are
/// appended to the caller's [`Outbox`].
pub struct RoomRegistry {
    /// Active rooms, keyed by code.
    rooms: HashMap<RoomCode, Room>,

    /// A player is in at most one room at a time.
    player_rooms: HashMap<PlayerId, RoomCode>,

    config: RoomConfig,
    words: Arc<WordBank>,
    rng: StdRng,
}

impl RoomRegistry {
    /// Creates an empty registry seeded from the OS.
    pub fn new(config: RoomConfig, words: Arc<WordBank>) -> Self {
        Self::with_rng(config, words, StdRng::from_os_rng())
    }

    /// Creates an empty registry with a fixed random source. Player limits
    /// are clamped (see [`RoomConfig::clamped`]).
    pub fn with_rng(config: RoomConfig, words: Arc<WordBank>, rng: StdRng) -> Self {
        Self {
            rooms: HashMap::new(),
            player_rooms: HashMap::new(),
            config: config.clamped(),
            words,
            rng,
        }
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    pub fn room(&self, code: &RoomCode) -> Option<&Room> {
        self.rooms.get(code)
    }

    /// The room a player is currently in, if any.
    pub fn room_of(&self, player: PlayerId) -> Option<&RoomCode> {
        self.player_rooms.get(&player)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    // -----------------------------------------------------------------------
    // Intent routing
    // -----------------------------------------------------------------------

    /// Applies one intent from `player`.
    ///
    /// On success returns the room the caller is now in when the intent
    /// placed them in one (create, join, rejoin).
    pub fn dispatch(
        &mut self,
        player: PlayerId,
        intent: Intent,
        outbox: &mut Outbox,
    ) -> Result<Option<RoomCode>, RoomError> {
        match intent {
            Intent::CreateRoom { name } => self.create_room(player, &name, outbox).map(Some),
            Intent::JoinRoom { room_code, name } => self
                .join_room(player, &room_code, &name, outbox)
                .map(|()| Some(room_code)),
            Intent::LeaveRoom { room_code } => {
                self.leave_room(player, &room_code, outbox).map(|()| None)
            }
            Intent::StartGame {
                room_code,
                settings,
            } => self
                .start_game(player, &room_code, settings, outbox)
                .map(|()| None),
            Intent::RevealWord { room_code } => {
                self.reveal_word(player, &room_code, outbox).map(|()| None)
            }
            Intent::NextPhase { room_code, phase } => self
                .next_phase(player, &room_code, phase, outbox)
                .map(|()| None),
            Intent::RerollGame { room_code } => {
                self.reroll_game(player, &room_code, outbox).map(|()| None)
            }
            Intent::CastVote { room_code, ballot } => self
                .cast_vote(player, &room_code, ballot, outbox)
                .map(|()| None),
            Intent::ConfirmElimination { room_code } => self
                .confirm_elimination(player, &room_code, outbox)
                .map(|()| None),
            Intent::ToggleReady { room_code } => {
                self.toggle_ready(player, &room_code, outbox).map(|()| None)
            }
            Intent::RejoinRoom { room_code } => self
                .rejoin_room(player, &room_code, outbox)
                .map(|()| Some(room_code)),
        }
    }

    // -----------------------------------------------------------------------
    // Membership
    // -----------------------------------------------------------------------

    /// Opens a new room with `player` as its host.
    pub fn create_room(
        &mut self,
        player: PlayerId,
        name: &str,
        outbox: &mut Outbox,
    ) -> Result<RoomCode, RoomError> {
        self.ensure_roomless(player)?;
        let name = normalize_name(name)?;

        let code = loop {
            let candidate = generate_code(self.config.code_length, &mut self.rng);
            if !self.rooms.contains_key(&candidate) {
                break candidate;
            }
        };

        let room = Room::new(code.clone(), Member { id: player, name }, self.config.max_players);
        room.publish(outbox);
        self.rooms.insert(code.clone(), room);
        self.player_rooms.insert(player, code.clone());

        tracing::info!(room_code = %code, player_id = %player, "room created");
        Ok(code)
    }

    /// Adds `player` to a room that is still in the lobby.
    pub fn join_room(
        &mut self,
        player: PlayerId,
        code: &RoomCode,
        name: &str,
        outbox: &mut Outbox,
    ) -> Result<(), RoomError> {
        self.ensure_roomless(player)?;
        let name = normalize_name(name)?;

        let room = self
            .rooms
            .get_mut(code)
            .ok_or_else(|| RoomError::NotFound(code.clone()))?;
        if !room.phase().is_joinable() {
            return Err(RoomError::GameInProgress(code.clone()));
        }
        if room.is_full() {
            return Err(RoomError::RoomFull(code.clone()));
        }
        if room.name_taken(&name) {
            return Err(RoomError::DuplicateName(name));
        }

        room.members.push(Member { id: player, name });
        self.player_rooms.insert(player, code.clone());
        room.publish(outbox);

        tracing::info!(room_code = %code, player_id = %player, members = room.members.len(), "player joined");
        Ok(())
    }

    /// Voluntary departure. Same effect as a disconnect.
    pub fn leave_room(
        &mut self,
        player: PlayerId,
        code: &RoomCode,
        outbox: &mut Outbox,
    ) -> Result<(), RoomError> {
        member_room(&mut self.rooms, code, player)?;
        self.handle_exit(player, ExitReason::Left, outbox);
        Ok(())
    }

    /// Takes `player` out of whatever room they are in.
    ///
    /// Remaining members are told who left. Below the minimum the room is
    /// torn down; otherwise a departing host is replaced by a random
    /// remaining member, and the round is updated (see
    /// [`GameSession::remove_player`](impostor_game::GameSession::remove_player)).
    /// Returns the room the player left, if they were in one.
    pub fn handle_exit(
        &mut self,
        player: PlayerId,
        reason: ExitReason,
        outbox: &mut Outbox,
    ) -> Option<RoomCode> {
        let code = self.player_rooms.remove(&player)?;
        let Some(room) = self.rooms.get_mut(&code) else {
            tracing::warn!(room_code = %code, player_id = %player, "player indexed to a missing room");
            return None;
        };
        let pos = room.members.iter().position(|m| m.id == player)?;
        let member = room.members.remove(pos);

        tracing::info!(room_code = %code, player_id = %player, ?reason, "player left");
        outbox.broadcast(
            room.member_ids(),
            &ServerEvent::PlayerLeft {
                player_id: player,
                name: member.name,
                reason,
            },
        );

        if room.members.is_empty() || room.members.len() < self.config.min_players {
            self.destroy_room(&code, REASON_NOT_ENOUGH_PLAYERS, outbox);
            return Some(code);
        }

        if room.host == player {
            if let Some(next) = room.members.choose(&mut self.rng) {
                room.host = next.id;
                tracing::info!(room_code = %code, host = %next.id, "host changed");
                outbox.broadcast(
                    room.member_ids(),
                    &ServerEvent::HostChanged {
                        host: next.id,
                        name: next.name.clone(),
                    },
                );
            }
        }

        let exit = room.game.remove_player(player);
        if let Some(winner) = exit.winner {
            tracing::info!(room_code = %code, %winner, "round decided by departure");
        }
        if exit.verdict.is_some() && room.settings.auto_confirm {
            auto_confirm(room);
        }

        room.publish(outbox);
        Some(code)
    }

    /// Re-sends the room state to a member, typically after a reconnect.
    pub fn rejoin_room(
        &mut self,
        player: PlayerId,
        code: &RoomCode,
        outbox: &mut Outbox,
    ) -> Result<(), RoomError> {
        let room = member_room(&mut self.rooms, code, player)?;
        room.push_state_to(player, outbox);
        tracing::debug!(room_code = %code, player_id = %player, "state resent");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Round control
    // -----------------------------------------------------------------------

    /// Deals a new round with `settings`, which replace the room's.
    pub fn start_game(
        &mut self,
        player: PlayerId,
        code: &RoomCode,
        settings: GameSettings,
        outbox: &mut Outbox,
    ) -> Result<(), RoomError> {
        let room = member_room(&mut self.rooms, code, player)?;
        room.require_host(player, "start the game")?;
        if room.members.len() < self.config.min_players {
            return Err(RoomError::NotEnoughPlayers {
                needed: self.config.min_players,
                present: room.members.len(),
            });
        }

        let seats = room.seats();
        room.game
            .start_round(&seats, &settings, &self.words, &mut self.rng)?;
        room.settings = settings;
        room.publish(outbox);

        tracing::info!(
            room_code = %code,
            round = room.game.round(),
            players = seats.len(),
            "round started"
        );
        Ok(())
    }

    /// Re-deals the running round with the room's current settings.
    pub fn reroll_game(
        &mut self,
        player: PlayerId,
        code: &RoomCode,
        outbox: &mut Outbox,
    ) -> Result<(), RoomError> {
        let room = member_room(&mut self.rooms, code, player)?;
        room.require_host(player, "reroll the round")?;

        let seats = room.seats();
        let settings = room.settings.clone();
        room.game
            .reroll(&seats, &settings, &self.words, &mut self.rng)?;
        room.publish(outbox);

        tracing::info!(room_code = %code, round = room.game.round(), "round rerolled");
        Ok(())
    }

    pub fn reveal_word(
        &mut self,
        player: PlayerId,
        code: &RoomCode,
        outbox: &mut Outbox,
    ) -> Result<(), RoomError> {
        let room = member_room(&mut self.rooms, code, player)?;
        room.game.reveal(player)?;
        room.publish(outbox);
        Ok(())
    }

    pub fn toggle_ready(
        &mut self,
        player: PlayerId,
        code: &RoomCode,
        outbox: &mut Outbox,
    ) -> Result<(), RoomError> {
        let room = member_room(&mut self.rooms, code, player)?;
        room.game.toggle_ready(player)?;
        room.publish(outbox);
        Ok(())
    }

    /// Host-driven phase change.
    pub fn next_phase(
        &mut self,
        player: PlayerId,
        code: &RoomCode,
        phase: Phase,
        outbox: &mut Outbox,
    ) -> Result<(), RoomError> {
        let room = member_room(&mut self.rooms, code, player)?;
        room.require_host(player, "change the phase")?;
        room.game.advance(phase)?;
        room.publish(outbox);

        tracing::debug!(room_code = %code, %phase, "phase advanced");
        Ok(())
    }

    /// Records a ballot. Ignored ballots change nothing and publish nothing.
    pub fn cast_vote(
        &mut self,
        player: PlayerId,
        code: &RoomCode,
        ballot: Ballot,
        outbox: &mut Outbox,
    ) -> Result<(), RoomError> {
        let room = member_room(&mut self.rooms, code, player)?;
        match room.game.cast_vote(player, ballot)? {
            CastOutcome::Ignored => {
                tracing::debug!(room_code = %code, player_id = %player, "ballot ignored");
                return Ok(());
            }
            CastOutcome::Recorded => {}
            CastOutcome::Completed(verdict) => {
                tracing::info!(room_code = %code, ?verdict, "voting finished");
                if room.settings.auto_confirm {
                    auto_confirm(room);
                }
            }
        }
        room.publish(outbox);
        Ok(())
    }

    /// Host applies the closed tally.
    pub fn confirm_elimination(
        &mut self,
        player: PlayerId,
        code: &RoomCode,
        outbox: &mut Outbox,
    ) -> Result<(), RoomError> {
        let room = member_room(&mut self.rooms, code, player)?;
        room.require_host(player, "confirm the elimination")?;
        let outcome = room.game.confirm_elimination()?;
        room.publish(outbox);

        tracing::info!(
            room_code = %code,
            verdict = ?outcome.verdict,
            winner = ?outcome.winner,
            "elimination confirmed"
        );
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Sends every member of every room back to the start screen and
    /// clears the table.
    pub fn teardown(&mut self, outbox: &mut Outbox) {
        let codes: Vec<RoomCode> = self.rooms.keys().cloned().collect();
        for code in codes {
            self.destroy_room(&code, REASON_SHUTDOWN, outbox);
        }
        self.player_rooms.clear();
    }

    fn destroy_room(&mut self, code: &RoomCode, reason: &str, outbox: &mut Outbox) {
        let Some(room) = self.rooms.remove(code) else {
            return;
        };
        for id in room.member_ids() {
            self.player_rooms.remove(&id);
        }
        outbox.broadcast(
            room.member_ids(),
            &ServerEvent::ForceLobby {
                reason: reason.to_string(),
            },
        );
        tracing::info!(room_code = %code, reason, "room destroyed");
    }

    fn ensure_roomless(&self, player: PlayerId) -> Result<(), RoomError> {
        match self.player_rooms.get(&player) {
            Some(room) => Err(RoomError::AlreadyInRoom {
                player,
                room: room.clone(),
            }),
            None => Ok(()),
        }
    }
}

/// Looks up `code` and checks that `player` belongs to it.
///
/// A free function so callers can keep borrowing the registry's other
/// fields while holding the room.
fn member_room<'a>(
    rooms: &'a mut HashMap<RoomCode, Room>,
    code: &RoomCode,
    player: PlayerId,
) -> Result<&'a mut Room, RoomError> {
    let room = rooms
        .get_mut(code)
        .ok_or_else(|| RoomError::NotFound(code.clone()))?;
    if !room.is_member(player) {
        return Err(RoomError::NotInRoom {
            player,
            room: code.clone(),
        });
    }
    Ok(room)
}

fn auto_confirm(room: &mut Room) {
    match room.game.confirm_elimination() {
        Ok(outcome) => tracing::info!(
            room_code = %room.code(),
            verdict = ?outcome.verdict,
            winner = ?outcome.winner,
            "elimination auto-confirmed"
        ),
        Err(err) => tracing::warn!(room_code = %room.code(), %err, "auto-confirm failed"),
    }
}
