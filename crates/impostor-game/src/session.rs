//! `GameSession` — one room's round state machine.
//!
//! The session composes the selectors ([`roles`](crate::roles),
//! [`WordBank`], [`starter`](crate::starter)) to deal rounds, and owns the
//! phase, the tally, and everything that must outlive a single round:
//! the impostor history and the set of words already shown.
//!
//! It never talks to the network. Callers (the room registry) check host
//! authority, apply an operation, and then project views with
//! [`GameSession::view_for`].

use std::collections::{HashMap, HashSet};

use impostor_protocol::{Ballot, GameSettings, Phase, PlayerId, StarterPolicy, Team, Verdict};
use rand::Rng;

use crate::identity::{self, Identity};
use crate::player::RoundPlayer;
use crate::score::ScoreCard;
use crate::vote::{CastOutcome, VoteTally};
use crate::words::{WordAssignment, WordBank};
use crate::{GameError, roles, starter};

/// Result of a confirmed elimination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundOutcome {
    pub verdict: Verdict,
    /// `Some` if the round was decided.
    pub winner: Option<Team>,
}

/// Side effects of a player leaving mid-round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExitOutcome {
    /// The leaver was the last missing voter and the tally closed.
    pub verdict: Option<Verdict>,
    /// The departure decided the round.
    pub winner: Option<Team>,
}

/// The long-lived game state of one room.
#[derive(Debug, Clone)]
pub struct GameSession {
    phase: Phase,
    round: u32,
    settings: GameSettings,
    players: Vec<RoundPlayer>,
    /// Impostor set of every dealt round, oldest first. Never pruned.
    impostor_history: Vec<Vec<PlayerId>>,
    /// Every word shown so far. Never pruned.
    used_words: HashSet<String>,
    tally: VoteTally,
    /// The latest vote of this round closed and was applied. Ballots
    /// arriving after that are stale.
    ballots_closed: bool,
    starter: Option<PlayerId>,
    winner: Option<Team>,
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new()
    }
}

impl GameSession {
    /// A session in the lobby with no history.
    pub fn new() -> Self {
        Self {
            phase: Phase::Lobby,
            round: 0,
            settings: GameSettings::default(),
            players: Vec::new(),
            impostor_history: Vec::new(),
            used_words: HashSet::new(),
            tally: VoteTally::new(),
            ballots_closed: false,
            starter: None,
            winner: None,
        }
    }

    // -----------------------------------------------------------------------
    // Dealing
    // -----------------------------------------------------------------------

    /// Deals a new round for `seats` (join order) from the lobby or the
    /// result screen.
    pub fn start_round<R: Rng + ?Sized>(
        &mut self,
        seats: &[(PlayerId, String)],
        settings: &GameSettings,
        bank: &WordBank,
        rng: &mut R,
    ) -> Result<(), GameError> {
        if !self.phase.can_start_round() {
            return Err(GameError::WrongPhase {
                action: "start a round",
                phase: self.phase,
            });
        }
        self.deal(seats, settings, bank, false, rng)
    }

    /// Re-deals the current round: new roles and words, same icons and
    /// colors for everyone who already had one.
    pub fn reroll<R: Rng + ?Sized>(
        &mut self,
        seats: &[(PlayerId, String)],
        settings: &GameSettings,
        bank: &WordBank,
        rng: &mut R,
    ) -> Result<(), GameError> {
        if self.phase == Phase::Lobby {
            return Err(GameError::WrongPhase {
                action: "reroll",
                phase: self.phase,
            });
        }
        self.deal(seats, settings, bank, true, rng)
    }

    /// Everything is computed before anything is committed, so a failed
    /// deal leaves the session untouched.
    fn deal<R: Rng + ?Sized>(
        &mut self,
        seats: &[(PlayerId, String)],
        settings: &GameSettings,
        bank: &WordBank,
        keep_identity: bool,
        rng: &mut R,
    ) -> Result<(), GameError> {
        let ids: Vec<PlayerId> = seats.iter().map(|(id, _)| *id).collect();
        let count = settings
            .impostor_count
            .unwrap_or_else(|| roles::impostor_count(ids.len()));
        if count == 0 || count >= ids.len() {
            return Err(GameError::ImpostorCountOutOfRange {
                requested: count,
                players: ids.len(),
            });
        }

        let impostors = roles::select_impostors(&ids, count, &self.impostor_history, rng);
        let impostor_set: HashSet<PlayerId> = impostors.iter().copied().collect();

        let mut dealt = bank.distribute(&ids, &impostor_set, settings, &self.used_words, rng)?;

        let roles_by_seat: Vec<(PlayerId, bool)> = ids
            .iter()
            .map(|id| (*id, impostor_set.contains(id)))
            .collect();
        let starter = match settings.starter {
            StarterPolicy::Nobody => None,
            StarterPolicy::Anyone => Some(starter::pick_starter(&roles_by_seat, true, rng)?),
            StarterPolicy::Civilians => Some(starter::pick_starter(&roles_by_seat, false, rng)?),
        };

        let previous: HashMap<PlayerId, &RoundPlayer> =
            self.players.iter().map(|p| (p.id(), p)).collect();
        let identities = self.identities_for(&ids, &previous, keep_identity, rng);

        let players: Vec<RoundPlayer> = seats
            .iter()
            .zip(identities)
            .map(|((id, name), identity)| {
                let scores = previous
                    .get(id)
                    .map(|p| ScoreCard::carrying(p.scores().global()))
                    .unwrap_or_default();
                let words = dealt.assignments.remove(id).unwrap_or(WordAssignment {
                    word: None,
                    hint: None,
                });
                RoundPlayer::deal(
                    *id,
                    name.clone(),
                    identity,
                    impostor_set.contains(id),
                    words,
                    scores,
                )
            })
            .collect();

        // -- commit --
        self.impostor_history.push(impostors);
        self.used_words.extend(dealt.chosen.iter().cloned());
        self.players = players;
        self.settings = settings.clone();
        self.tally.reset();
        self.ballots_closed = false;
        self.starter = starter;
        self.winner = None;
        self.phase = Phase::Reveal;
        self.round += 1;

        tracing::debug!(
            round = self.round,
            impostors = count,
            players = self.players.len(),
            "round dealt"
        );
        Ok(())
    }

    fn identities_for<R: Rng + ?Sized>(
        &self,
        ids: &[PlayerId],
        previous: &HashMap<PlayerId, &RoundPlayer>,
        keep_identity: bool,
        rng: &mut R,
    ) -> Vec<Identity> {
        if !keep_identity {
            return identity::assign(ids.len(), &[], rng);
        }

        let kept: Vec<Option<Identity>> = ids
            .iter()
            .map(|id| previous.get(id).map(|p| p.identity().clone()))
            .collect();
        let taken: Vec<Identity> = kept.iter().flatten().cloned().collect();
        let newcomers = kept.iter().filter(|k| k.is_none()).count();
        let mut fresh = identity::assign(newcomers, &taken, rng).into_iter();

        kept.into_iter()
            .map(|k| {
                k.or_else(|| fresh.next()).unwrap_or_else(|| Identity {
                    icon: identity::ICONS[0].to_string(),
                    color: identity::COLORS[0].to_string(),
                })
            })
            .collect()
    }

    // -----------------------------------------------------------------------
    // Player actions
    // -----------------------------------------------------------------------

    /// Marks that `player` has looked at their card.
    pub fn reveal(&mut self, player: PlayerId) -> Result<(), GameError> {
        self.require_active("reveal a word")?;
        self.player_mut(player)?.revealed = true;
        Ok(())
    }

    /// Flips `player`'s ready flag and returns the new value.
    pub fn toggle_ready(&mut self, player: PlayerId) -> Result<bool, GameError> {
        self.require_active("toggle ready")?;
        let seat = self.player_mut(player)?;
        seat.ready = !seat.ready;
        Ok(seat.ready)
    }

    /// Host-driven phase change along [`Phase::can_advance_to`].
    ///
    /// Entering or abandoning a vote clears all ballots.
    pub fn advance(&mut self, target: Phase) -> Result<(), GameError> {
        if !self.phase.can_advance_to(target) {
            return Err(GameError::InvalidTransition {
                from: self.phase,
                to: target,
            });
        }
        if target == Phase::Voting || self.phase == Phase::Voting {
            self.tally.reset();
            self.ballots_closed = false;
        }
        self.phase = target;
        Ok(())
    }

    /// Records a ballot.
    ///
    /// Ballots from eliminated or absent players, or after the tally has
    /// closed (including once its verdict was applied and the phase moved
    /// on), are [`CastOutcome::Ignored`]. Accusing someone who is not in
    /// the round or already out is an error.
    pub fn cast_vote(&mut self, voter: PlayerId, ballot: Ballot) -> Result<CastOutcome, GameError> {
        if self.ballots_closed || self.tally.is_finished() {
            return Ok(CastOutcome::Ignored);
        }
        if self.phase != Phase::Voting {
            return Err(GameError::WrongPhase {
                action: "vote",
                phase: self.phase,
            });
        }
        if let Some(target) = ballot.target() {
            let accused = self
                .player(target)
                .ok_or(GameError::UnknownPlayer(target))?;
            if !accused.is_alive() {
                return Err(GameError::AlreadyEliminated(target));
            }
        }

        let alive = self.alive_ids();
        Ok(self.tally.cast(voter, ballot, &alive))
    }

    /// Applies the closed tally's verdict and decides whether the round
    /// continues.
    pub fn confirm_elimination(&mut self) -> Result<RoundOutcome, GameError> {
        if self.phase != Phase::Voting {
            return Err(GameError::WrongPhase {
                action: "confirm an elimination",
                phase: self.phase,
            });
        }
        let verdict = self.tally.verdict().ok_or(GameError::VotingOpen)?;

        if let Some(eliminated) = verdict.eliminated() {
            if let Some(seat) = self.players.iter_mut().find(|p| p.id() == eliminated) {
                seat.alive = false;
            }
        }
        self.tally.reset();
        self.ballots_closed = true;

        let winner = self.evaluate_win();
        match winner {
            Some(team) => self.finish(team),
            None => self.phase = Phase::Discussion,
        }
        Ok(RoundOutcome { verdict, winner })
    }

    /// Takes a departed player out of the round.
    ///
    /// - reveal: dropped from the roster entirely
    /// - discussion / voting: stays listed but is dead
    /// - result: the final roster is left as it was
    ///
    /// While a round is running the win condition is re-checked, and an
    /// open tally may close if the leaver was the last missing voter.
    pub fn remove_player(&mut self, player: PlayerId) -> ExitOutcome {
        if self.player(player).is_none() {
            return ExitOutcome::default();
        }

        match self.phase {
            Phase::Result => return ExitOutcome::default(),
            Phase::Lobby => {
                self.players.retain(|p| p.id() != player);
                return ExitOutcome::default();
            }
            Phase::Reveal => {
                self.players.retain(|p| p.id() != player);
                if self.starter == Some(player) {
                    self.starter = None;
                }
            }
            Phase::Discussion | Phase::Voting => {
                if let Some(seat) = self.players.iter_mut().find(|p| p.id() == player) {
                    seat.alive = false;
                }
            }
        }
        self.tally.forget(player);

        if let Some(team) = self.evaluate_win() {
            self.finish(team);
            return ExitOutcome {
                verdict: None,
                winner: Some(team),
            };
        }

        let verdict = if self.phase == Phase::Voting {
            let alive = self.alive_ids();
            self.tally.check_completion(&alive)
        } else {
            None
        };
        ExitOutcome {
            verdict,
            winner: None,
        }
    }

    /// Civilians win when no impostor is alive; impostors win once they
    /// are at least as many as the living civilians.
    pub fn evaluate_win(&self) -> Option<Team> {
        let impostors = self
            .players
            .iter()
            .filter(|p| p.is_alive() && p.is_impostor())
            .count();
        let crew = self
            .players
            .iter()
            .filter(|p| p.is_alive() && !p.is_impostor())
            .count();

        if impostors == 0 {
            Some(Team::Civilians)
        } else if impostors >= crew {
            Some(Team::Impostors)
        } else {
            None
        }
    }

    /// Settles scores exactly once and enters the result phase.
    fn finish(&mut self, team: Team) {
        if self.phase == Phase::Voting {
            self.ballots_closed = true;
        }
        for seat in &mut self.players {
            let (is_impostor, alive) = (seat.is_impostor(), seat.is_alive());
            seat.scores.settle(is_impostor, alive);
        }
        self.tally.reset();
        self.winner = Some(team);
        self.phase = Phase::Result;
        tracing::debug!(round = self.round, winner = %team, "round decided");
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Number of rounds dealt so far (rerolls included).
    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    pub fn players(&self) -> &[RoundPlayer] {
        &self.players
    }

    pub fn player(&self, id: PlayerId) -> Option<&RoundPlayer> {
        self.players.iter().find(|p| p.id() == id)
    }

    pub fn impostors(&self) -> Vec<PlayerId> {
        self.players
            .iter()
            .filter(|p| p.is_impostor())
            .map(RoundPlayer::id)
            .collect()
    }

    pub fn alive_ids(&self) -> Vec<PlayerId> {
        self.players
            .iter()
            .filter(|p| p.is_alive())
            .map(RoundPlayer::id)
            .collect()
    }

    pub fn starter(&self) -> Option<PlayerId> {
        self.starter
    }

    pub fn winner(&self) -> Option<Team> {
        self.winner
    }

    pub fn tally(&self) -> &VoteTally {
        &self.tally
    }

    pub fn impostor_history(&self) -> &[Vec<PlayerId>] {
        &self.impostor_history
    }

    pub fn used_words(&self) -> &HashSet<String> {
        &self.used_words
    }

    fn player_mut(&mut self, id: PlayerId) -> Result<&mut RoundPlayer, GameError> {
        self.players
            .iter_mut()
            .find(|p| p.id() == id)
            .ok_or(GameError::UnknownPlayer(id))
    }

    fn require_active(&self, action: &'static str) -> Result<(), GameError> {
        if self.phase.is_round_active() {
            Ok(())
        } else {
            Err(GameError::WrongPhase {
                action,
                phase: self.phase,
            })
        }
    }
}
