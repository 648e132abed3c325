//! Events the server pushes to room members, and the per-player view.
//!
//! A [`PlayerView`] is built separately for each recipient. It carries the
//! recipient's own secrets (word, hint, role) and a roster that never
//! contains anybody else's.

use serde::{Deserialize, Serialize};

use crate::{Ballot, GameSettings, Phase, PlayerId, RoomCode, Team, Verdict};

// ---------------------------------------------------------------------------
// ServerEvent
// ---------------------------------------------------------------------------

/// Why a player left a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExitReason {
    Left,
    Disconnected,
}

/// A pushed event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// Membership, host, phase, or settings changed.
    RoomUpdated { room: RoomSnapshot },

    /// The recipient's projected game state.
    GameUpdate { view: PlayerView },

    /// Someone left the room.
    PlayerLeft {
        player_id: PlayerId,
        name: String,
        reason: ExitReason,
    },

    /// Host rights moved to another member.
    HostChanged { host: PlayerId, name: String },

    /// The room is gone; clients should return to the start screen.
    ForceLobby { reason: String },
}

/// A room member as everyone sees them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberSummary {
    pub id: PlayerId,
    pub name: String,
    pub is_host: bool,
}

/// Public room state: no secrets, identical for every member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSnapshot {
    pub code: RoomCode,
    pub host: PlayerId,
    pub phase: Phase,
    /// Join order.
    pub members: Vec<MemberSummary>,
    pub settings: GameSettings,
    pub max_players: usize,
}

// ---------------------------------------------------------------------------
// PlayerView
// ---------------------------------------------------------------------------

/// The recipient's own round state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelfView {
    pub id: PlayerId,
    pub name: String,
    pub icon: String,
    pub color: String,
    pub is_impostor: bool,
    /// `None` for impostors.
    pub word: Option<String>,
    /// Only impostors in rounds with hints enabled get one.
    pub hint: Option<String>,
    pub alive: bool,
    pub revealed: bool,
    pub ready: bool,
    pub voted: bool,
}

/// Roster entry before discussion starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingEntry {
    pub id: PlayerId,
    pub name: String,
    pub icon: String,
    pub color: String,
    pub ready: bool,
}

/// Roster entry from discussion onwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub id: PlayerId,
    pub name: String,
    pub icon: String,
    pub color: String,
    pub alive: bool,
    pub voted: bool,
    /// Points earned in the last settled round.
    pub score: f64,
    pub global_score: f64,
    /// Revealed once the player is eliminated or the round is decided.
    pub is_impostor: Option<bool>,
}

/// The other players, shaped by phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "players", rename_all = "lowercase")]
pub enum Roster {
    Pending(Vec<PendingEntry>),
    Full(Vec<RosterEntry>),
}

/// One cast ballot, published after the tally closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotEntry {
    pub voter: PlayerId,
    pub ballot: Ballot,
}

/// Everything one player is allowed to know about the current round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerView {
    pub room_code: RoomCode,
    pub phase: Phase,
    pub round: u32,
    pub me: SelfView,
    pub host: PlayerId,
    pub is_host: bool,
    /// Who opens the discussion, when the room announces one.
    pub starter: Option<PlayerId>,
    pub two_words: bool,
    pub voting_finished: bool,
    /// Populated once the tally has closed.
    pub ballots: Vec<BallotEntry>,
    pub verdict: Option<Verdict>,
    pub winner: Option<Team>,
    pub roster: Roster,
}
