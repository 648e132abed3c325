//! Game vocabulary shared by the engine and the client: phases, round
//! settings, ballots, and round outcomes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::PlayerId;

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// The phase of a room's round. Exactly one is authoritative at a time.
///
/// ```text
///            start-game                next-phase          next-phase
///   Lobby ─────────────→ Reveal ─────────────→ Discussion ─────────→ Voting
///     ↑                    ↑                        ↑                 │
///     │ next-phase         │ reroll / start-game    └──confirm / abort─┤
///     │                    │                                          │
///   Result ←───────────────┴─────────────── confirm (win) ────────────┘
/// ```
///
/// `Lobby → Reveal` and `Result → Reveal` only happen through start-game,
/// and `→ Result` only through a decided round. The host's `next-phase`
/// intent is limited to the edges accepted by [`Phase::can_advance_to`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Lobby,
    Reveal,
    Discussion,
    Voting,
    Result,
}

impl Phase {
    /// Returns `true` if new players may join.
    pub fn is_joinable(self) -> bool {
        matches!(self, Self::Lobby)
    }

    /// Returns `true` while a round is being played (not yet decided).
    pub fn is_round_active(self) -> bool {
        matches!(self, Self::Reveal | Self::Discussion | Self::Voting)
    }

    /// Returns `true` if a new round may be dealt from this phase.
    pub fn can_start_round(self) -> bool {
        matches!(self, Self::Lobby | Self::Result)
    }

    /// Returns `true` once players see the full roster (alive flags,
    /// scores) instead of the pre-game ready list.
    pub fn shows_full_roster(self) -> bool {
        matches!(self, Self::Discussion | Self::Voting | Self::Result)
    }

    /// Returns `true` if the host may move the room from `self` to
    /// `target` with a `next-phase` intent.
    pub fn can_advance_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Reveal, Self::Discussion)
                | (Self::Discussion, Self::Voting)
                | (Self::Voting, Self::Discussion)
                | (Self::Result, Self::Lobby)
        )
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Lobby => "lobby",
            Self::Reveal => "reveal",
            Self::Discussion => "discussion",
            Self::Voting => "voting",
            Self::Result => "result",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// GameSettings
// ---------------------------------------------------------------------------

/// Who opens the discussion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StarterPolicy {
    /// No starter is announced.
    Nobody,
    /// Any player, impostors included.
    #[default]
    Anyone,
    /// Civilians only.
    Civilians,
}

/// Host-chosen settings for the next round.
///
/// Every field has a default, so a client may send `{}` or omit the object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    /// Overrides the size-based impostor count when set.
    pub impostor_count: Option<usize>,
    /// Splits civilians across two related words.
    pub two_words: bool,
    /// Impostors receive the word's hint.
    pub impostor_hint: bool,
    /// Categories the word is drawn from. Empty means the whole bank.
    pub categories: Vec<String>,
    /// Discussion starter policy.
    pub starter: StarterPolicy,
    /// Apply a finished tally immediately instead of waiting for the host.
    pub auto_confirm: bool,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            impostor_count: None,
            two_words: false,
            impostor_hint: false,
            categories: vec!["animals".into(), "objects".into(), "nature".into()],
            starter: StarterPolicy::Anyone,
            auto_confirm: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Voting
// ---------------------------------------------------------------------------

/// One voter's choice.
///
/// Externally tagged: `{"suspect": 3}` or `"abstain"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ballot {
    Suspect(PlayerId),
    Abstain,
}

impl Ballot {
    /// The accused player, if this ballot names one.
    pub fn target(self) -> Option<PlayerId> {
        match self {
            Self::Suspect(id) => Some(id),
            Self::Abstain => None,
        }
    }
}

/// Why a finished tally eliminated nobody.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NoEliminationReason {
    /// Two or more targets share the highest count.
    Tie,
    /// Every ballot was an abstention.
    NoVotes,
}

/// The result of a finished tally, pending host confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum Verdict {
    Eliminate { player: PlayerId },
    NoElimination { reason: NoEliminationReason },
}

impl Verdict {
    /// The player to eliminate, if any.
    pub fn eliminated(self) -> Option<PlayerId> {
        match self {
            Self::Eliminate { player } => Some(player),
            Self::NoElimination { .. } => None,
        }
    }
}

/// The side that won a decided round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    Civilians,
    Impostors,
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Civilians => f.write_str("civilians"),
            Self::Impostors => f.write_str("impostors"),
        }
    }
}
