//! Error types for the round engine.

use impostor_protocol::{Phase, PlayerId};

/// Errors produced while dealing or playing a round.
///
/// None of these are fatal: the caller rejects the intent and the session
/// is left exactly as it was.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// The word bank (after every fallback) has nothing to draw from.
    #[error("word bank is empty")]
    EmptyWordBank,

    /// The starter policy excludes every player.
    #[error("no player is eligible to start the discussion")]
    NoEligibleStarter,

    /// The requested impostor count leaves no civilians, or is zero.
    #[error("cannot have {requested} impostors among {players} players")]
    ImpostorCountOutOfRange { requested: usize, players: usize },

    /// The action is not allowed in the current phase.
    #[error("cannot {action} during {phase}")]
    WrongPhase { action: &'static str, phase: Phase },

    /// A `next-phase` request outside the transition table.
    #[error("cannot move from {from} to {to}")]
    InvalidTransition { from: Phase, to: Phase },

    /// The player is not part of this round.
    #[error("player {0} is not in this round")]
    UnknownPlayer(PlayerId),

    /// The ballot names someone who is already out.
    #[error("player {0} has already been eliminated")]
    AlreadyEliminated(PlayerId),

    /// Confirmation was requested before every living player voted.
    #[error("voting is still open")]
    VotingOpen,

    /// Reading a word bank file failed.
    #[error("failed to read word bank: {0}")]
    WordBankIo(#[from] std::io::Error),

    /// A word bank file is not valid JSON for the expected shape.
    #[error("failed to parse word bank: {0}")]
    WordBankFormat(#[from] serde_json::Error),
}
