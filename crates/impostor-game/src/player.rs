//! A player's round-scoped record.

use impostor_protocol::PlayerId;

use crate::identity::Identity;
use crate::score::ScoreCard;
use crate::words::WordAssignment;

/// One seat in the current round.
///
/// Role, word, and identity are fixed when the round is dealt and only
/// readable afterwards. The session mutates the remaining flags.
#[derive(Debug, Clone)]
pub struct RoundPlayer {
    id: PlayerId,
    name: String,
    identity: Identity,
    is_impostor: bool,
    word: Option<String>,
    hint: Option<String>,
    pub(crate) alive: bool,
    pub(crate) revealed: bool,
    pub(crate) ready: bool,
    pub(crate) scores: ScoreCard,
}

impl RoundPlayer {
    pub(crate) fn deal(
        id: PlayerId,
        name: String,
        identity: Identity,
        is_impostor: bool,
        words: WordAssignment,
        scores: ScoreCard,
    ) -> Self {
        Self {
            id,
            name,
            identity,
            is_impostor,
            word: words.word,
            hint: words.hint,
            alive: true,
            revealed: false,
            ready: false,
            scores,
        }
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn is_impostor(&self) -> bool {
        self.is_impostor
    }

    pub fn word(&self) -> Option<&str> {
        self.word.as_deref()
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn has_revealed(&self) -> bool {
        self.revealed
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn scores(&self) -> &ScoreCard {
        &self.scores
    }
}
