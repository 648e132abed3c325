//! The word bank and secret-word distribution.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use impostor_protocol::{GameSettings, PlayerId};
use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};
use serde::{Deserialize, Serialize};

use crate::GameError;

// ---------------------------------------------------------------------------
// WordBank
// ---------------------------------------------------------------------------

/// One secret word with its variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordEntry {
    pub word: String,
    pub category: String,
    /// Close-but-different words; the first one is the two-word variant.
    #[serde(default)]
    pub related: Vec<String>,
    /// Nudge for impostors when hints are enabled.
    #[serde(default)]
    pub hint: Option<String>,
}

impl WordEntry {
    /// `true` if this entry's word or any of its variants was already shown.
    fn is_used(&self, used: &HashSet<String>) -> bool {
        used.contains(&self.word) || self.related.iter().any(|r| used.contains(r))
    }

    fn in_categories(&self, categories: &[String]) -> bool {
        categories
            .iter()
            .any(|c| c.eq_ignore_ascii_case(&self.category))
    }
}

/// The words rounds are drawn from.
///
/// Loaded once at startup and shared read-only by every room.
#[derive(Debug, Clone, Default)]
pub struct WordBank {
    entries: Vec<WordEntry>,
}

/// `(word, category, related, hint)`
const BUILTIN: &[(&str, &str, &[&str], &str)] = &[
    ("cat", "animals", &["lion", "tiger"], "purrs"),
    ("dog", "animals", &["wolf", "fox"], "loyal"),
    ("horse", "animals", &["zebra", "donkey"], "saddle"),
    ("shark", "animals", &["dolphin", "whale"], "fin"),
    ("eagle", "animals", &["hawk", "owl"], "sky"),
    ("frog", "animals", &["toad", "lizard"], "pond"),
    ("bee", "animals", &["wasp", "butterfly"], "honey"),
    ("penguin", "animals", &["seal", "puffin"], "ice"),
    ("snake", "animals", &["worm", "eel"], "slither"),
    ("rabbit", "animals", &["hare", "hamster"], "burrow"),
    ("chair", "objects", &["stool", "bench"], "sit"),
    ("spoon", "objects", &["fork", "ladle"], "soup"),
    ("pencil", "objects", &["pen", "crayon"], "write"),
    ("umbrella", "objects", &["raincoat", "parasol"], "rain"),
    ("guitar", "objects", &["violin", "ukulele"], "strings"),
    ("clock", "objects", &["watch", "hourglass"], "time"),
    ("mirror", "objects", &["window", "photo"], "reflection"),
    ("candle", "objects", &["lamp", "torch"], "wax"),
    ("backpack", "objects", &["suitcase", "purse"], "carry"),
    ("scissors", "objects", &["knife", "razor"], "cut"),
    ("volcano", "nature", &["mountain", "geyser"], "lava"),
    ("river", "nature", &["lake", "stream"], "flow"),
    ("desert", "nature", &["beach", "savanna"], "sand"),
    ("forest", "nature", &["jungle", "park"], "trees"),
    ("rainbow", "nature", &["aurora", "sunset"], "colors"),
    ("snow", "nature", &["hail", "frost"], "cold"),
    ("island", "nature", &["peninsula", "reef"], "surrounded"),
    ("cave", "nature", &["tunnel", "canyon"], "dark"),
    ("thunder", "nature", &["lightning", "storm"], "loud"),
    ("moon", "nature", &["sun", "star"], "night"),
    ("pizza", "food", &["lasagna", "calzone"], "slice"),
    ("coffee", "food", &["tea", "cocoa"], "morning"),
];

impl WordBank {
    /// Builds a bank from explicit entries.
    pub fn new(entries: Vec<WordEntry>) -> Self {
        Self { entries }
    }

    /// The bank shipped with the server.
    pub fn builtin() -> Self {
        let entries = BUILTIN
            .iter()
            .map(|(word, category, related, hint)| WordEntry {
                word: (*word).to_string(),
                category: (*category).to_string(),
                related: related.iter().map(|r| (*r).to_string()).collect(),
                hint: Some((*hint).to_string()),
            })
            .collect();
        Self { entries }
    }

    /// Parses a JSON array of [`WordEntry`] objects.
    pub fn from_json(json: &str) -> Result<Self, GameError> {
        let entries: Vec<WordEntry> = serde_json::from_str(json)?;
        if entries.is_empty() {
            return Err(GameError::EmptyWordBank);
        }
        Ok(Self { entries })
    }

    /// Reads a JSON word bank from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, GameError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct categories, in first-seen order.
    pub fn categories(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for entry in &self.entries {
            if !seen.contains(&entry.category.as_str()) {
                seen.push(entry.category.as_str());
            }
        }
        seen
    }

    /// Picks the round's entry.
    ///
    /// Preference order: unused entries in the selected categories, then any
    /// entry in those categories, then the whole bank. An empty category
    /// list selects everything.
    pub fn draw<R: Rng + ?Sized>(
        &self,
        categories: &[String],
        used: &HashSet<String>,
        rng: &mut R,
    ) -> Result<&WordEntry, GameError> {
        let filtered: Vec<&WordEntry> = self
            .entries
            .iter()
            .filter(|e| categories.is_empty() || e.in_categories(categories))
            .collect();
        let fresh: Vec<&WordEntry> = filtered
            .iter()
            .copied()
            .filter(|e| !e.is_used(used))
            .collect();

        let pool: Vec<&WordEntry> = if !fresh.is_empty() {
            fresh
        } else if !filtered.is_empty() {
            filtered
        } else {
            self.entries.iter().collect()
        };

        pool.choose(rng).copied().ok_or(GameError::EmptyWordBank)
    }

    /// Deals the round's words.
    ///
    /// Civilians are shuffled and the first `floor(n / 2)` (group A) get the
    /// secondary word; the rest get the primary one. Outside two-word mode
    /// both words are the same. Impostors get no word, plus the hint when
    /// the settings allow it.
    pub fn distribute<R: Rng + ?Sized>(
        &self,
        players: &[PlayerId],
        impostors: &HashSet<PlayerId>,
        settings: &GameSettings,
        used: &HashSet<String>,
        rng: &mut R,
    ) -> Result<Distribution, GameError> {
        let entry = self.draw(&settings.categories, used, rng)?;

        let primary = entry.word.clone();
        let secondary = match entry.related.first() {
            Some(related) if settings.two_words => related.clone(),
            _ => primary.clone(),
        };

        let mut civilians: Vec<PlayerId> = players
            .iter()
            .copied()
            .filter(|id| !impostors.contains(id))
            .collect();
        civilians.shuffle(rng);
        let group_a = civilians.len() / 2;

        let mut assignments = HashMap::with_capacity(players.len());
        for (i, id) in civilians.iter().enumerate() {
            let word = if i < group_a { &secondary } else { &primary };
            assignments.insert(
                *id,
                WordAssignment {
                    word: Some(word.clone()),
                    hint: None,
                },
            );
        }
        for id in players.iter().filter(|id| impostors.contains(id)) {
            let hint = if settings.impostor_hint {
                entry.hint.clone()
            } else {
                None
            };
            assignments.insert(*id, WordAssignment { word: None, hint });
        }

        Ok(Distribution {
            assignments,
            chosen: ChosenWords { primary, secondary },
        })
    }
}

// ---------------------------------------------------------------------------
// Distribution
// ---------------------------------------------------------------------------

/// What one player was dealt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordAssignment {
    pub word: Option<String>,
    pub hint: Option<String>,
}

/// The literal words shown this round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChosenWords {
    pub primary: String,
    pub secondary: String,
}

impl ChosenWords {
    pub fn iter(&self) -> impl Iterator<Item = &String> {
        [&self.primary, &self.secondary].into_iter()
    }
}

/// The outcome of [`WordBank::distribute`].
#[derive(Debug, Clone)]
pub struct Distribution {
    pub assignments: HashMap<PlayerId, WordAssignment>,
    pub chosen: ChosenWords,
}
