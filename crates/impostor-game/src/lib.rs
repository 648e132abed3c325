//! Round engine for the impostor game.
//!
//! Everything here is synchronous and network-free. A [`GameSession`]
//! holds one room's game and is driven by the room layer:
//!
//! ```text
//! lobby ──start──▶ reveal ─▶ discussion ⇄ voting ──confirm──▶ result
//!   ▲                                                             │
//!   └──────────────────────────── next-phase ─────────────────────┘
//! ```
//!
//! The building blocks are exposed on their own for testing and reuse:
//! [`roles`] picks impostors with a streak limit, [`WordBank`] deals the
//! secret words, [`VoteTally`] resolves ballots, and [`ScoreCard`] keeps
//! per-player points.

mod error;
mod identity;
mod player;
pub mod roles;
mod score;
mod session;
mod starter;
mod view;
mod vote;
mod words;

pub use error::GameError;
pub use identity::{COLORS, ICONS, Identity};
pub use player::RoundPlayer;
pub use score::{ScoreCard, round_points};
pub use session::{ExitOutcome, GameSession, RoundOutcome};
pub use starter::pick_starter;
pub use vote::{CastOutcome, VoteTally};
pub use words::{ChosenWords, Distribution, WordAssignment, WordBank, WordEntry};
