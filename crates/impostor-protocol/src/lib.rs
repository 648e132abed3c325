//! Wire protocol for the impostor game server.
//!
//! This crate defines everything that crosses the wire between a client
//! and the server:
//!
//! - **Identity and envelopes** ([`PlayerId`], [`RoomCode`], [`Envelope`],
//!   [`SystemMessage`]) — connection plumbing.
//! - **Game vocabulary** ([`Phase`], [`GameSettings`], [`Ballot`]) — the
//!   closed sets the engine reasons about.
//! - **Intents** ([`Intent`], [`IntentRequest`], [`Ack`]) — what a client
//!   asks the server to do, and the structured answer.
//! - **Events** ([`ServerEvent`], [`PlayerView`], [`RoomSnapshot`]) — what
//!   the server pushes to room members.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — bytes in, bytes out.
//!
//! # Architecture
//!
//! The protocol layer knows nothing about sockets or rooms. It only
//! describes shapes and how to (de)serialize them.
//!
//! ```text
//! Transport (bytes) → Protocol (Envelope) → Engine (intents, events)
//! ```

// ---------------------------------------------------------------------------
// Module declarations
// ---------------------------------------------------------------------------

mod codec;
mod error;
mod event;
mod game;
mod intent;
mod types;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use event::{
    BallotEntry, ExitReason, MemberSummary, PendingEntry, PlayerView,
    RoomSnapshot, Roster, RosterEntry, SelfView, ServerEvent,
};
pub use game::{
    Ballot, GameSettings, NoEliminationReason, Phase, StarterPolicy, Team,
    Verdict,
};
pub use intent::{Ack, AckError, ErrorKind, Intent, IntentRequest};
pub use types::{Envelope, Payload, PlayerId, RoomCode, SystemMessage};
