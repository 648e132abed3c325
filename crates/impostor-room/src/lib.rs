//! Room lifecycle and intent routing for the impostor game.
//!
//! The [`RoomRegistry`] is the single owner of every room. It checks
//! membership and host authority, delegates round logic to each room's
//! [`GameSession`](impostor_game::GameSession), and writes the resulting
//! events into an [`Outbox`] for the server to deliver.
//!
//! # Key types
//!
//! - [`RoomRegistry`] — create/join/leave, exits, host hand-off, intents
//! - [`Room`] — members in join order, host, settings, game
//! - [`Outbox`] — per-player events produced by one operation
//! - [`RoomConfig`] — player limits and code length
//! - [`RoomError`] — rejected intents, mapped to an ack `ErrorKind`

mod config;
mod error;
mod outbox;
mod registry;
mod room;

pub use config::{MAX_ROOM_SIZE, RoomConfig};
pub use error::RoomError;
pub use outbox::{Delivery, Outbox};
pub use registry::{REASON_NOT_ENOUGH_PLAYERS, REASON_SHUTDOWN, RoomRegistry};
pub use room::{MAX_NAME_CHARS, Member, Room, generate_code, normalize_name};
