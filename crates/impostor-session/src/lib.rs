//! Player sessions for the impostor game server.
//!
//! A connection is transient; a player is not. This crate maps the one to
//! the other:
//!
//! 1. **Identity** — every new connection is issued a canonical
//!    [`PlayerId`](impostor_protocol::PlayerId) and a secret reconnect
//!    token.
//! 2. **Lookup** — the engine resolves the sender of every frame through
//!    [`SessionManager::player_for`].
//! 3. **Reconnection** — a client presenting its token gets its old
//!    identity back, within a configurable grace period.
//!
//! # How it fits in the stack
//!
//! ```text
//! Room Layer (above)   ← only ever sees PlayerIds
//!     ↕
//! Session Layer (this crate)  ← ConnectionId ⇄ PlayerId
//!     ↕
//! Transport Layer (below)     ← provides ConnectionId
//! ```

mod error;
mod manager;
mod session;

pub use error::SessionError;
pub use manager::SessionManager;
pub use session::{Session, SessionConfig, SessionState};
