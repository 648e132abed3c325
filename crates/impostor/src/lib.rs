//! # Impostor
//!
//! Server-authoritative engine for the impostor social-deduction party
//! game.
//!
//! Clients connect over WebSocket, say `Hello`, and from then on send
//! intents ("create room", "cast vote", ...). A single engine task owns
//! every room and session, validates each intent, and pushes a
//! personalized view of the game back to each player.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use impostor::prelude::*;
//!
//! # async fn start() -> Result<(), ImpostorError> {
//! let config = ServerConfig::from_env();
//! let server = ImpostorServer::builder().config(&config)?.build().await?;
//! server.run_until(async { let _ = tokio::signal::ctrl_c().await; }).await
//! # }
//! ```

mod config;
mod engine;
mod error;
mod handler;
mod server;

pub use config::ServerConfig;
pub use engine::EngineHandle;
pub use error::ImpostorError;
pub use server::{ImpostorServer, ImpostorServerBuilder, PROTOCOL_VERSION};

/// Convenient imports for running a server and talking to it.
pub mod prelude {
    pub use crate::{
        EngineHandle, ImpostorError, ImpostorServer, ImpostorServerBuilder, PROTOCOL_VERSION,
        ServerConfig,
    };
    pub use impostor_game::WordBank;
    pub use impostor_protocol::{
        Ack, Ballot, Envelope, ErrorKind, ExitReason, GameSettings, Intent, IntentRequest,
        Payload, Phase, PlayerId, PlayerView, RoomCode, RoomSnapshot, Roster, ServerEvent, StarterPolicy,
        SystemMessage,
    };
    pub use impostor_room::RoomConfig;
    pub use impostor_session::SessionConfig;
}
