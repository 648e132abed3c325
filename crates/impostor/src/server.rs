//! `ImpostorServer` builder and server loop.
//!
//! This is the entry point for running an impostor game server. It ties
//! together all the layers: transport → protocol → engine (sessions and
//! rooms).

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use impostor_game::WordBank;
use impostor_protocol::{Codec, JsonCodec};
use impostor_room::{RoomConfig, RoomRegistry};
use impostor_session::{SessionConfig, SessionManager};
use impostor_transport::{Transport, WebSocketTransport};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::engine::{EngineHandle, spawn_engine};
use crate::handler::handle_connection;
use crate::{ImpostorError, ServerConfig};

/// The current protocol version. Clients must send this in their Hello or
/// be rejected.
pub const PROTOCOL_VERSION: u32 = 1;

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) engine: EngineHandle,
    pub(crate) codec: C,
    pub(crate) idle_timeout: Duration,
    started: Instant,
}

impl<C: Codec> ServerState<C> {
    /// Milliseconds since the server started.
    pub(crate) fn now_millis(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }
}

/// Builder for configuring and starting an impostor server.
///
/// # Example
///
/// ```rust,no_run
/// use impostor::prelude::*;
///
/// # async fn start() -> Result<(), ImpostorError> {
/// let server = ImpostorServer::builder()
///     .bind("0.0.0.0:8080")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct ImpostorServerBuilder {
    bind_addr: String,
    session_config: SessionConfig,
    room_config: RoomConfig,
    idle_timeout: Duration,
    words: WordBank,
    seed: Option<u64>,
}

impl ImpostorServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            session_config: SessionConfig::default(),
            room_config: RoomConfig::default(),
            idle_timeout: Duration::from_secs(30),
            words: WordBank::builtin(),
            seed: None,
        }
    }

    /// Applies everything in `config`, loading its word bank file if one
    /// is named.
    ///
    /// # Errors
    /// Returns [`ImpostorError::Game`] if the word bank cannot be loaded.
    pub fn config(mut self, config: &ServerConfig) -> Result<Self, ImpostorError> {
        if let Some(path) = &config.words {
            self.words = WordBank::load(path)?;
            tracing::info!(path = %path.display(), entries = self.words.len(), "word bank loaded");
        }
        self.bind_addr = config.bind.clone();
        self.session_config = config.session_config();
        self.room_config = config.room_config();
        self.idle_timeout = config.idle_timeout();
        self.seed = config.seed;
        Ok(self)
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the session configuration.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Sets the room configuration. Player limits are clamped.
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config.clamped();
        self
    }

    /// Closes connections that stay silent for longer than `timeout`.
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Replaces the built-in word bank.
    pub fn words(mut self, words: WordBank) -> Self {
        self.words = words;
        self
    }

    /// Seeds the game RNG, making draws reproducible.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Binds the transport and starts the engine.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build(self) -> Result<ImpostorServer<JsonCodec>, ImpostorError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let words = Arc::new(self.words);
        let rooms = match self.seed {
            Some(seed) => RoomRegistry::with_rng(self.room_config, words, StdRng::seed_from_u64(seed)),
            None => RoomRegistry::new(self.room_config, words),
        };
        let engine = spawn_engine(SessionManager::new(self.session_config), rooms);

        let state = Arc::new(ServerState {
            engine,
            codec: JsonCodec,
            idle_timeout: self.idle_timeout,
            started: Instant::now(),
        });

        Ok(ImpostorServer { transport, state })
    }
}

impl Default for ImpostorServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running impostor game server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct ImpostorServer<C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl ImpostorServer<JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> ImpostorServerBuilder {
        ImpostorServerBuilder::new()
    }
}

impl<C: Codec> ImpostorServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> Result<std::net::SocketAddr, ImpostorError> {
        Ok(self.transport.local_addr()?)
    }

    /// A handle to the engine, e.g. to shut it down from elsewhere.
    pub fn engine(&self) -> EngineHandle {
        self.state.engine.clone()
    }

    /// Runs the server accept loop until the process is terminated.
    pub async fn run(self) -> Result<(), ImpostorError> {
        self.run_until(std::future::pending()).await
    }

    /// Runs the server accept loop until `signal` resolves, then shuts the
    /// engine down: every room is sent back to the start screen and every
    /// connection is closed.
    pub async fn run_until(mut self, signal: impl Future<Output = ()>) -> Result<(), ImpostorError> {
        tracing::info!("impostor server running");
        tokio::pin!(signal);

        loop {
            tokio::select! {
                accepted = self.transport.accept() => match accepted {
                    Ok(conn) => {
                        let state = Arc::clone(&self.state);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(conn, state).await {
                                tracing::debug!(error = %e, "connection ended with error");
                            }
                        });
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "accept failed");
                    }
                },
                () = &mut signal => break,
            }
        }

        tracing::info!("shutdown signal received");
        self.state.engine.shutdown().await
    }
}
