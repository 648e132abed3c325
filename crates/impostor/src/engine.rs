//! The engine actor: the single writer of all session and room state.
//!
//! Connection tasks never touch rooms directly. They send an
//! [`EngineCommand`] through an [`EngineHandle`], the engine applies it to
//! completion, and events flow back through each player's outbound
//! channel. One command at a time, so intents from one room are observed in
//! the order they arrived.

use std::collections::HashMap;
use std::time::Duration;

use impostor_protocol::{Ack, ExitReason, IntentRequest, Payload, PlayerId, SystemMessage};
use impostor_room::{Outbox, RoomRegistry};
use impostor_session::{SessionError, SessionManager};
use impostor_transport::ConnectionId;
use tokio::sync::{mpsc, oneshot};

use crate::ImpostorError;

/// Capacity of the engine's command channel.
const COMMAND_CHANNEL_SIZE: usize = 256;

/// How often disconnected sessions are checked against the grace period.
const SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// Frames queued for one connection's writer task.
pub(crate) type Outbound = mpsc::UnboundedSender<Payload>;

/// Identity handed back to a connection after its handshake.
#[derive(Debug, Clone)]
pub(crate) struct Welcome {
    pub(crate) player_id: PlayerId,
    pub(crate) reconnect_token: String,
}

/// Commands a connection task can send to the engine.
pub(crate) enum EngineCommand {
    /// A fresh connection wants a new identity.
    Connect {
        connection: ConnectionId,
        outbound: Outbound,
        reply: oneshot::Sender<Welcome>,
    },

    /// A connection presents a reconnect token.
    Resume {
        connection: ConnectionId,
        token: String,
        outbound: Outbound,
        reply: oneshot::Sender<Result<Welcome, SessionError>>,
    },

    /// A decoded intent (fire-and-forget; the ack goes out through the
    /// outbound channel).
    Intent {
        connection: ConnectionId,
        request: IntentRequest,
    },

    /// The connection is gone.
    Disconnected { connection: ConnectionId },

    /// Tear everything down and stop.
    Shutdown { reply: oneshot::Sender<()> },
}

/// Handle to the running engine. Cheap to clone.
#[derive(Clone)]
pub struct EngineHandle {
    sender: mpsc::Sender<EngineCommand>,
}

impl EngineHandle {
    pub(crate) async fn connect(
        &self,
        connection: ConnectionId,
        outbound: Outbound,
    ) -> Result<Welcome, ImpostorError> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineCommand::Connect {
            connection,
            outbound,
            reply,
        })
        .await?;
        rx.await.map_err(|_| ImpostorError::EngineStopped)
    }

    pub(crate) async fn resume(
        &self,
        connection: ConnectionId,
        token: String,
        outbound: Outbound,
    ) -> Result<Welcome, ImpostorError> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineCommand::Resume {
            connection,
            token,
            outbound,
            reply,
        })
        .await?;
        Ok(rx.await.map_err(|_| ImpostorError::EngineStopped)??)
    }

    pub(crate) async fn intent(
        &self,
        connection: ConnectionId,
        request: IntentRequest,
    ) -> Result<(), ImpostorError> {
        self.send(EngineCommand::Intent {
            connection,
            request,
        })
        .await
    }

    pub(crate) async fn disconnected(&self, connection: ConnectionId) -> Result<(), ImpostorError> {
        self.send(EngineCommand::Disconnected { connection }).await
    }

    /// Sends every player back to the start screen, closes their
    /// connections, and stops the engine.
    pub async fn shutdown(&self) -> Result<(), ImpostorError> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineCommand::Shutdown { reply }).await?;
        rx.await.map_err(|_| ImpostorError::EngineStopped)
    }

    async fn send(&self, command: EngineCommand) -> Result<(), ImpostorError> {
        self.sender
            .send(command)
            .await
            .map_err(|_| ImpostorError::EngineStopped)
    }
}

/// Spawns the engine task and returns a handle to it.
pub(crate) fn spawn_engine(sessions: SessionManager, rooms: RoomRegistry) -> EngineHandle {
    let (sender, receiver) = mpsc::channel(COMMAND_CHANNEL_SIZE);
    let engine = Engine {
        sessions,
        rooms,
        outbound: HashMap::new(),
        receiver,
    };
    tokio::spawn(engine.run());
    EngineHandle { sender }
}

/// The engine's state. Lives inside its task.
struct Engine {
    sessions: SessionManager,
    rooms: RoomRegistry,
    /// Writer channel of every connected player.
    outbound: HashMap<PlayerId, Outbound>,
    receiver: mpsc::Receiver<EngineCommand>,
}

impl Engine {
    async fn run(mut self) {
        tracing::info!("engine started");
        let mut sweep = tokio::time::interval(SWEEP_INTERVAL);
        sweep.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                command = self.receiver.recv() => {
                    let Some(command) = command else { break };
                    if self.handle(command) {
                        break;
                    }
                }
                _ = sweep.tick() => self.sweep(),
            }
        }

        tracing::info!("engine stopped");
    }

    /// Applies one command. Returns `true` when the engine should stop.
    fn handle(&mut self, command: EngineCommand) -> bool {
        match command {
            EngineCommand::Connect {
                connection,
                outbound,
                reply,
            } => {
                let session = self.sessions.open(connection);
                let welcome = Welcome {
                    player_id: session.player_id,
                    reconnect_token: session.reconnect_token.clone(),
                };
                self.outbound.insert(welcome.player_id, outbound);
                let _ = reply.send(welcome);
            }

            EngineCommand::Resume {
                connection,
                token,
                outbound,
                reply,
            } => {
                let result = self.resume(connection, &token, outbound);
                let _ = reply.send(result);
            }

            EngineCommand::Intent {
                connection,
                request,
            } => self.intent(connection, request),

            EngineCommand::Disconnected { connection } => self.disconnected(connection),

            EngineCommand::Shutdown { reply } => {
                self.shutdown();
                let _ = reply.send(());
                return true;
            }
        }
        false
    }

    fn resume(
        &mut self,
        connection: ConnectionId,
        token: &str,
        outbound: Outbound,
    ) -> Result<Welcome, SessionError> {
        let (session, replaced) = self.sessions.resume(connection, token)?;
        let welcome = Welcome {
            player_id: session.player_id,
            reconnect_token: session.reconnect_token.clone(),
        };

        if let Some(old) = self.outbound.insert(welcome.player_id, outbound) {
            if replaced.is_some() {
                let _ = old.send(Payload::System(SystemMessage::Disconnect {
                    reason: "replaced by a newer connection".into(),
                }));
            }
        }

        // Seats are held during the grace period: hand the current state
        // back to the returning player.
        if let Some(code) = self.rooms.room_of(welcome.player_id).cloned() {
            let mut outbox = Outbox::new();
            if let Err(err) = self.rooms.rejoin_room(welcome.player_id, &code, &mut outbox) {
                tracing::warn!(player_id = %welcome.player_id, %err, "state resend failed");
            }
            self.deliver(outbox);
        }
        Ok(welcome)
    }

    fn intent(&mut self, connection: ConnectionId, request: IntentRequest) {
        let Some(player_id) = self.sessions.player_for(connection) else {
            tracing::warn!(%connection, "intent from a connection without a session");
            return;
        };
        let kind = request.intent.kind();
        let mut outbox = Outbox::new();

        let ack = match self.rooms.dispatch(player_id, request.intent, &mut outbox) {
            Ok(room_code) => request.request_id.map(|id| Ack::success(id, room_code)),
            Err(err) => {
                tracing::debug!(%player_id, intent = kind, %err, "intent rejected");
                request
                    .request_id
                    .map(|id| Ack::failure(id, err.kind(), err.to_string()))
            }
        };

        if let Some(ack) = ack {
            self.send_to(player_id, Payload::Ack(ack));
        }
        self.deliver(outbox);
    }

    fn disconnected(&mut self, connection: ConnectionId) {
        let Some(player_id) = self.sessions.disconnect(connection) else {
            return;
        };
        self.outbound.remove(&player_id);

        if self.sessions.config().reconnect_grace_secs == 0 {
            self.exit(player_id);
            self.sessions.remove(player_id);
        }
    }

    /// Players whose grace period ran out leave their rooms.
    fn sweep(&mut self) {
        for player_id in self.sessions.expire_stale() {
            self.exit(player_id);
        }
        self.sessions.cleanup_expired();
    }

    fn exit(&mut self, player_id: PlayerId) {
        let mut outbox = Outbox::new();
        self.rooms
            .handle_exit(player_id, ExitReason::Disconnected, &mut outbox);
        self.deliver(outbox);
    }

    fn shutdown(&mut self) {
        tracing::info!(rooms = self.rooms.room_count(), "engine shutting down");
        let mut outbox = Outbox::new();
        self.rooms.teardown(&mut outbox);
        self.deliver(outbox);

        for (_, outbound) in self.outbound.drain() {
            let _ = outbound.send(Payload::System(SystemMessage::Disconnect {
                reason: "server shutting down".into(),
            }));
        }
    }

    fn deliver(&self, outbox: Outbox) {
        for delivery in outbox {
            self.send_to(delivery.to, Payload::Event(delivery.event));
        }
    }

    /// Queues a frame for a connected player. Players without a live
    /// connection miss it and catch up on reconnect.
    fn send_to(&self, player_id: PlayerId, payload: Payload) {
        if let Some(outbound) = self.outbound.get(&player_id) {
            if outbound.send(payload).is_err() {
                tracing::debug!(%player_id, "outbound channel closed");
            }
        }
    }
}
