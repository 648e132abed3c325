//! Per-connection handler: handshake, writer task, and frame routing.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Receive Hello → validate version
//!   2. Fresh identity or resume by reconnect token
//!   3. Send Welcome → player is connected
//!   4. Spawn the writer task that drains the player's outbound channel
//!   5. Loop: receive envelopes → heartbeat, disconnect, or intent

use std::sync::Arc;
use std::time::Duration;

use impostor_protocol::{Codec, Envelope, Payload, ProtocolError, SystemMessage};
use impostor_transport::{Connection, ConnectionId, WebSocketConnection};
use tokio::sync::mpsc;

use crate::ImpostorError;
use crate::engine::{EngineHandle, Welcome};
use crate::server::{PROTOCOL_VERSION, ServerState};

/// How long a fresh connection has to send its Hello.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Drop guard that reports the connection as gone when the handler exits.
///
/// This ensures cleanup happens even if the handler panics. Since `Drop`
/// is synchronous, we spawn a fire-and-forget task for the engine call.
struct ConnectionGuard {
    connection: ConnectionId,
    engine: EngineHandle,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        let connection = self.connection;
        let engine = self.engine.clone();
        tokio::spawn(async move {
            let _ = engine.disconnected(connection).await;
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), ImpostorError> {
    let conn_id = conn.id();
    let conn = Arc::new(conn);
    tracing::debug!(%conn_id, "handling new connection");

    // --- Step 1: Handshake ---
    let reconnect_token = perform_handshake(&conn, &state).await?;

    // --- Step 2: Identity ---
    let (tx, rx) = mpsc::unbounded_channel();
    let welcome = match reconnect_token {
        Some(token) => match state.engine.resume(conn_id, token, tx.clone()).await {
            Ok(welcome) => welcome,
            Err(e) => {
                if matches!(e, ImpostorError::Session(_)) {
                    send_error(&conn, &state, 401, &e.to_string()).await?;
                }
                return Err(e);
            }
        },
        None => state.engine.connect(conn_id, tx.clone()).await?,
    };
    let player_id = welcome.player_id;

    // The engine now knows this connection; from here on it must hear
    // about the close.
    let _guard = ConnectionGuard {
        connection: conn_id,
        engine: state.engine.clone(),
    };
    send_welcome(&conn, &state, welcome).await?;
    tracing::info!(%conn_id, %player_id, "player connected");

    // --- Step 3: Writer ---
    tokio::spawn(write_outbound(Arc::clone(&conn), Arc::clone(&state), rx));

    // --- Step 4: Read loop ---
    loop {
        let data = match tokio::time::timeout(state.idle_timeout, conn.recv()).await {
            Ok(Ok(Some(data))) => data,
            Ok(Ok(None)) => {
                tracing::info!(%player_id, "connection closed cleanly");
                break;
            }
            Ok(Err(e)) => {
                tracing::debug!(%player_id, error = %e, "recv error");
                break;
            }
            Err(_) => {
                tracing::info!(%player_id, "connection timed out");
                break;
            }
        };

        let envelope: Envelope = match state.codec.decode(&data) {
            Ok(env) => env,
            Err(e) => {
                tracing::debug!(%player_id, error = %e, "failed to decode envelope");
                continue;
            }
        };

        match envelope.payload {
            Payload::System(SystemMessage::Heartbeat { client_time }) => {
                let _ = tx.send(Payload::System(SystemMessage::HeartbeatAck {
                    client_time,
                    server_time: state.now_millis(),
                }));
            }
            Payload::System(SystemMessage::Disconnect { reason }) => {
                tracing::info!(%player_id, %reason, "client disconnected");
                break;
            }
            Payload::Intent(request) => {
                if state.engine.intent(conn_id, request).await.is_err() {
                    break;
                }
            }
            _ => {
                tracing::debug!(%player_id, "ignoring unexpected frame");
            }
        }
    }

    let _ = conn.close().await;
    // _guard drops here → engine learns the connection is gone.
    Ok(())
}

/// Waits for the Hello frame and validates it.
///
/// Returns the reconnect token, if the client presented one.
async fn perform_handshake<C: Codec>(
    conn: &WebSocketConnection,
    state: &ServerState<C>,
) -> Result<Option<String>, ImpostorError> {
    let data = match tokio::time::timeout(HANDSHAKE_TIMEOUT, conn.recv()).await {
        Ok(Ok(Some(data))) => data,
        Ok(Ok(None)) => {
            return Err(ProtocolError::InvalidMessage("connection closed before handshake".into()).into());
        }
        Ok(Err(e)) => return Err(ImpostorError::Transport(e)),
        Err(_) => {
            return Err(ProtocolError::InvalidMessage("handshake timed out".into()).into());
        }
    };

    let envelope: Envelope = match state.codec.decode(&data) {
        Ok(envelope) => envelope,
        Err(e) => {
            send_error(conn, state, 400, "malformed frame").await?;
            return Err(e.into());
        }
    };

    let (version, reconnect_token) = match envelope.payload {
        Payload::System(SystemMessage::Hello {
            version,
            reconnect_token,
        }) => (version, reconnect_token),
        _ => {
            send_error(conn, state, 400, "expected Hello").await?;
            return Err(ProtocolError::InvalidMessage("first message must be Hello".into()).into());
        }
    };

    if version != PROTOCOL_VERSION {
        send_error(
            conn,
            state,
            400,
            &format!("version mismatch: expected {PROTOCOL_VERSION}, got {version}"),
        )
        .await?;
        return Err(ProtocolError::InvalidMessage("protocol version mismatch".into()).into());
    }

    Ok(reconnect_token.filter(|token| !token.is_empty()))
}

async fn send_welcome<C: Codec>(
    conn: &WebSocketConnection,
    state: &ServerState<C>,
    welcome: Welcome,
) -> Result<(), ImpostorError> {
    let envelope = Envelope {
        seq: 0,
        timestamp: state.now_millis(),
        payload: Payload::System(SystemMessage::Welcome {
            player_id: welcome.player_id,
            reconnect_token: welcome.reconnect_token,
            server_time: state.now_millis(),
        }),
    };
    let bytes = state.codec.encode(&envelope)?;
    conn.send(&bytes).await?;
    Ok(())
}

/// Drains one player's outbound channel onto the socket.
///
/// Owns the sequence counter, so frames from the engine and heartbeat
/// replies share one ordering. A `Disconnect` is the last frame sent.
async fn write_outbound<C: Codec>(
    conn: Arc<WebSocketConnection>,
    state: Arc<ServerState<C>>,
    mut rx: mpsc::UnboundedReceiver<Payload>,
) {
    let mut seq: u64 = 1;

    while let Some(payload) = rx.recv().await {
        let closing = matches!(payload, Payload::System(SystemMessage::Disconnect { .. }));
        let envelope = Envelope {
            seq: next_seq(&mut seq),
            timestamp: state.now_millis(),
            payload,
        };

        let bytes = match state.codec.encode(&envelope) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(error = %e, "failed to encode envelope");
                continue;
            }
        };
        if let Err(e) = conn.send(&bytes).await {
            tracing::debug!(conn_id = %conn.id(), error = %e, "send failed");
            break;
        }

        if closing {
            let _ = conn.close().await;
            break;
        }
    }
}

/// Sends a SystemMessage::Error envelope to the client.
async fn send_error<C: Codec>(
    conn: &WebSocketConnection,
    state: &ServerState<C>,
    code: u16,
    message: &str,
) -> Result<(), ImpostorError> {
    let envelope = Envelope {
        seq: 0,
        timestamp: state.now_millis(),
        payload: Payload::System(SystemMessage::Error {
            code,
            message: message.to_string(),
        }),
    };
    let bytes = state.codec.encode(&envelope)?;
    conn.send(&bytes).await?;
    Ok(())
}

/// Increments and returns the next sequence number.
fn next_seq(seq: &mut u64) -> u64 {
    let current = *seq;
    *seq += 1;
    current
}
