//! End-to-end tests: real WebSocket clients against a running server.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use impostor::prelude::*;
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Helpers
// =========================================================================

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

const RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// Starts a server on a random port and returns the address.
async fn start_server() -> String {
    start_with(ImpostorServer::builder()).await
}

async fn start_with(builder: ImpostorServerBuilder) -> String {
    let server = builder
        .bind("127.0.0.1:0")
        .seed(7)
        .build()
        .await
        .expect("server should build");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    // Give the accept loop a moment to start.
    tokio::time::sleep(Duration::from_millis(10)).await;
    addr
}

async fn connect(addr: &str) -> ClientWs {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("should connect");
    ws
}

async fn send(ws: &mut ClientWs, payload: Payload) {
    let envelope = Envelope {
        seq: 0,
        timestamp: 0,
        payload,
    };
    let text = serde_json::to_string(&envelope).expect("encode");
    ws.send(Message::Text(text.into())).await.expect("send");
}

/// Next envelope from the server, skipping control frames.
async fn next_envelope(ws: &mut ClientWs) -> Envelope {
    loop {
        let msg = tokio::time::timeout(RECV_TIMEOUT, ws.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("stream ended")
            .expect("recv");
        match msg {
            Message::Text(_) | Message::Binary(_) => {
                return serde_json::from_slice(&msg.into_data()).expect("decode");
            }
            Message::Close(frame) => panic!("connection closed: {frame:?}"),
            _ => continue,
        }
    }
}

/// Reads frames until `pick` accepts one.
async fn recv_until<T>(ws: &mut ClientWs, mut pick: impl FnMut(Payload) -> Option<T>) -> T {
    loop {
        if let Some(found) = pick(next_envelope(ws).await.payload) {
            return found;
        }
    }
}

async fn hello(ws: &mut ClientWs, version: u32, reconnect_token: Option<String>) -> Envelope {
    send(
        ws,
        Payload::System(SystemMessage::Hello {
            version,
            reconnect_token,
        }),
    )
    .await;
    next_envelope(ws).await
}

/// Connects and completes the handshake. Returns the socket, the issued
/// player id, and the reconnect token.
async fn join_server(addr: &str) -> (ClientWs, PlayerId, String) {
    let mut ws = connect(addr).await;
    match hello(&mut ws, PROTOCOL_VERSION, None).await.payload {
        Payload::System(SystemMessage::Welcome {
            player_id,
            reconnect_token,
            ..
        }) => (ws, player_id, reconnect_token),
        other => panic!("expected Welcome, got {other:?}"),
    }
}

/// Sends an intent with a request id and waits for its ack.
async fn request(ws: &mut ClientWs, request_id: u64, intent: Intent) -> Ack {
    send(
        ws,
        Payload::Intent(IntentRequest {
            request_id: Some(request_id),
            intent,
        }),
    )
    .await;
    recv_until(ws, |payload| match payload {
        Payload::Ack(ack) if ack.request_id == request_id => Some(ack),
        _ => None,
    })
    .await
}

async fn next_event(ws: &mut ClientWs) -> ServerEvent {
    recv_until(ws, |payload| match payload {
        Payload::Event(event) => Some(event),
        _ => None,
    })
    .await
}

/// Three connected players in one lobby. The first is the host.
async fn lobby_of_three(addr: &str) -> (RoomCode, Vec<(ClientWs, PlayerId, String)>) {
    let mut host = join_server(addr).await;
    let ack = request(&mut host.0, 1, Intent::CreateRoom { name: "ana".into() }).await;
    let code = ack.room_code.expect("create ack carries the room code");

    let mut players = vec![host];
    for name in ["bruno", "carla"] {
        let mut player = join_server(addr).await;
        let ack = request(
            &mut player.0,
            1,
            Intent::JoinRoom {
                room_code: code.clone(),
                name: name.into(),
            },
        )
        .await;
        assert!(ack.ok, "join failed: {ack:?}");
        players.push(player);
    }
    (code, players)
}

fn assert_closed(result: Result<Option<Result<Message, impl std::fmt::Debug>>, impl std::fmt::Debug>) {
    match result {
        Ok(Some(Ok(Message::Close(_)))) | Ok(None) => {}
        Ok(Some(Err(_))) => {}
        other => panic!("expected close, got {other:?}"),
    }
}

// =========================================================================
// Handshake
// =========================================================================

#[tokio::test]
async fn test_hello_fresh_connection_gets_identity() {
    let addr = start_server().await;

    let (_ws1, id1, token1) = join_server(&addr).await;
    let (_ws2, id2, token2) = join_server(&addr).await;

    assert_ne!(id1, id2);
    assert!(!token1.is_empty());
    assert_ne!(token1, token2);
}

#[tokio::test]
async fn test_hello_version_mismatch_returns_400() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    match hello(&mut ws, 999, None).await.payload {
        Payload::System(SystemMessage::Error { code, .. }) => assert_eq!(code, 400),
        other => panic!("expected Error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_hello_not_first_message_returns_400() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    send(&mut ws, Payload::System(SystemMessage::Heartbeat { client_time: 0 })).await;

    match next_envelope(&mut ws).await.payload {
        Payload::System(SystemMessage::Error { code, .. }) => assert_eq!(code, 400),
        other => panic!("expected Error 400, got {other:?}"),
    }
}

#[tokio::test]
async fn test_hello_unknown_token_returns_401() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    match hello(&mut ws, PROTOCOL_VERSION, Some("forged".into())).await.payload {
        Payload::System(SystemMessage::Error { code, .. }) => assert_eq!(code, 401),
        other => panic!("expected Error 401, got {other:?}"),
    }
}

// =========================================================================
// Connection plumbing
// =========================================================================

#[tokio::test]
async fn test_heartbeat_echoes_client_time() {
    let addr = start_server().await;
    let (mut ws, _, _) = join_server(&addr).await;

    send(&mut ws, Payload::System(SystemMessage::Heartbeat { client_time: 12345 })).await;

    match next_envelope(&mut ws).await.payload {
        Payload::System(SystemMessage::HeartbeatAck { client_time, .. }) => {
            assert_eq!(client_time, 12345);
        }
        other => panic!("expected HeartbeatAck, got {other:?}"),
    }
}

#[tokio::test]
async fn test_invalid_envelope_ignored() {
    let addr = start_server().await;
    let (mut ws, _, _) = join_server(&addr).await;

    ws.send(Message::Text("not json".into())).await.expect("send");
    send(&mut ws, Payload::System(SystemMessage::Heartbeat { client_time: 999 })).await;

    let env = next_envelope(&mut ws).await;
    assert!(matches!(
        env.payload,
        Payload::System(SystemMessage::HeartbeatAck { client_time: 999, .. })
    ));
}

#[tokio::test]
async fn test_disconnect_closes_connection() {
    let addr = start_server().await;
    let (mut ws, _, _) = join_server(&addr).await;

    send(
        &mut ws,
        Payload::System(SystemMessage::Disconnect {
            reason: "bye".into(),
        }),
    )
    .await;

    assert_closed(tokio::time::timeout(RECV_TIMEOUT, ws.next()).await);
}

#[tokio::test]
async fn test_idle_connection_is_closed() {
    let addr = start_with(ImpostorServer::builder().idle_timeout(Duration::from_millis(200))).await;
    let (mut ws, _, _) = join_server(&addr).await;

    assert_closed(tokio::time::timeout(RECV_TIMEOUT, ws.next()).await);
}

#[tokio::test]
async fn test_outbound_seq_increases() {
    let addr = start_server().await;
    let (mut ws, _, _) = join_server(&addr).await;

    send(&mut ws, Payload::System(SystemMessage::Heartbeat { client_time: 1 })).await;
    send(&mut ws, Payload::System(SystemMessage::Heartbeat { client_time: 2 })).await;

    let first = next_envelope(&mut ws).await;
    let second = next_envelope(&mut ws).await;
    assert!(second.seq > first.seq);
}

// =========================================================================
// Intents
// =========================================================================

#[tokio::test]
async fn test_create_room_ack_then_room_updated() {
    let addr = start_server().await;
    let (mut ws, player_id, _) = join_server(&addr).await;

    let ack = request(&mut ws, 1, Intent::CreateRoom { name: "  ana  ".into() }).await;
    assert!(ack.ok);
    let code = ack.room_code.expect("room code");
    assert_eq!(code.as_str().len(), 5);

    match next_event(&mut ws).await {
        ServerEvent::RoomUpdated { room } => {
            assert_eq!(room.code, code);
            assert_eq!(room.host, player_id);
            assert_eq!(room.phase, Phase::Lobby);
            assert_eq!(room.members[0].name, "ana");
        }
        other => panic!("expected RoomUpdated, got {other:?}"),
    }
}

#[tokio::test]
async fn test_join_unknown_room_ack_not_found() {
    let addr = start_server().await;
    let (mut ws, _, _) = join_server(&addr).await;

    let ack = request(
        &mut ws,
        9,
        Intent::JoinRoom {
            room_code: RoomCode::new("ZZZZZ"),
            name: "ana".into(),
        },
    )
    .await;

    assert!(!ack.ok);
    assert_eq!(ack.error.expect("error").kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_start_game_non_host_ack_unauthorized() {
    let addr = start_server().await;
    let (code, mut players) = lobby_of_three(&addr).await;

    let ack = request(
        &mut players[1].0,
        2,
        Intent::StartGame {
            room_code: code,
            settings: GameSettings::default(),
        },
    )
    .await;

    assert!(!ack.ok);
    assert_eq!(ack.error.expect("error").kind, ErrorKind::Unauthorized);
}

#[tokio::test]
async fn test_start_game_each_player_gets_own_view() {
    let addr = start_server().await;
    let (code, mut players) = lobby_of_three(&addr).await;

    let ack = request(
        &mut players[0].0,
        2,
        Intent::StartGame {
            room_code: code.clone(),
            settings: GameSettings::default(),
        },
    )
    .await;
    assert!(ack.ok, "start failed: {ack:?}");

    let mut impostors = 0;
    let mut words = Vec::new();
    for (ws, player_id, _) in &mut players {
        let view = recv_until(ws, |payload| match payload {
            Payload::Event(ServerEvent::GameUpdate { view }) => Some(view),
            _ => None,
        })
        .await;

        assert_eq!(view.room_code, code);
        assert_eq!(view.phase, Phase::Reveal);
        assert_eq!(view.round, 1);
        assert_eq!(view.me.id, *player_id);
        assert!(matches!(view.roster, Roster::Pending(_)));
        if view.me.is_impostor {
            impostors += 1;
            assert!(view.me.word.is_none());
        } else {
            words.push(view.me.word.expect("civilians get a word"));
        }
    }

    assert_eq!(impostors, 1);
    assert_eq!(words.len(), 2);
    assert_eq!(words[0], words[1]);
}

#[tokio::test]
async fn test_intent_without_request_id_gets_no_ack() {
    let addr = start_server().await;
    let (mut ws, _, _) = join_server(&addr).await;

    send(
        &mut ws,
        Payload::Intent(IntentRequest {
            request_id: None,
            intent: Intent::CreateRoom { name: "ana".into() },
        }),
    )
    .await;

    // The first frame back is the room push, not an ack.
    match next_envelope(&mut ws).await.payload {
        Payload::Event(ServerEvent::RoomUpdated { .. }) => {}
        other => panic!("expected RoomUpdated, got {other:?}"),
    }
}

// =========================================================================
// Exits and reconnection
// =========================================================================

#[tokio::test]
async fn test_drop_without_grace_closes_small_room() {
    let addr = start_server().await;
    let (code, mut players) = lobby_of_three(&addr).await;

    let (leaver, leaver_id, _) = players.pop().expect("three players");
    drop(leaver);

    let (ws, _, _) = &mut players[0];
    let left = recv_until(ws, |payload| match payload {
        Payload::Event(ServerEvent::PlayerLeft { player_id, reason, .. }) => {
            Some((player_id, reason))
        }
        _ => None,
    })
    .await;
    assert_eq!(left, (leaver_id, ExitReason::Disconnected));

    match next_event(ws).await {
        ServerEvent::ForceLobby { reason } => assert_eq!(reason, "not-enough-players"),
        other => panic!("expected ForceLobby, got {other:?}"),
    }

    // The room is gone.
    let ack = request(ws, 5, Intent::RejoinRoom { room_code: code }).await;
    assert_eq!(ack.error.expect("error").kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_reconnect_within_grace_restores_seat() {
    let addr = start_with(ImpostorServer::builder().session_config(SessionConfig {
        reconnect_grace_secs: 30,
    }))
    .await;
    let (code, mut players) = lobby_of_three(&addr).await;

    let (leaver, leaver_id, token) = players.pop().expect("three players");
    drop(leaver);
    tokio::time::sleep(Duration::from_millis(50)).await;

    let mut ws = connect(&addr).await;
    match hello(&mut ws, PROTOCOL_VERSION, Some(token)).await.payload {
        Payload::System(SystemMessage::Welcome { player_id, .. }) => {
            assert_eq!(player_id, leaver_id);
        }
        other => panic!("expected Welcome, got {other:?}"),
    }

    // The held seat comes back with the current room state.
    match next_event(&mut ws).await {
        ServerEvent::RoomUpdated { room } => {
            assert_eq!(room.code, code);
            assert_eq!(room.members.len(), 3);
        }
        other => panic!("expected RoomUpdated, got {other:?}"),
    }
}

#[tokio::test]
async fn test_reconnect_replaces_live_connection() {
    let addr = start_with(ImpostorServer::builder().session_config(SessionConfig {
        reconnect_grace_secs: 30,
    }))
    .await;
    let (mut old, player_id, token) = join_server(&addr).await;

    let mut new = connect(&addr).await;
    match hello(&mut new, PROTOCOL_VERSION, Some(token)).await.payload {
        Payload::System(SystemMessage::Welcome { player_id: resumed, .. }) => {
            assert_eq!(resumed, player_id);
        }
        other => panic!("expected Welcome, got {other:?}"),
    }

    match next_envelope(&mut old).await.payload {
        Payload::System(SystemMessage::Disconnect { .. }) => {}
        other => panic!("expected Disconnect, got {other:?}"),
    }
}

// =========================================================================
// Shutdown
// =========================================================================

#[tokio::test]
async fn test_run_until_sends_everyone_home() {
    let server = ImpostorServer::builder()
        .bind("127.0.0.1:0")
        .build()
        .await
        .expect("server should build");
    let addr = server.local_addr().expect("local addr").to_string();

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let running = tokio::spawn(server.run_until(async {
        let _ = stop_rx.await;
    }));
    tokio::time::sleep(Duration::from_millis(10)).await;

    let (mut ws, _, _) = join_server(&addr).await;
    let ack = request(&mut ws, 1, Intent::CreateRoom { name: "ana".into() }).await;
    assert!(ack.ok);
    let _ = next_event(&mut ws).await;

    stop_tx.send(()).expect("server still running");

    match next_event(&mut ws).await {
        ServerEvent::ForceLobby { reason } => assert_eq!(reason, "server-shutdown"),
        other => panic!("expected ForceLobby, got {other:?}"),
    }
    match next_envelope(&mut ws).await.payload {
        Payload::System(SystemMessage::Disconnect { .. }) => {}
        other => panic!("expected Disconnect, got {other:?}"),
    }

    running
        .await
        .expect("server task")
        .expect("clean shutdown");
}
