//! Test fixtures for integration tests.
//!
//! Starts a real server on an ephemeral port and offers small WebSocket helpers.

#![allow(dead_code)]

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use groove_server::{ServerConfig, serve};
use groove_shared::protocol::{ClientMessage, ProfileDto, RoomEnvelope, ServerMessage};
use tokio::{net::TcpListener, sync::oneshot, task::JoinHandle};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

pub type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Test server that shuts down when dropped
pub struct TestServer {
    addr: std::net::SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_with(ServerConfig::default()).await
    }

    pub async fn start_with(config: ServerConfig) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local address");
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            let shutdown = async {
                let _ = shutdown_rx.await;
            };
            serve(listener, &config, shutdown)
                .await
                .expect("Test server failed");
        });

        Self {
            addr,
            shutdown: Some(shutdown_tx),
            handle,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn ws_url(&self, identity: &str) -> String {
        format!("ws://{}/ws?identity={}", self.addr, identity)
    }

    pub async fn connect(&self, identity: &str) -> WsStream {
        let (stream, _) = connect_async(self.ws_url(identity))
            .await
            .expect("Failed to connect WebSocket");
        stream
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.handle.abort();
    }
}

pub async fn send(ws: &mut WsStream, msg: &ClientMessage) {
    let json = serde_json::to_string(msg).expect("Failed to encode command");
    ws.send(Message::Text(json.into()))
        .await
        .expect("Failed to send command");
}

/// Next server message, skipping control frames
pub async fn recv(ws: &mut WsStream) -> ServerMessage {
    loop {
        let frame = tokio::time::timeout(RECV_TIMEOUT, ws.next())
            .await
            .expect("Timed out waiting for server message")
            .expect("Stream ended")
            .expect("WebSocket error");
        if let Message::Text(text) = frame {
            return serde_json::from_str(text.as_str()).expect("Failed to decode server message");
        }
    }
}

pub async fn recv_envelope(ws: &mut WsStream) -> RoomEnvelope {
    match recv(ws).await {
        ServerMessage::Room(envelope) => envelope,
        other => panic!("expected room envelope, got {other:?}"),
    }
}

/// Asserts that nothing arrives within `wait`
pub async fn expect_silence(ws: &mut WsStream, wait: Duration) {
    if let Ok(Some(Ok(Message::Text(text)))) = tokio::time::timeout(wait, ws.next()).await {
        panic!("unexpected message: {text}");
    }
}

pub fn profile(name: &str) -> ProfileDto {
    ProfileDto {
        display_name: name.to_string(),
        color: "#3b82f6".to_string(),
    }
}

pub async fn create_room(ws: &mut WsStream, room_id: &str) {
    send(
        ws,
        &ClientMessage::CreateRoom {
            room_id: room_id.to_string(),
            config: Default::default(),
        },
    )
    .await;
    match recv(ws).await {
        ServerMessage::RoomCreated { room_id: created } => assert_eq!(created, room_id),
        other => panic!("expected room_created, got {other:?}"),
    }
}

/// Join and return the snapshot envelope
pub async fn join_room(ws: &mut WsStream, room_id: &str, identity: &str) -> RoomEnvelope {
    send(
        ws,
        &ClientMessage::JoinRoom {
            room_id: room_id.to_string(),
            identity: identity.to_string(),
            profile: profile(identity),
        },
    )
    .await;
    recv_envelope(ws).await
}
