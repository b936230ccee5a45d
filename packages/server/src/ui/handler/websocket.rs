//! WebSocket connection handlers.

use std::{collections::HashSet, sync::Arc};

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::{Mutex, mpsc};

use crate::{
    domain::{ConnectionId, ConnectionIdFactory, Identity},
    infrastructure::dto::websocket::encode,
    ui::{
        handler::command::ConnectionContext,
        state::{AppState, ConnectQuery},
    },
};

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    // Convert String -> Identity (Domain Model)
    let identity = match Identity::new(&query.identity) {
        Ok(identity) => identity,
        Err(e) => {
            tracing::warn!("Invalid identity '{}': {}", query.identity, e);
            return Err(StatusCode::BAD_REQUEST);
        }
    };

    let connection_id = ConnectionIdFactory::generate();
    tracing::info!("Connection '{}' accepted for '{}'", connection_id, identity);
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, connection_id, identity)))
}

async fn handle_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    connection_id: ConnectionId,
    identity: Identity,
) {
    let (mut sender, mut receiver) = socket.split();

    // Room broadcasts and unicast replies share this channel, so one room's
    // events reach the socket in the order the room produced them.
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    let context = Arc::new(ConnectionContext {
        state,
        connection_id: connection_id.clone(),
        identity,
        sender: tx.clone(),
        joined_rooms: Arc::new(Mutex::new(HashSet::new())),
    });

    // Spawn a task to receive commands from this client
    let recv_context = context.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::error!("WebSocket error on '{}': {}", recv_context.connection_id, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    let Some(reply) = recv_context.handle_text(text.as_str()).await else {
                        continue;
                    };
                    if let Some(json) = encode(&reply)
                        && tx.send(json).is_err()
                    {
                        break;
                    }
                }
                Message::Ping(_) => {
                    tracing::debug!("Received ping");
                    // Ping/pong is handled automatically by the WebSocket protocol
                }
                Message::Close(_) => {
                    tracing::info!("Connection '{}' requested close", recv_context.connection_id);
                    break;
                }
                _ => {}
            }
        }
    });

    // Spawn a task to forward queued messages to this client
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    context.leave_all().await;
    tracing::info!("Connection '{}' closed", connection_id);
}
