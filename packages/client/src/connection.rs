//! Scoped WebSocket connection to the coordinator.
//!
//! A [`RoomConnection`] lives exactly as long as the client is viewing a
//! room. Dropping it stops both socket tasks, so no stale reader keeps
//! feeding a room that was already left.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use groove_shared::protocol::{ClientMessage, ServerMessage};
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::error::ClientError;

const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

pub struct RoomConnection {
    outgoing: mpsc::UnboundedSender<ClientMessage>,
    incoming: mpsc::UnboundedReceiver<ServerMessage>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl RoomConnection {
    pub async fn connect(url: &str) -> Result<Self, ClientError> {
        let (stream, _) = connect_async(url).await?;
        tracing::info!("Connected to {}", url);
        let (mut sink, mut source) = stream.split();

        let (outgoing, mut outgoing_rx) = mpsc::unbounded_channel::<ClientMessage>();
        let (incoming_tx, incoming) = mpsc::unbounded_channel::<ServerMessage>();

        // Forward commands to the socket
        let writer = tokio::spawn(async move {
            while let Some(message) = outgoing_rx.recv().await {
                let json = match serde_json::to_string(&message) {
                    Ok(json) => json,
                    Err(e) => {
                        tracing::error!("Failed to encode {}: {}", message.name(), e);
                        continue;
                    }
                };
                tracing::debug!("-> {}", json);
                if let Err(e) = sink.send(Message::Text(json.into())).await {
                    tracing::warn!("Send failed: {}", e);
                    break;
                }
            }
            let _ = sink.close().await;
        });

        // Decode server messages in arrival order
        let reader = tokio::spawn(async move {
            while let Some(frame) = source.next().await {
                let text = match frame {
                    Ok(Message::Text(text)) => text,
                    Ok(Message::Close(_)) => break,
                    Ok(_) => continue,
                    Err(e) => {
                        tracing::warn!("Receive failed: {}", e);
                        break;
                    }
                };
                tracing::debug!("<- {}", text.as_str());
                match serde_json::from_str::<ServerMessage>(text.as_str()) {
                    Ok(message) => {
                        if incoming_tx.send(message).is_err() {
                            break;
                        }
                    }
                    Err(e) => tracing::warn!("Dropping undecodable message: {}", e),
                }
            }
        });

        Ok(Self {
            outgoing,
            incoming,
            reader,
            writer,
        })
    }

    pub fn send(&self, message: ClientMessage) -> Result<(), ClientError> {
        self.outgoing
            .send(message)
            .map_err(|_| ClientError::closed())
    }

    /// Flush queued commands, then close the socket.
    pub async fn close(&mut self) {
        let (closed, _) = mpsc::unbounded_channel();
        drop(std::mem::replace(&mut self.outgoing, closed));
        if tokio::time::timeout(CLOSE_TIMEOUT, &mut self.writer)
            .await
            .is_err()
        {
            tracing::debug!("Writer did not finish in time");
        }
    }

    /// Next message; `None` once the connection is gone.
    pub async fn recv(&mut self) -> Option<ServerMessage> {
        self.incoming.recv().await
    }
}

impl Drop for RoomConnection {
    fn drop(&mut self) {
        self.reader.abort();
        self.writer.abort();
    }
}
