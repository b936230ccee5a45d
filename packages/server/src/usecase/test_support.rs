//! UseCase テスト用のヘルパー
//!
//! ルーム "chill" を作成し、作成者 u1（c1）とリスナー u2（c2）が参加した状態を用意します。

use std::sync::Arc;

use groove_shared::protocol::{RoomEnvelope, ServerMessage};
use tokio::sync::mpsc::{self, UnboundedReceiver};

use crate::{
    domain::{
        ConnectionId, Identity, Participant, Profile, Room, RoomId, RoomLimits, RoomRepository,
        RoomSettings, Timestamp, Track,
    },
    infrastructure::repository::InMemoryRoomRepository,
};

pub struct TestRoom {
    pub repository: Arc<InMemoryRoomRepository>,
    pub room_id: RoomId,
    pub creator: ConnectionId,
    pub listener: ConnectionId,
    pub creator_rx: UnboundedReceiver<String>,
    pub listener_rx: UnboundedReceiver<String>,
}

impl TestRoom {
    pub async fn new() -> Self {
        let repository = Arc::new(InMemoryRoomRepository::new());
        let room_id = RoomId::new("chill").unwrap();
        repository
            .create_room(Room::create(
                room_id.clone(),
                Identity::new("u1").unwrap(),
                RoomSettings::default(),
                RoomLimits::default(),
                Timestamp::new(0),
            ))
            .await
            .unwrap();

        let (creator_tx, creator_rx) = mpsc::unbounded_channel();
        let (listener_tx, listener_rx) = mpsc::unbounded_channel();
        let creator = ConnectionId::new("c1".to_string());
        let listener = ConnectionId::new("c2".to_string());
        for (connection_id, identity, tx) in [
            (creator.clone(), "u1", creator_tx),
            (listener.clone(), "u2", listener_tx),
        ] {
            repository
                .join_room(
                    &room_id,
                    Participant::new(
                        connection_id,
                        Identity::new(identity).unwrap(),
                        Profile::new(identity, "#3b82f6").unwrap(),
                        Timestamp::new(0),
                    ),
                    tx,
                )
                .await
                .unwrap();
        }

        let mut test_room = Self {
            repository,
            room_id,
            creator,
            listener,
            creator_rx,
            listener_rx,
        };
        test_room.drain();
        test_room
    }

    pub async fn room(&self) -> Room {
        self.repository.get_room(&self.room_id).await.unwrap()
    }

    /// Room envelopes delivered to the listener since the last call
    pub fn listener_events(&mut self) -> Vec<RoomEnvelope> {
        let mut envelopes = Vec::new();
        while let Ok(json) = self.listener_rx.try_recv() {
            if let ServerMessage::Room(envelope) = serde_json::from_str(&json).unwrap() {
                envelopes.push(envelope);
            }
        }
        envelopes
    }

    pub fn drain(&mut self) {
        while self.creator_rx.try_recv().is_ok() {}
        while self.listener_rx.try_recv().is_ok() {}
    }
}

pub fn track(media_id: &str) -> Track {
    Track::new(media_id, &format!("Track {media_id}"), "Artist", "").unwrap()
}
