//! InMemory Room Repository 実装
//!
//! ドメイン層が定義する RoomRepository trait の具体的な実装。
//! HashMap をインメモリ DB として使用します。
//!
//! ## 直列化ポイント
//!
//! 各ルームは `Mutex<RoomSession>` を 1 つ持ち、コマンドの適用とイベントの配送は
//! そのロックを保持したまま行います。これにより、同じルームの購読者は全員
//! 同じ順序でイベントを受け取ります。ロックの取得順は「ルーム表 → セッション」です。
//!
//! ## 技術的負債
//!
//! 現在、ドメインモデル（`Room`）を直接ストレージとして使用しています。
//! 永続化する実装を追加する際は DTO への変換層が必要になります。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use groove_shared::protocol::{RoomEvent, ServerMessage};
use tokio::sync::{Mutex, RwLock, mpsc::UnboundedSender};

use crate::{
    domain::{
        ConnectionId, Participant, RepositoryError, Room, RoomChange, RoomId, RoomMutation,
        RoomRepository, Timestamp,
    },
    infrastructure::dto::websocket::{encode, event_for_change, room_message, snapshot},
};

/// Room state plus the outbound channels of its subscribers
struct RoomSession {
    room: Room,
    subscribers: HashMap<ConnectionId, UnboundedSender<String>>,
    /// Set once the room is deleted; late commands see it as missing
    closed: bool,
}

impl RoomSession {
    fn new(room: Room) -> Self {
        Self {
            room,
            subscribers: HashMap::new(),
            closed: false,
        }
    }

    fn broadcast(&mut self, changes: &[RoomChange], except: Option<&ConnectionId>) {
        let now = Timestamp::now();
        for change in changes {
            let message = room_message(&self.room, event_for_change(&self.room, change), now);
            self.send_all(&message, except);
        }
    }

    /// Send to every subscriber, dropping channels whose receiver is gone.
    fn send_all(&mut self, message: &ServerMessage, except: Option<&ConnectionId>) {
        let Some(json) = encode(message) else {
            return;
        };
        let room_id = self.room.id.clone();
        self.subscribers.retain(|connection_id, sender| {
            if except == Some(connection_id) {
                return true;
            }
            if sender.send(json.clone()).is_err() {
                tracing::warn!(
                    "Dropping subscriber '{}' of room '{}': channel closed",
                    connection_id,
                    room_id
                );
                return false;
            }
            true
        });
    }
}

/// インメモリ Room Repository 実装
///
/// ドメイン層の RoomRepository trait を実装します（依存性の逆転）。
#[derive(Default)]
pub struct InMemoryRoomRepository {
    rooms: RwLock<HashMap<RoomId, Arc<Mutex<RoomSession>>>>,
}

impl InMemoryRoomRepository {
    /// 新しい InMemoryRoomRepository を作成
    pub fn new() -> Self {
        Self::default()
    }

    async fn session(&self, room_id: &RoomId) -> Result<Arc<Mutex<RoomSession>>, RepositoryError> {
        self.rooms
            .read()
            .await
            .get(room_id)
            .cloned()
            .ok_or_else(|| RepositoryError::RoomNotFound(room_id.to_string()))
    }
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    async fn create_room(&self, room: Room) -> Result<(), RepositoryError> {
        let mut rooms = self.rooms.write().await;
        if rooms.contains_key(&room.id) {
            return Err(RepositoryError::RoomAlreadyExists(room.id.to_string()));
        }
        rooms.insert(room.id.clone(), Arc::new(Mutex::new(RoomSession::new(room))));
        Ok(())
    }

    async fn join_room(
        &self,
        room_id: &RoomId,
        participant: Participant,
        sender: UnboundedSender<String>,
    ) -> Result<(), RepositoryError> {
        let handle = self.session(room_id).await?;
        let mut session = handle.lock().await;
        if session.closed {
            return Err(RepositoryError::RoomNotFound(room_id.to_string()));
        }

        let connection_id = participant.connection_id.clone();
        let changes = session.room.join(participant)?;

        // The joiner sees the snapshot before anything broadcast after it.
        let message = room_message(
            &session.room,
            RoomEvent::Snapshot(snapshot(&session.room)),
            Timestamp::now(),
        );
        if let Some(json) = encode(&message)
            && sender.send(json).is_err()
        {
            tracing::warn!("Failed to send snapshot of '{}' to '{}'", room_id, connection_id);
        }
        session.subscribers.insert(connection_id.clone(), sender);
        session.broadcast(&changes, Some(&connection_id));
        Ok(())
    }

    async fn leave_room(
        &self,
        room_id: &RoomId,
        connection_id: &ConnectionId,
        now: Timestamp,
    ) -> Result<(), RepositoryError> {
        let handle = self.session(room_id).await?;
        let mut session = handle.lock().await;
        if session.closed {
            return Ok(());
        }
        session.subscribers.remove(connection_id);
        let changes = session.room.leave(connection_id, now);
        session.broadcast(&changes, None);
        Ok(())
    }

    async fn update(
        &self,
        room_id: &RoomId,
        mutation: RoomMutation,
    ) -> Result<(), RepositoryError> {
        let handle = self.session(room_id).await?;
        let mut session = handle.lock().await;
        if session.closed {
            return Err(RepositoryError::RoomNotFound(room_id.to_string()));
        }
        let changes = mutation(&mut session.room)?;
        session.broadcast(&changes, None);
        Ok(())
    }

    async fn delete_room(
        &self,
        room_id: &RoomId,
        connection_id: &ConnectionId,
    ) -> Result<(), RepositoryError> {
        let handle = self.session(room_id).await?;
        {
            let mut session = handle.lock().await;
            if session.closed {
                return Err(RepositoryError::RoomNotFound(room_id.to_string()));
            }
            session.room.delete(connection_id)?;
            let message = room_message(&session.room, RoomEvent::RoomDeleted, Timestamp::now());
            session.send_all(&message, None);
            session.subscribers.clear();
            session.closed = true;
        }

        let mut rooms = self.rooms.write().await;
        if rooms
            .get(room_id)
            .is_some_and(|current| Arc::ptr_eq(current, &handle))
        {
            rooms.remove(room_id);
        }
        Ok(())
    }

    async fn get_room(&self, room_id: &RoomId) -> Result<Room, RepositoryError> {
        let handle = self.session(room_id).await?;
        let session = handle.lock().await;
        if session.closed {
            return Err(RepositoryError::RoomNotFound(room_id.to_string()));
        }
        Ok(session.room.clone())
    }

    async fn list_rooms(&self) -> Vec<Room> {
        let handles: Vec<_> = self.rooms.read().await.values().cloned().collect();
        let mut rooms = Vec::with_capacity(handles.len());
        for handle in handles {
            let session = handle.lock().await;
            if !session.closed {
                rooms.push(session.room.clone());
            }
        }
        rooms.sort_by_key(|room| room.created_at);
        rooms
    }

    async fn remove_idle_rooms(&self, cutoff: Timestamp) -> Vec<RoomId> {
        let mut rooms = self.rooms.write().await;
        let mut idle = Vec::new();
        for (room_id, handle) in rooms.iter() {
            let mut session = handle.lock().await;
            if session.room.is_idle_since(cutoff) {
                session.closed = true;
                idle.push(room_id.clone());
            }
        }
        for room_id in &idle {
            rooms.remove(room_id);
        }
        idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Identity, Profile, RoomError, RoomLimits, RoomSettings, Track};
    use groove_shared::protocol::RoomEnvelope;
    use tokio::sync::mpsc;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - InMemoryRoomRepository のルーム登録・参加・更新・削除
    // - 参加者へのスナップショット送信とイベント配送の順序
    //
    // 【なぜこのテストが必要か】
    // - Repository はルームごとの直列化ポイントであり、配送順の保証はここにしかない
    // - 失敗したコマンドが何も配送しないことを保証する必要がある
    // ========================================

    fn create_test_repository() -> InMemoryRoomRepository {
        InMemoryRoomRepository::new()
    }

    fn room_id() -> RoomId {
        RoomId::new("chill").unwrap()
    }

    fn new_room(created_at: i64) -> Room {
        Room::create(
            room_id(),
            Identity::new("u1").unwrap(),
            RoomSettings::default(),
            RoomLimits::default(),
            Timestamp::new(created_at),
        )
    }

    fn participant(connection: &str, identity: &str) -> Participant {
        Participant::new(
            ConnectionId::new(connection.to_string()),
            Identity::new(identity).unwrap(),
            Profile::new(identity, "#3b82f6").unwrap(),
            Timestamp::new(0),
        )
    }

    fn envelope(rx: &mut mpsc::UnboundedReceiver<String>) -> RoomEnvelope {
        let json = rx.try_recv().expect("expected a message");
        match serde_json::from_str::<ServerMessage>(&json).unwrap() {
            ServerMessage::Room(envelope) => envelope,
            other => panic!("unexpected message: {other:?}"),
        }
    }

    async fn joined_repository() -> (
        InMemoryRoomRepository,
        mpsc::UnboundedReceiver<String>,
        mpsc::UnboundedReceiver<String>,
    ) {
        let repo = create_test_repository();
        repo.create_room(new_room(0)).await.unwrap();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        repo.join_room(&room_id(), participant("c1", "u1"), tx1)
            .await
            .unwrap();
        repo.join_room(&room_id(), participant("c2", "u2"), tx2)
            .await
            .unwrap();
        // drain: c1 snapshot + participants_updated, c2 snapshot
        envelope(&mut rx1);
        envelope(&mut rx1);
        envelope(&mut rx2);
        (repo, rx1, rx2)
    }

    #[tokio::test]
    async fn test_create_room_duplicate_fails() {
        // テスト項目: 同じ ID のルームは 2 つ作成できない
        // given (前提条件):
        let repo = create_test_repository();
        repo.create_room(new_room(0)).await.unwrap();

        // when (操作):
        let result = repo.create_room(new_room(1)).await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(RepositoryError::RoomAlreadyExists("chill".to_string()))
        );
    }

    #[tokio::test]
    async fn test_join_sends_snapshot_then_notifies_others() {
        // テスト項目: 参加者にはスナップショット、既存の参加者には参加者リストが送られる
        // given (前提条件):
        let repo = create_test_repository();
        repo.create_room(new_room(0)).await.unwrap();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        repo.join_room(&room_id(), participant("c1", "u1"), tx1)
            .await
            .unwrap();
        let first = envelope(&mut rx1);
        assert!(matches!(first.event, RoomEvent::Snapshot(_)));

        // when (操作):
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        repo.join_room(&room_id(), participant("c2", "u2"), tx2)
            .await
            .unwrap();

        // then (期待する結果):
        match envelope(&mut rx2).event {
            RoomEvent::Snapshot(snapshot) => assert_eq!(snapshot.participants.len(), 2),
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(rx2.try_recv().is_err());
        match envelope(&mut rx1).event {
            RoomEvent::ParticipantsUpdated(participants) => assert_eq!(participants.len(), 2),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_join_unknown_room_fails() {
        let repo = create_test_repository();
        let (tx, _rx) = mpsc::unbounded_channel();
        let result = repo.join_room(&room_id(), participant("c1", "u1"), tx).await;
        assert_eq!(result, Err(RepositoryError::RoomNotFound("chill".to_string())));
    }

    #[tokio::test]
    async fn test_update_broadcasts_in_order_to_everyone() {
        // テスト項目: 連続した更新は全員に同じ順序で届き、revision は単調増加する
        // given (前提条件):
        let (repo, mut rx1, mut rx2) = joined_repository().await;

        // when (操作):
        for media_id in ["a", "b"] {
            let track = Track::new(media_id, media_id, "", "").unwrap();
            repo.update(
                &room_id(),
                Box::new(move |room: &mut Room| {
                    room.add_to_queue(&ConnectionId::new("c2".to_string()), track)
                        .map(|(_, changes)| changes)
                }),
            )
            .await
            .unwrap();
        }

        // then (期待する結果):
        for rx in [&mut rx1, &mut rx2] {
            let first = envelope(rx);
            let second = envelope(rx);
            assert!(second.revision > first.revision);
            match second.event {
                RoomEvent::QueueUpdated(queue) => {
                    let ids: Vec<_> = queue.iter().map(|e| e.track.media_id.as_str()).collect();
                    assert_eq!(ids, vec!["a", "b"]);
                }
                other => panic!("unexpected event: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_rejected_update_broadcasts_nothing() {
        // テスト項目: 権限エラーになった更新は状態を変えず、何も配送しない
        // given (前提条件):
        let (repo, mut rx1, mut rx2) = joined_repository().await;
        let before = repo.get_room(&room_id()).await.unwrap();

        // when (操作): DJ ではない u2 がシャッフルを試みる
        let result = repo
            .update(
                &room_id(),
                Box::new(|room: &mut Room| {
                    room.shuffle_queue(
                        &ConnectionId::new("c2".to_string()),
                        &mut rand::thread_rng(),
                    )
                }),
            )
            .await;

        // then (期待する結果):
        assert!(matches!(
            result,
            Err(RepositoryError::Room(RoomError::Forbidden { .. }))
        ));
        assert!(rx1.try_recv().is_err());
        assert!(rx2.try_recv().is_err());
        let after = repo.get_room(&room_id()).await.unwrap();
        assert_eq!(after.revision, before.revision);
    }

    #[tokio::test]
    async fn test_leave_notifies_remaining_participants() {
        let (repo, mut rx1, mut rx2) = joined_repository().await;
        repo.leave_room(
            &room_id(),
            &ConnectionId::new("c2".to_string()),
            Timestamp::new(5),
        )
        .await
        .unwrap();
        match envelope(&mut rx1).event {
            RoomEvent::ParticipantsUpdated(participants) => assert_eq!(participants.len(), 1),
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(rx2.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_delete_room_notifies_and_removes() {
        // テスト項目: 作成者がルームを削除すると全員に room_deleted が届き、ルームは消える
        // given (前提条件):
        let (repo, mut rx1, mut rx2) = joined_repository().await;

        // when (操作):
        repo.delete_room(&room_id(), &ConnectionId::new("c1".to_string()))
            .await
            .unwrap();

        // then (期待する結果):
        assert!(envelope(&mut rx1).event.is_terminal());
        assert!(envelope(&mut rx2).event.is_terminal());
        assert!(matches!(
            repo.get_room(&room_id()).await,
            Err(RepositoryError::RoomNotFound(_))
        ));
        assert!(repo.list_rooms().await.is_empty());
    }

    #[tokio::test]
    async fn test_delete_room_requires_creator() {
        let (repo, _rx1, _rx2) = joined_repository().await;
        let result = repo
            .delete_room(&room_id(), &ConnectionId::new("c2".to_string()))
            .await;
        assert!(matches!(
            result,
            Err(RepositoryError::Room(RoomError::Forbidden { .. }))
        ));
        assert!(repo.get_room(&room_id()).await.is_ok());
    }

    #[tokio::test]
    async fn test_remove_idle_rooms() {
        // テスト項目: 参加者がいない状態が続いたルームだけが削除される
        // given (前提条件):
        let repo = create_test_repository();
        repo.create_room(new_room(100)).await.unwrap();
        let busy = Room::create(
            RoomId::new("busy").unwrap(),
            Identity::new("u9").unwrap(),
            RoomSettings::default(),
            RoomLimits::default(),
            Timestamp::new(100),
        );
        repo.create_room(busy).await.unwrap();
        let (tx, _rx) = mpsc::unbounded_channel();
        repo.join_room(&RoomId::new("busy").unwrap(), participant("c9", "u9"), tx)
            .await
            .unwrap();

        // when (操作):
        let removed = repo.remove_idle_rooms(Timestamp::new(200)).await;

        // then (期待する結果):
        assert_eq!(removed, vec![room_id()]);
        let remaining = repo.list_rooms().await;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id.as_str(), "busy");
    }
}
