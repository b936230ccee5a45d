//! UseCase: リアクション送信
//!
//! リアクションは状態を変えずに配送されるだけです（revision も進みません）。

use std::sync::Arc;

use crate::domain::{ConnectionId, Emoji, Room, RoomId, RoomRepository};

use super::error::CommandError;

/// リアクション送信のユースケース
pub struct SendReactionUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RoomRepository>,
}

impl SendReactionUseCase {
    /// 新しい SendReactionUseCase を作成
    pub fn new(repository: Arc<dyn RoomRepository>) -> Self {
        Self { repository }
    }

    pub async fn execute(
        &self,
        connection_id: ConnectionId,
        room_id: &RoomId,
        emoji: Emoji,
    ) -> Result<(), CommandError> {
        self.repository
            .update(
                room_id,
                Box::new(move |room: &mut Room| room.react(&connection_id, emoji)),
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecase::test_support::TestRoom;
    use groove_shared::protocol::RoomEvent;

    #[tokio::test]
    async fn test_reaction_is_broadcast_without_state_change() {
        // テスト項目: リアクションは全員に届くが revision は変わらない
        // given (前提条件):
        let mut test_room = TestRoom::new().await;
        let usecase = SendReactionUseCase::new(test_room.repository.clone());
        let revision = test_room.room().await.revision;

        // when (操作):
        usecase
            .execute(
                test_room.creator.clone(),
                &test_room.room_id,
                Emoji::new("🎉").unwrap(),
            )
            .await
            .unwrap();

        // then (期待する結果):
        let events = test_room.listener_events();
        match &events[..] {
            [envelope] => {
                assert_eq!(envelope.revision, revision);
                match &envelope.event {
                    RoomEvent::Reaction(reaction) => {
                        assert_eq!(reaction.emoji, "🎉");
                        assert_eq!(reaction.display_name, "u1");
                    }
                    other => panic!("unexpected event: {other:?}"),
                }
            }
            other => panic!("unexpected events: {other:?}"),
        }
        assert_eq!(test_room.room().await.revision, revision);
    }
}
