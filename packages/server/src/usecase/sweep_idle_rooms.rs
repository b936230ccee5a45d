//! UseCase: 空きルームの掃除
//!
//! 参加者がいない状態が保持期間を超えたルームを削除します。
//! 保持期間 0 は無効（何も削除しない）を意味します。

use std::{sync::Arc, time::Duration};

use crate::domain::{RoomId, RoomRepository, Timestamp};

/// 空きルーム掃除のユースケース
pub struct SweepIdleRoomsUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RoomRepository>,
    retention: Duration,
}

impl SweepIdleRoomsUseCase {
    /// 新しい SweepIdleRoomsUseCase を作成
    pub fn new(repository: Arc<dyn RoomRepository>, retention: Duration) -> Self {
        Self {
            repository,
            retention,
        }
    }

    pub async fn execute(&self, now: Timestamp) -> Vec<RoomId> {
        if self.retention.is_zero() {
            return Vec::new();
        }
        let retention_millis = i64::try_from(self.retention.as_millis()).unwrap_or(i64::MAX);
        let cutoff = Timestamp::new(now.value().saturating_sub(retention_millis));
        let removed = self.repository.remove_idle_rooms(cutoff).await;
        for room_id in &removed {
            tracing::info!("Removed idle room '{}'", room_id);
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{Identity, Room, RoomLimits, RoomSettings},
        infrastructure::repository::InMemoryRoomRepository,
    };

    async fn repository_with_room_created_at(millis: i64) -> Arc<InMemoryRoomRepository> {
        let repository = Arc::new(InMemoryRoomRepository::new());
        repository
            .create_room(Room::create(
                RoomId::new("chill").unwrap(),
                Identity::new("u1").unwrap(),
                RoomSettings::default(),
                RoomLimits::default(),
                Timestamp::new(millis),
            ))
            .await
            .unwrap();
        repository
    }

    #[tokio::test]
    async fn test_sweep_removes_rooms_empty_past_retention() {
        // テスト項目: 保持期間を過ぎた空きルームだけが削除される
        // given (前提条件):
        let repository = repository_with_room_created_at(0).await;
        let usecase = SweepIdleRoomsUseCase::new(repository.clone(), Duration::from_secs(60));

        // when (操作): 保持期間内
        let removed = usecase.execute(Timestamp::new(59_000)).await;

        // then (期待する結果):
        assert!(removed.is_empty());

        // when (操作): 保持期間経過後
        let removed = usecase.execute(Timestamp::new(60_000)).await;

        // then (期待する結果):
        assert_eq!(removed, vec![RoomId::new("chill").unwrap()]);
        assert!(repository.list_rooms().await.is_empty());
    }

    #[tokio::test]
    async fn test_zero_retention_disables_sweep() {
        let repository = repository_with_room_created_at(0).await;
        let usecase = SweepIdleRoomsUseCase::new(repository.clone(), Duration::ZERO);
        assert!(usecase.execute(Timestamp::new(i64::MAX)).await.is_empty());
        assert_eq!(repository.list_rooms().await.len(), 1);
    }
}
