//! UseCase: ルーム作成処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - CreateRoomUseCase::execute() メソッド
//!
//! ### なぜこのテストが必要か
//! - 作成者が永続的な DJ になることを保証
//! - 同じスラッグのルームが二重に作成されないことを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：新しいルームの作成
//! - 異常系：既存のルーム ID での作成

use std::sync::Arc;

use crate::domain::{Identity, Room, RoomId, RoomLimits, RoomRepository, RoomSettings, Timestamp};

use super::error::CommandError;

/// ルーム作成のユースケース
pub struct CreateRoomUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RoomRepository>,
    /// 新しいルームに適用する上限値
    limits: RoomLimits,
}

impl CreateRoomUseCase {
    /// 新しい CreateRoomUseCase を作成
    pub fn new(repository: Arc<dyn RoomRepository>, limits: RoomLimits) -> Self {
        Self { repository, limits }
    }

    /// ルーム作成を実行
    ///
    /// # Arguments
    ///
    /// * `creator` - 作成者の Identity（コネクションに紐づくもの）
    /// * `room_id` - 正規化済みのルーム ID
    /// * `settings` - ルームのメタデータ
    ///
    /// # Returns
    ///
    /// * `Ok(RoomId)` - 作成されたルームの ID
    /// * `Err(CommandError::AlreadyExists)` - 既に同じ ID のルームがある
    pub async fn execute(
        &self,
        creator: Identity,
        room_id: RoomId,
        settings: RoomSettings,
    ) -> Result<RoomId, CommandError> {
        let room = Room::create(
            room_id.clone(),
            creator,
            settings,
            self.limits,
            Timestamp::now(),
        );
        self.repository.create_room(room).await?;
        tracing::info!("Room '{}' created", room_id);
        Ok(room_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::repository::InMemoryRoomRepository;

    fn create_test_repository() -> Arc<InMemoryRoomRepository> {
        Arc::new(InMemoryRoomRepository::new())
    }

    #[tokio::test]
    async fn test_create_room_success() {
        // テスト項目: 新しいルームを作成でき、作成者が DJ になる
        // given (前提条件):
        let repository = create_test_repository();
        let usecase = CreateRoomUseCase::new(repository.clone(), RoomLimits::default());
        let creator = Identity::new("u1").unwrap();

        // when (操作):
        let result = usecase
            .execute(
                creator.clone(),
                RoomId::new("Chill").unwrap(),
                RoomSettings::default(),
            )
            .await;

        // then (期待する結果):
        let room_id = result.unwrap();
        assert_eq!(room_id.as_str(), "chill");
        let room = repository.get_room(&room_id).await.unwrap();
        assert_eq!(room.creator_id, creator);
        assert!(room.is_dj(&creator));
        assert!(room.queue.is_empty());
        assert!(room.current.is_none());
    }

    #[tokio::test]
    async fn test_create_room_already_exists() {
        // テスト項目: 既存のルーム ID で作成すると AlreadyExists になる
        // given (前提条件):
        let repository = create_test_repository();
        let usecase = CreateRoomUseCase::new(repository.clone(), RoomLimits::default());
        usecase
            .execute(
                Identity::new("u1").unwrap(),
                RoomId::new("chill").unwrap(),
                RoomSettings::default(),
            )
            .await
            .unwrap();

        // when (操作): 大文字小文字違いでも同じスラッグになる
        let result = usecase
            .execute(
                Identity::new("u2").unwrap(),
                RoomId::new("CHILL").unwrap(),
                RoomSettings::default(),
            )
            .await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(CommandError::AlreadyExists("chill".to_string()))
        );
        let room = repository
            .get_room(&RoomId::new("chill").unwrap())
            .await
            .unwrap();
        assert_eq!(room.creator_id.as_str(), "u1");
    }
}
