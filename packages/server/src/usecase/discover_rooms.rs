//! UseCase: ルーム一覧・詳細（ディスカバリー）
//!
//! ルームごとのプロトコルとは別の読み取り専用の経路です。
//! 非公開ルームは一覧に出ませんが、ID を知っていれば詳細は取得できます。

use std::sync::Arc;

use crate::domain::{Room, RoomId, RoomRepository};

use super::error::CommandError;

/// ルームディスカバリーのユースケース
pub struct DiscoverRoomsUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RoomRepository>,
}

impl DiscoverRoomsUseCase {
    /// 新しい DiscoverRoomsUseCase を作成
    pub fn new(repository: Arc<dyn RoomRepository>) -> Self {
        Self { repository }
    }

    /// 公開ルームを作成順に返す
    pub async fn list_public(&self) -> Vec<Room> {
        self.repository
            .list_rooms()
            .await
            .into_iter()
            .filter(|room| room.settings.is_public)
            .collect()
    }

    pub async fn detail(&self, room_id: &str) -> Result<Room, CommandError> {
        let room_id =
            RoomId::new(room_id).map_err(|_| CommandError::NotFound(room_id.to_string()))?;
        Ok(self.repository.get_room(&room_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{Identity, RoomLimits, RoomSettings},
        usecase::CreateRoomUseCase,
    };
    use crate::infrastructure::repository::InMemoryRoomRepository;

    #[tokio::test]
    async fn test_list_public_hides_private_rooms() {
        // テスト項目: 非公開ルームは一覧に出ないが、詳細は取得できる
        // given (前提条件):
        let repository = Arc::new(InMemoryRoomRepository::new());
        let create = CreateRoomUseCase::new(repository.clone(), RoomLimits::default());
        let creator = Identity::new("u1").unwrap();
        create
            .execute(
                creator.clone(),
                RoomId::new("open").unwrap(),
                RoomSettings::default(),
            )
            .await
            .unwrap();
        create
            .execute(
                creator,
                RoomId::new("secret").unwrap(),
                RoomSettings::new(None, false, vec![], "").unwrap(),
            )
            .await
            .unwrap();
        let usecase = DiscoverRoomsUseCase::new(repository);

        // when (操作):
        let rooms = usecase.list_public().await;

        // then (期待する結果):
        assert_eq!(rooms.len(), 1);
        assert_eq!(rooms[0].id.as_str(), "open");
        assert!(usecase.detail("Secret").await.is_ok());
    }

    #[tokio::test]
    async fn test_detail_not_found() {
        let usecase = DiscoverRoomsUseCase::new(Arc::new(InMemoryRoomRepository::new()));
        assert_eq!(
            usecase.detail("nowhere").await.unwrap_err(),
            CommandError::NotFound("nowhere".to_string())
        );
        assert!(matches!(
            usecase.detail("bad/slug").await,
            Err(CommandError::NotFound(_))
        ));
    }
}
