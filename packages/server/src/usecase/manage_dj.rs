//! UseCase: DJ 権限の付与・剥奪
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ManageDjUseCase の grant / revoke
//!
//! ### なぜこのテストが必要か
//! - 権限の付与・剥奪は作成者だけに許される
//! - 作成者自身の権限は剥奪できない
//! - 付与された Identity は再接続後も DJ のまま
//!
//! ### どのような状況を想定しているか
//! - 正常系：U2 に付与 → U2 の play が成功 → 剥奪 → U2 の play が Forbidden
//! - 異常系：作成者の剥奪、作成者以外による付与

use std::sync::Arc;

use crate::domain::{ConnectionId, Identity, Room, RoomId, RoomRepository};

use super::error::CommandError;

/// DJ 権限管理のユースケース
pub struct ManageDjUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RoomRepository>,
}

impl ManageDjUseCase {
    /// 新しい ManageDjUseCase を作成
    pub fn new(repository: Arc<dyn RoomRepository>) -> Self {
        Self { repository }
    }

    /// DJ 権限を付与（作成者のみ）
    pub async fn grant(
        &self,
        connection_id: ConnectionId,
        room_id: &RoomId,
        target: Identity,
    ) -> Result<(), CommandError> {
        self.repository
            .update(
                room_id,
                Box::new(move |room: &mut Room| room.grant_dj(&connection_id, target)),
            )
            .await?;
        Ok(())
    }

    /// DJ 権限を剥奪（作成者のみ、作成者自身は不可）
    pub async fn revoke(
        &self,
        connection_id: ConnectionId,
        room_id: &RoomId,
        target: Identity,
    ) -> Result<(), CommandError> {
        self.repository
            .update(
                room_id,
                Box::new(move |room: &mut Room| room.revoke_dj(&connection_id, &target)),
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{Position, TransportCommand},
        usecase::{
            ControlPlaybackUseCase, ManageQueueUseCase,
            test_support::{TestRoom, track},
        },
    };
    use groove_shared::protocol::RoomEvent;

    #[tokio::test]
    async fn test_grant_then_revoke_controls_transport_rights() {
        // テスト項目: 付与後は U2 の play が成功し、剥奪後は Forbidden になる
        // given (前提条件):
        let mut test_room = TestRoom::new().await;
        let usecase = ManageDjUseCase::new(test_room.repository.clone());
        let playback = ControlPlaybackUseCase::new(test_room.repository.clone());
        ManageQueueUseCase::new(test_room.repository.clone())
            .add(test_room.creator.clone(), &test_room.room_id, track("a"))
            .await
            .unwrap();
        playback
            .next(test_room.creator.clone(), &test_room.room_id, None)
            .await
            .unwrap();
        test_room.drain();
        let u2 = Identity::new("u2").unwrap();
        let play = TransportCommand::Play(Position::new(5.0).unwrap());

        // when (操作): 付与
        usecase
            .grant(test_room.creator.clone(), &test_room.room_id, u2.clone())
            .await
            .unwrap();

        // then (期待する結果):
        match &test_room.listener_events()[..] {
            [envelope] => assert_eq!(
                envelope.event,
                RoomEvent::DjSetUpdated(vec!["u1".to_string(), "u2".to_string()])
            ),
            other => panic!("unexpected events: {other:?}"),
        }
        assert!(
            playback
                .transport(test_room.listener.clone(), &test_room.room_id, play)
                .await
                .is_ok()
        );

        // when (操作): 剥奪
        usecase
            .revoke(test_room.creator.clone(), &test_room.room_id, u2)
            .await
            .unwrap();

        // then (期待する結果):
        assert!(matches!(
            playback
                .transport(test_room.listener.clone(), &test_room.room_id, play)
                .await,
            Err(CommandError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_revoke_creator_is_forbidden() {
        // テスト項目: 作成者の DJ 権限の剥奪は常に Forbidden
        // given (前提条件):
        let test_room = TestRoom::new().await;
        let usecase = ManageDjUseCase::new(test_room.repository.clone());

        // when (操作):
        let result = usecase
            .revoke(
                test_room.creator.clone(),
                &test_room.room_id,
                Identity::new("u1").unwrap(),
            )
            .await;

        // then (期待する結果):
        assert!(matches!(result, Err(CommandError::Forbidden(_))));
        assert!(test_room.room().await.is_dj(&Identity::new("u1").unwrap()));
    }

    #[tokio::test]
    async fn test_listener_cannot_grant() {
        let test_room = TestRoom::new().await;
        let usecase = ManageDjUseCase::new(test_room.repository.clone());
        let result = usecase
            .grant(
                test_room.listener.clone(),
                &test_room.room_id,
                Identity::new("u2").unwrap(),
            )
            .await;
        assert!(matches!(result, Err(CommandError::Forbidden(_))));
        assert!(test_room.room().await.dj_set.is_empty());
    }
}
