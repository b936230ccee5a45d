//! UseCase: キュー操作（追加・削除・シャッフル）
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ManageQueueUseCase の add / remove / shuffle
//!
//! ### なぜこのテストが必要か
//! - 追加は全参加者に開放、削除とシャッフルは DJ のみという非対称な権限を保証
//! - 既に無いエントリの削除が冪等な成功になることを保証（DJ 同士の競合対策）
//!
//! ### どのような状況を想定しているか
//! - 正常系：リスナーによる追加、DJ による削除とシャッフル
//! - 異常系：リスナーによる削除
//! - エッジケース：存在しないエントリの削除

use std::sync::Arc;

use crate::domain::{ConnectionId, EntryId, Room, RoomId, RoomRepository, Track};

use super::error::CommandError;

/// キュー操作のユースケース
pub struct ManageQueueUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RoomRepository>,
}

impl ManageQueueUseCase {
    /// 新しい ManageQueueUseCase を作成
    pub fn new(repository: Arc<dyn RoomRepository>) -> Self {
        Self { repository }
    }

    /// キューの末尾に追加（全参加者に開放）
    pub async fn add(
        &self,
        connection_id: ConnectionId,
        room_id: &RoomId,
        track: Track,
    ) -> Result<(), CommandError> {
        self.repository
            .update(
                room_id,
                Box::new(move |room: &mut Room| {
                    room.add_to_queue(&connection_id, track)
                        .map(|(_, changes)| changes)
                }),
            )
            .await?;
        Ok(())
    }

    /// エントリを削除（DJ のみ）。既に無いエントリなら何もしない
    pub async fn remove(
        &self,
        connection_id: ConnectionId,
        room_id: &RoomId,
        entry_id: EntryId,
    ) -> Result<(), CommandError> {
        self.repository
            .update(
                room_id,
                Box::new(move |room: &mut Room| room.remove_from_queue(&connection_id, entry_id)),
            )
            .await?;
        Ok(())
    }

    /// キューをシャッフル（DJ のみ）
    pub async fn shuffle(
        &self,
        connection_id: ConnectionId,
        room_id: &RoomId,
    ) -> Result<(), CommandError> {
        self.repository
            .update(
                room_id,
                Box::new(move |room: &mut Room| {
                    room.shuffle_queue(&connection_id, &mut rand::thread_rng())
                }),
            )
            .await?;
        Ok(())
    }
}
