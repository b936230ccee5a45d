//! UseCase: ルーム削除処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DeleteRoomUseCase::execute() メソッド
//!
//! ### なぜこのテストが必要か
//! - 削除は作成者だけに許される
//! - 削除時は全参加者に room_deleted が届き、ネットワークエラーと区別できる
//!
//! ### どのような状況を想定しているか
//! - 正常系：作成者による削除
//! - 異常系：リスナーによる削除、削除済みルームへのコマンド

use std::sync::Arc;

use crate::domain::{ConnectionId, RoomId, RoomRepository};

use super::error::CommandError;

/// ルーム削除のユースケース
pub struct DeleteRoomUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RoomRepository>,
}

impl DeleteRoomUseCase {
    /// 新しい DeleteRoomUseCase を作成
    pub fn new(repository: Arc<dyn RoomRepository>) -> Self {
        Self { repository }
    }

    /// ルーム削除を実行（作成者のみ）
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        room_id: &RoomId,
    ) -> Result<(), CommandError> {
        self.repository.delete_room(room_id, connection_id).await?;
        tracing::info!("Room '{}' deleted by '{}'", room_id, connection_id);
        Ok(())
    }
}
