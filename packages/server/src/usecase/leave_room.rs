//! UseCase: ルーム退出処理
//!
//! leave_room コマンドと WebSocket 切断の両方から呼ばれます。
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - LeaveRoomUseCase::execute() メソッド
//!
//! ### なぜこのテストが必要か
//! - 退出した参加者が購読から外れ、残りの参加者に参加者リストが配送されることを保証
//! - 退出後も DJ 権限（Identity に紐づく）は残ることを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：参加者の退出
//! - エッジケース：参加していないコネクションの退出（何も起きない）

use std::sync::Arc;

use crate::domain::{ConnectionId, RoomId, RoomRepository, Timestamp};

use super::error::CommandError;

/// ルーム退出のユースケース
pub struct LeaveRoomUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RoomRepository>,
}

impl LeaveRoomUseCase {
    /// 新しい LeaveRoomUseCase を作成
    pub fn new(repository: Arc<dyn RoomRepository>) -> Self {
        Self { repository }
    }

    /// ルーム退出を実行
    ///
    /// # Returns
    ///
    /// * `Ok(())` - 退出成功（参加していなかった場合も成功）
    /// * `Err(CommandError::NotFound)` - ルームが存在しない
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        room_id: &RoomId,
    ) -> Result<(), CommandError> {
        self.repository
            .leave_room(room_id, connection_id, Timestamp::now())
            .await?;
        tracing::info!("Connection '{}' left room '{}'", connection_id, room_id);
        Ok(())
    }
}
