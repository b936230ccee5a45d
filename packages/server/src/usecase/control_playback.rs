//! UseCase: 再生制御（次の曲・再生・一時停止・シーク）
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ControlPlaybackUseCase の next / transport
//!
//! ### なぜこのテストが必要か
//! - 再生制御は DJ だけに許される
//! - 複数の DJ が同じ曲の終了を同時に転送しても二重に進まないことを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：A, B を追加して next を 3 回（A → B → なし）
//! - 異常系：リスナーによる pause
//! - エッジケース：古いエントリ ID 付きの next

use std::sync::Arc;

use crate::domain::{
    ConnectionId, EntryId, Room, RoomId, RoomRepository, Timestamp, TransportCommand,
};

use super::error::CommandError;

/// 再生制御のユースケース
pub struct ControlPlaybackUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RoomRepository>,
}

impl ControlPlaybackUseCase {
    /// 新しい ControlPlaybackUseCase を作成
    pub fn new(repository: Arc<dyn RoomRepository>) -> Self {
        Self { repository }
    }

    /// キュー先頭の曲へ進める（DJ のみ）
    ///
    /// `expected` が現在の曲と一致しない場合は既に進んでいるので何もしない
    pub async fn next(
        &self,
        connection_id: ConnectionId,
        room_id: &RoomId,
        expected: Option<EntryId>,
    ) -> Result<(), CommandError> {
        self.repository
            .update(
                room_id,
                Box::new(move |room: &mut Room| {
                    room.play_next(&connection_id, expected, Timestamp::now())
                }),
            )
            .await?;
        Ok(())
    }

    /// 再生・一時停止・シーク（DJ のみ）
    pub async fn transport(
        &self,
        connection_id: ConnectionId,
        room_id: &RoomId,
        command: TransportCommand,
    ) -> Result<(), CommandError> {
        self.repository
            .update(
                room_id,
                Box::new(move |room: &mut Room| {
                    room.set_transport(&connection_id, command, Timestamp::now())
                }),
            )
            .await?;
        Ok(())
    }
}
