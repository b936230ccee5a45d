//! UseCase: 曲リクエスト（送信・承認・却下）
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SongRequestUseCase の submit / resolve
//!
//! ### なぜこのテストが必要か
//! - リクエストは pending → accepted / declined の一方向にしか遷移しない
//! - 承認するとキューに追加される
//!
//! ### どのような状況を想定しているか
//! - 正常系：U2 がリクエスト → U1 が承認 → キューに追加
//! - エッジケース：承認済みのリクエストの却下（何もしない）
//! - 異常系：リスナーによる承認

use std::sync::Arc;

use crate::domain::{ConnectionId, RequestId, Room, RoomId, RoomRepository, Track};

use super::error::CommandError;

/// 曲リクエストのユースケース
pub struct SongRequestUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RoomRepository>,
}

impl SongRequestUseCase {
    /// 新しい SongRequestUseCase を作成
    pub fn new(repository: Arc<dyn RoomRepository>) -> Self {
        Self { repository }
    }

    /// リクエストを送信（全参加者に開放）
    pub async fn submit(
        &self,
        connection_id: ConnectionId,
        room_id: &RoomId,
        track: Track,
    ) -> Result<(), CommandError> {
        self.repository
            .update(
                room_id,
                Box::new(move |room: &mut Room| {
                    room.submit_request(&connection_id, track)
                        .map(|(_, changes)| changes)
                }),
            )
            .await?;
        Ok(())
    }

    /// リクエストを承認または却下（DJ のみ）
    pub async fn resolve(
        &self,
        connection_id: ConnectionId,
        room_id: &RoomId,
        request_id: RequestId,
        accept: bool,
    ) -> Result<(), CommandError> {
        self.repository
            .update(
                room_id,
                Box::new(move |room: &mut Room| {
                    room.resolve_request(&connection_id, request_id, accept)
                }),
            )
            .await?;
        Ok(())
    }
}
