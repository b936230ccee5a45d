//! UseCase: ルーム参加処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - JoinRoomUseCase::execute() メソッド
//! - 参加者の登録とスナップショットの送信
//!
//! ### なぜこのテストが必要か
//! - join_room の Identity はコネクションの Identity と一致しなければならない
//!   （他人になりすまして DJ 権限を得ることを防ぐ）
//! - 存在しないルームへの参加はクライアントにとって致命的なエラーとして扱われる
//!
//! ### どのような状況を想定しているか
//! - 正常系：参加してスナップショットを受け取る
//! - 異常系：存在しないルーム、Identity の不一致、定員超過

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;

use crate::domain::{
    ConnectionId, Identity, Participant, Profile, RepositoryError, RoomError, RoomId,
    RoomRepository, Timestamp,
};

use super::error::JoinError;

/// ルーム参加のユースケース
pub struct JoinRoomUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RoomRepository>,
}

impl JoinRoomUseCase {
    /// 新しい JoinRoomUseCase を作成
    pub fn new(repository: Arc<dyn RoomRepository>) -> Self {
        Self { repository }
    }

    /// ルーム参加を実行
    ///
    /// # Arguments
    ///
    /// * `connection_id` - 参加するコネクションの ID
    /// * `connected_identity` - ハンドシェイク時に確定した Identity
    /// * `room_id` - 参加するルーム
    /// * `requested_identity` - join_room で申告された Identity
    /// * `profile` - 表示名と色
    /// * `sender` - このコネクションへの送信チャンネル
    ///
    /// # Returns
    ///
    /// * `Ok(())` - 参加成功（スナップショットは `sender` に送信済み）
    /// * `Err(JoinError)` - 参加失敗
    pub async fn execute(
        &self,
        connection_id: ConnectionId,
        connected_identity: &Identity,
        room_id: &RoomId,
        requested_identity: Identity,
        profile: Profile,
        sender: UnboundedSender<String>,
    ) -> Result<(), JoinError> {
        // 1. なりすましチェック
        if &requested_identity != connected_identity {
            return Err(JoinError::IdentityMismatch {
                connected: connected_identity.to_string(),
                requested: requested_identity.to_string(),
            });
        }

        // 2. Repository に参加者を追加（スナップショット送信と参加者リストの配送を含む）
        let participant =
            Participant::new(connection_id, requested_identity, profile, Timestamp::now());
        self.repository
            .join_room(room_id, participant, sender)
            .await
            .map_err(|e| match e {
                RepositoryError::Room(RoomError::CapacityExceeded { .. }) => {
                    JoinError::RoomFull(room_id.to_string())
                }
                _ => JoinError::RoomNotFound(room_id.to_string()),
            })
    }
}
