//! Client-side error types.

use groove_shared::protocol::JoinRejectReason;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] serde_json::Error),

    #[error("join rejected ({reason:?}): {message}")]
    JoinRejected {
        reason: JoinRejectReason,
        message: String,
    },

    #[error("room '{0}' was deleted")]
    RoomDeleted(String),

    #[error("timed out waiting for {0}")]
    Timeout(&'static str),

    #[error("invalid server url '{0}'")]
    InvalidServerUrl(String),

    #[error("profile storage error: {0}")]
    Storage(#[from] std::io::Error),
}

impl ClientError {
    /// The socket is gone
    pub fn closed() -> Self {
        Self::Transport(tokio_tungstenite::tungstenite::Error::ConnectionClosed)
    }

    /// Terminal errors end the session; everything else may be retried
    /// with a fresh connection.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::JoinRejected { .. } | Self::RoomDeleted(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_errors() {
        // テスト項目: 参加拒否とルーム削除だけが終端エラーになる
        // given (前提条件):
        let rejected = ClientError::JoinRejected {
            reason: JoinRejectReason::RoomNotFound,
            message: "no such room".to_string(),
        };
        let deleted = ClientError::RoomDeleted("chill".to_string());
        let timeout = ClientError::Timeout("snapshot");

        // when (操作):
        // then (期待する結果):
        assert!(rejected.is_terminal());
        assert!(deleted.is_terminal());
        assert!(!timeout.is_terminal());
    }
}
