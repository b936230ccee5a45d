//! UseCase 層のエラー定義
//!
//! ここでの分類がそのままクライアントへ返す `ErrorCode` / `JoinRejectReason` になります。

use groove_shared::protocol::{ErrorCode, JoinRejectReason};
use thiserror::Error;

use crate::domain::{RepositoryError, RoomError, ValueObjectError};

/// Failure of a room command, unicast to the issuing connection only
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("Room not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Room already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    CapacityExceeded(String),
}

impl CommandError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound(_) => ErrorCode::NotFound,
            Self::Forbidden(_) => ErrorCode::Forbidden,
            Self::AlreadyExists(_) => ErrorCode::AlreadyExists,
            Self::InvalidInput(_) => ErrorCode::InvalidInput,
            Self::CapacityExceeded(_) => ErrorCode::CapacityExceeded,
        }
    }
}

impl From<ValueObjectError> for CommandError {
    fn from(e: ValueObjectError) -> Self {
        Self::InvalidInput(e.to_string())
    }
}

impl From<RoomError> for CommandError {
    fn from(e: RoomError) -> Self {
        match e {
            RoomError::Forbidden { .. } | RoomError::NotParticipant => {
                Self::Forbidden(e.to_string())
            }
            RoomError::CapacityExceeded { .. } => Self::CapacityExceeded(e.to_string()),
        }
    }
}

impl From<RepositoryError> for CommandError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::RoomNotFound(id) => Self::NotFound(id),
            RepositoryError::RoomAlreadyExists(id) => Self::AlreadyExists(id),
            RepositoryError::Room(e) => e.into(),
        }
    }
}

/// Failure of `join_room`; terminal for the joining client
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JoinError {
    #[error("Room not found: {0}")]
    RoomNotFound(String),

    #[error("Identity '{requested}' does not match the connection identity '{connected}'")]
    IdentityMismatch { connected: String, requested: String },

    #[error("Room is full: {0}")]
    RoomFull(String),

    #[error("Invalid profile: {0}")]
    InvalidProfile(#[from] ValueObjectError),
}

impl JoinError {
    pub fn reason(&self) -> JoinRejectReason {
        match self {
            Self::RoomNotFound(_) => JoinRejectReason::RoomNotFound,
            Self::IdentityMismatch { .. } => JoinRejectReason::IdentityMismatch,
            Self::RoomFull(_) => JoinRejectReason::RoomFull,
            Self::InvalidProfile(_) => JoinRejectReason::InvalidProfile,
        }
    }
}
