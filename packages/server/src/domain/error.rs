//! Domain layer error definitions.

use thiserror::Error;

/// Errors related to Value Objects validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueObjectError {
    /// RoomId validation error
    #[error("RoomId cannot be empty")]
    RoomIdEmpty,

    /// RoomId contains a character that is not allowed in a slug
    #[error("RoomId may only contain ASCII letters, digits, '-' and '_' (got '{0}')")]
    RoomIdInvalidCharacter(char),

    #[error("Identity cannot be empty")]
    IdentityEmpty,

    #[error("Track media id cannot be empty")]
    MediaIdEmpty,

    #[error("Display name cannot be empty")]
    DisplayNameEmpty,

    #[error("Reaction emoji cannot be empty")]
    EmojiEmpty,

    #[error("Position must be a finite, non-negative number of seconds")]
    PositionOutOfRange,

    #[error("Room cannot have more than {max} tags (got {actual})")]
    TooManyTags { max: usize, actual: usize },

    /// Generic length limit
    #[error("{field} cannot exceed {max} characters (got {actual})")]
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },
}

/// Errors related to Room domain logic
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RoomError {
    /// The requester lacks the rights for this command
    #[error("Forbidden: {action} requires {required}")]
    Forbidden {
        action: &'static str,
        required: &'static str,
    },

    /// The connection has not joined the room
    #[error("Connection has not joined this room")]
    NotParticipant,

    /// Room capacity exceeded error
    #[error("{resource} capacity exceeded: maximum {capacity} allowed (current: {current})")]
    CapacityExceeded {
        resource: &'static str,
        capacity: usize,
        current: usize,
    },
}

/// Errors reported by a [`RoomRepository`](super::RoomRepository)
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Room not found: {0}")]
    RoomNotFound(String),

    #[error("Room already exists: {0}")]
    RoomAlreadyExists(String),

    #[error(transparent)]
    Room(#[from] RoomError),
}
