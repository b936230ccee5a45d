//! Domain layer for listening rooms.
//!
//! This module contains business logic that is independent of
//! data transfer objects (DTOs) and infrastructure concerns.

pub mod authority;
pub mod entity;
pub mod error;
pub mod factory;
pub mod repository;
pub mod value_object;

pub use entity::{
    DEFAULT_PARTICIPANT_CAPACITY, DEFAULT_QUEUE_CAPACITY, DEFAULT_REQUEST_CAPACITY, Participant,
    QueueEntry, Reaction, RequestStatus, Room, RoomChange, RoomLimits, RoomSettings, SongRequest,
    Transport, TransportAction, TransportCommand,
};
pub use error::{RepositoryError, RoomError, ValueObjectError};
pub use factory::ConnectionIdFactory;
pub use repository::{RoomMutation, RoomRepository};
pub use value_object::{
    ConnectionId, Emoji, EntryId, Identity, Position, Profile, RequestId, RoomId, Timestamp, Track,
};
