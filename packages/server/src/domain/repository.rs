//! Repository trait（データアクセス層の抽象化）
//!
//! UseCase 層はこの trait に依存し、具体的な実装（InMemory など）には依存しません。
//!
//! 実装は 1 ルームにつき 1 つの直列化ポイントを持たなければなりません。
//! `update` に渡した変更はルーム単位で 1 つずつ適用され、その結果のイベントは
//! 適用順に全購読者へ配送されます。

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedSender;

use super::{
    entity::{Participant, Room, RoomChange},
    error::{RepositoryError, RoomError},
    value_object::{ConnectionId, RoomId, Timestamp},
};

/// A command applied to one room under its lock.
pub type RoomMutation =
    Box<dyn FnOnce(&mut Room) -> Result<Vec<RoomChange>, RoomError> + Send + 'static>;

#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// Register a new room.
    ///
    /// # Errors
    ///
    /// `RepositoryError::RoomAlreadyExists` if the id is taken.
    async fn create_room(&self, room: Room) -> Result<(), RepositoryError>;

    /// Add a participant and subscribe `sender` to the room's events.
    ///
    /// The joiner receives a snapshot before any later event; the other
    /// subscribers receive the updated participant list.
    async fn join_room(
        &self,
        room_id: &RoomId,
        participant: Participant,
        sender: UnboundedSender<String>,
    ) -> Result<(), RepositoryError>;

    /// Remove a participant and its subscription.
    async fn leave_room(
        &self,
        room_id: &RoomId,
        connection_id: &ConnectionId,
        now: Timestamp,
    ) -> Result<(), RepositoryError>;

    /// Apply `mutation` and broadcast the resulting changes.
    ///
    /// # Errors
    ///
    /// `RepositoryError::RoomNotFound` for unknown or deleted rooms, or the
    /// mutation's own `RoomError`. A failed mutation broadcasts nothing.
    async fn update(&self, room_id: &RoomId, mutation: RoomMutation)
    -> Result<(), RepositoryError>;

    /// Delete a room on behalf of `connection_id`, notifying every
    /// subscriber with a terminal event.
    async fn delete_room(
        &self,
        room_id: &RoomId,
        connection_id: &ConnectionId,
    ) -> Result<(), RepositoryError>;

    /// Get a copy of the current room state
    async fn get_room(&self, room_id: &RoomId) -> Result<Room, RepositoryError>;

    /// Get copies of every room
    async fn list_rooms(&self) -> Vec<Room>;

    /// Drop rooms that have had no participants since `cutoff`.
    async fn remove_idle_rooms(&self, cutoff: Timestamp) -> Vec<RoomId>;
}
