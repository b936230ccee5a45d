//! UseCase 層
//!
//! ビジネスロジックを実装するレイヤー。
//! UI 層から呼び出され、Domain 層を操作します。

pub mod control_playback;
pub mod create_room;
pub mod delete_room;
pub mod discover_rooms;
pub mod error;
pub mod join_room;
pub mod leave_room;
pub mod manage_dj;
pub mod manage_queue;
pub mod send_reaction;
pub mod song_request;
pub mod sweep_idle_rooms;

#[cfg(test)]
pub(crate) mod test_support;

pub use control_playback::ControlPlaybackUseCase;
pub use create_room::CreateRoomUseCase;
pub use delete_room::DeleteRoomUseCase;
pub use discover_rooms::DiscoverRoomsUseCase;
pub use error::{CommandError, JoinError};
pub use join_room::JoinRoomUseCase;
pub use leave_room::LeaveRoomUseCase;
pub use manage_dj::ManageDjUseCase;
pub use manage_queue::ManageQueueUseCase;
pub use send_reaction::SendReactionUseCase;
pub use song_request::SongRequestUseCase;
pub use sweep_idle_rooms::SweepIdleRoomsUseCase;
