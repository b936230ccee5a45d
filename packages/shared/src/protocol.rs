//! Wire protocol between clients and the room coordinator.
//!
//! Every frame is a JSON text message. Clients send [`ClientMessage`];
//! the coordinator answers with [`ServerMessage`]. Room-scoped state flows
//! through one envelope type, [`RoomEnvelope`], so a client has a single
//! dispatch point per room.

use serde::{Deserialize, Serialize};

/// Media item as it travels on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackDto {
    pub media_id: String,
    pub title: String,
    #[serde(default)]
    pub channel: String,
    #[serde(default)]
    pub thumbnail_url: String,
}

/// One queue slot. `entry_id` is unique within the room for its lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueEntryDto {
    pub entry_id: u64,
    pub track: TrackDto,
}

/// Playback clock: `position_seconds` is the position at `last_updated_at`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransportDto {
    pub is_playing: bool,
    pub position_seconds: f64,
    /// Unix milliseconds (server clock)
    pub last_updated_at: i64,
}

impl TransportDto {
    /// Position extrapolated to `now_millis` on the server clock.
    pub fn position_at(&self, now_millis: i64) -> f64 {
        if self.is_playing {
            self.position_seconds + crate::time::elapsed_seconds(self.last_updated_at, now_millis)
        } else {
            self.position_seconds
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Declined,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongRequestDto {
    pub request_id: u64,
    pub track: TrackDto,
    pub requester_identity: String,
    pub status: RequestStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantDto {
    pub connection_id: String,
    pub identity: String,
    pub display_name: String,
    pub color: String,
    /// Unix milliseconds
    pub joined_at: i64,
}

/// Display profile sent with `join_room`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileDto {
    pub display_name: String,
    pub color: String,
}

/// Room settings sent with `create_room`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomConfigDto {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_public")]
    pub is_public: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub description: String,
}

fn default_public() -> bool {
    true
}

impl Default for RoomConfigDto {
    fn default() -> Self {
        Self {
            name: None,
            is_public: true,
            tags: Vec::new(),
            description: String::new(),
        }
    }
}

/// Full room projection, sent on join.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomSnapshotDto {
    pub room_id: String,
    pub name: String,
    pub creator_id: String,
    pub dj_set: Vec<String>,
    pub is_public: bool,
    pub tags: Vec<String>,
    pub description: String,
    pub queue: Vec<QueueEntryDto>,
    pub current: Option<QueueEntryDto>,
    pub transport: TransportDto,
    pub participants: Vec<ParticipantDto>,
    pub song_requests: Vec<SongRequestDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionDto {
    pub reaction_id: u64,
    pub identity: String,
    pub display_name: String,
    pub emoji: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportAction {
    Play,
    Pause,
    Seek,
}

/// Commands a client sends to the coordinator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    JoinRoom {
        room_id: String,
        identity: String,
        profile: ProfileDto,
    },
    LeaveRoom {
        room_id: String,
    },
    CreateRoom {
        room_id: String,
        #[serde(default)]
        config: RoomConfigDto,
    },
    AddToQueue {
        room_id: String,
        track: TrackDto,
    },
    RemoveFromQueue {
        room_id: String,
        entry_id: u64,
    },
    ShuffleQueue {
        room_id: String,
    },
    NextSong {
        room_id: String,
        /// Entry the sender believes is playing; a stale value makes the
        /// command a no-op.
        #[serde(default)]
        current_entry_id: Option<u64>,
    },
    SendPlay {
        room_id: String,
        position: f64,
    },
    SendPause {
        room_id: String,
        #[serde(default)]
        position: Option<f64>,
    },
    SendSeek {
        room_id: String,
        position: f64,
    },
    GrantDjPermission {
        room_id: String,
        target_identity: String,
    },
    RevokeDjPermission {
        room_id: String,
        target_identity: String,
    },
    RequestSong {
        room_id: String,
        track: TrackDto,
    },
    AcceptRequest {
        room_id: String,
        request_id: u64,
    },
    DeclineRequest {
        room_id: String,
        request_id: u64,
    },
    DeleteRoom {
        room_id: String,
    },
    SendReaction {
        room_id: String,
        emoji: String,
    },
}

impl ClientMessage {
    /// Wire name of the command, as used in `command_rejected`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::JoinRoom { .. } => "join_room",
            Self::LeaveRoom { .. } => "leave_room",
            Self::CreateRoom { .. } => "create_room",
            Self::AddToQueue { .. } => "add_to_queue",
            Self::RemoveFromQueue { .. } => "remove_from_queue",
            Self::ShuffleQueue { .. } => "shuffle_queue",
            Self::NextSong { .. } => "next_song",
            Self::SendPlay { .. } => "send_play",
            Self::SendPause { .. } => "send_pause",
            Self::SendSeek { .. } => "send_seek",
            Self::GrantDjPermission { .. } => "grant_dj_permission",
            Self::RevokeDjPermission { .. } => "revoke_dj_permission",
            Self::RequestSong { .. } => "request_song",
            Self::AcceptRequest { .. } => "accept_request",
            Self::DeclineRequest { .. } => "decline_request",
            Self::DeleteRoom { .. } => "delete_room",
            Self::SendReaction { .. } => "send_reaction",
        }
    }

    pub fn room_id(&self) -> &str {
        match self {
            Self::JoinRoom { room_id, .. }
            | Self::LeaveRoom { room_id }
            | Self::CreateRoom { room_id, .. }
            | Self::AddToQueue { room_id, .. }
            | Self::RemoveFromQueue { room_id, .. }
            | Self::ShuffleQueue { room_id }
            | Self::NextSong { room_id, .. }
            | Self::SendPlay { room_id, .. }
            | Self::SendPause { room_id, .. }
            | Self::SendSeek { room_id, .. }
            | Self::GrantDjPermission { room_id, .. }
            | Self::RevokeDjPermission { room_id, .. }
            | Self::RequestSong { room_id, .. }
            | Self::AcceptRequest { room_id, .. }
            | Self::DeclineRequest { room_id, .. }
            | Self::DeleteRoom { room_id }
            | Self::SendReaction { room_id, .. } => room_id,
        }
    }
}

/// State change carried by a [`RoomEnvelope`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum RoomEvent {
    Snapshot(RoomSnapshotDto),
    QueueUpdated(Vec<QueueEntryDto>),
    TrackChanged {
        current: Option<QueueEntryDto>,
        transport: TransportDto,
    },
    Transport {
        action: TransportAction,
        transport: TransportDto,
    },
    DjSetUpdated(Vec<String>),
    RequestsUpdated(Vec<SongRequestDto>),
    ParticipantsUpdated(Vec<ParticipantDto>),
    Reaction(ReactionDto),
    RoomDeleted,
}

impl RoomEvent {
    /// Terminal events end the client's membership of the room.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::RoomDeleted)
    }
}

/// Room-scoped message from the coordinator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomEnvelope {
    pub room_id: String,
    /// Per-room counter; all events of one applied command share it.
    pub revision: u64,
    /// Coordinator clock at send time, Unix milliseconds.
    pub server_time: i64,
    pub event: RoomEvent,
}

/// Machine-readable failure class of a rejected command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    NotFound,
    Forbidden,
    AlreadyExists,
    InvalidInput,
    CapacityExceeded,
    Malformed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinRejectReason {
    RoomNotFound,
    IdentityMismatch,
    RoomFull,
    InvalidProfile,
}

/// Messages from the coordinator to one client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Room(RoomEnvelope),
    RoomCreated {
        room_id: String,
    },
    CommandRejected {
        room_id: String,
        command: String,
        code: ErrorCode,
        message: String,
    },
    JoinRejected {
        room_id: String,
        reason: JoinRejectReason,
        message: String,
    },
}
