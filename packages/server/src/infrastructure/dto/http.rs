//! HTTP API response DTOs for room discovery.

use groove_shared::protocol::TrackDto;
use serde::{Deserialize, Serialize};

/// Room summary for the discovery feed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomSummaryDto {
    pub room_id: String,
    pub name: String,
    pub user_count: usize,
    pub current_track: Option<TrackDto>,
    pub tags: Vec<String>,
    pub created_at: String, // ISO 8601
}

/// Room detail for detail endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomDetailDto {
    pub room_id: String,
    pub name: String,
    pub creator_id: String,
    pub is_public: bool,
    pub tags: Vec<String>,
    pub description: String,
    pub queue_length: usize,
    pub current_track: Option<TrackDto>,
    pub participants: Vec<ParticipantDetailDto>,
    pub revision: u64,
    pub created_at: String, // ISO 8601
}

/// Participant detail for room detail endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantDetailDto {
    pub identity: String,
    pub display_name: String,
    pub joined_at: String, // ISO 8601
}
