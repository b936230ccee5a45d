//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use groove_shared::{protocol::RoomSnapshotDto, time::millis_to_rfc3339};

use crate::{
    domain::Room,
    infrastructure::dto::{
        http::{ParticipantDetailDto, RoomDetailDto, RoomSummaryDto},
        websocket::{snapshot, track_to_dto},
    },
    ui::state::AppState,
    usecase::DiscoverRoomsUseCase,
};

/// Debug endpoint returning the full snapshot of a room (for testing purposes)
pub async fn debug_room_state(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomSnapshotDto>, StatusCode> {
    let room = find_room(&state, &room_id).await?;
    Ok(Json(snapshot(&room)))
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Get list of public rooms
pub async fn get_rooms(State(state): State<Arc<AppState>>) -> Json<Vec<RoomSummaryDto>> {
    let rooms = DiscoverRoomsUseCase::new(state.repository.clone())
        .list_public()
        .await;

    Json(
        rooms
            .iter()
            .map(|room| RoomSummaryDto {
                room_id: room.id.as_str().to_string(),
                name: room.name().to_string(),
                user_count: room.participants.len(),
                current_track: room.current.as_ref().map(|e| track_to_dto(&e.track)),
                tags: room.settings.tags.clone(),
                created_at: millis_to_rfc3339(room.created_at.value()),
            })
            .collect(),
    )
}

/// Get room detail by ID
pub async fn get_room_detail(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomDetailDto>, StatusCode> {
    let room = find_room(&state, &room_id).await?;

    let room_detail = RoomDetailDto {
        room_id: room.id.as_str().to_string(),
        name: room.name().to_string(),
        creator_id: room.creator_id.as_str().to_string(),
        is_public: room.settings.is_public,
        tags: room.settings.tags.clone(),
        description: room.settings.description.clone(),
        queue_length: room.queue.len(),
        current_track: room.current.as_ref().map(|e| track_to_dto(&e.track)),
        participants: room
            .participants
            .iter()
            .map(|p| ParticipantDetailDto {
                identity: p.identity.as_str().to_string(),
                display_name: p.profile.display_name().to_string(),
                joined_at: millis_to_rfc3339(p.joined_at.value()),
            })
            .collect(),
        revision: room.revision,
        created_at: millis_to_rfc3339(room.created_at.value()),
    };

    Ok(Json(room_detail))
}

async fn find_room(state: &AppState, room_id: &str) -> Result<Room, StatusCode> {
    DiscoverRoomsUseCase::new(state.repository.clone())
        .detail(room_id)
        .await
        .map_err(|_| StatusCode::NOT_FOUND)
}
