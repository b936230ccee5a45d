//! Conversions between the room domain model and the WebSocket wire format.
//!
//! Events are rendered from the room state *after* a change was applied, so
//! each event carries the complete slice it replaces on the client.

use groove_shared::protocol::{
    self, ParticipantDto, ProfileDto, QueueEntryDto, ReactionDto, RoomEnvelope, RoomEvent,
    RoomSnapshotDto, ServerMessage, SongRequestDto, TrackDto, TransportDto,
};

use crate::domain::{
    Participant, Profile, QueueEntry, RequestStatus, Room, RoomChange, SongRequest, Timestamp,
    Track, Transport, TransportAction, ValueObjectError,
};

pub fn track_from_dto(dto: &TrackDto) -> Result<Track, ValueObjectError> {
    Track::new(&dto.media_id, &dto.title, &dto.channel, &dto.thumbnail_url)
}

pub fn profile_from_dto(dto: &ProfileDto) -> Result<Profile, ValueObjectError> {
    Profile::new(&dto.display_name, &dto.color)
}

pub fn track_to_dto(track: &Track) -> TrackDto {
    TrackDto {
        media_id: track.media_id().to_string(),
        title: track.title().to_string(),
        channel: track.channel().to_string(),
        thumbnail_url: track.thumbnail_url().to_string(),
    }
}

fn entry_to_dto(entry: &QueueEntry) -> QueueEntryDto {
    QueueEntryDto {
        entry_id: entry.entry_id.value(),
        track: track_to_dto(&entry.track),
    }
}

fn transport_to_dto(transport: &Transport) -> TransportDto {
    TransportDto {
        is_playing: transport.is_playing,
        position_seconds: transport.position.seconds(),
        last_updated_at: transport.last_updated_at.value(),
    }
}

fn request_to_dto(request: &SongRequest) -> SongRequestDto {
    SongRequestDto {
        request_id: request.request_id.value(),
        track: track_to_dto(&request.track),
        requester_identity: request.requester.as_str().to_string(),
        status: match request.status {
            RequestStatus::Pending => protocol::RequestStatus::Pending,
            RequestStatus::Accepted => protocol::RequestStatus::Accepted,
            RequestStatus::Declined => protocol::RequestStatus::Declined,
        },
    }
}

fn participant_to_dto(participant: &Participant) -> ParticipantDto {
    ParticipantDto {
        connection_id: participant.connection_id.as_str().to_string(),
        identity: participant.identity.as_str().to_string(),
        display_name: participant.profile.display_name().to_string(),
        color: participant.profile.color().to_string(),
        joined_at: participant.joined_at.value(),
    }
}

fn queue_dto(room: &Room) -> Vec<QueueEntryDto> {
    room.queue.iter().map(entry_to_dto).collect()
}

/// Creator first, then granted co-DJs in identity order.
fn dj_set_dto(room: &Room) -> Vec<String> {
    std::iter::once(&room.creator_id)
        .chain(room.dj_set.iter())
        .map(|id| id.as_str().to_string())
        .collect()
}

pub fn participants_dto(room: &Room) -> Vec<ParticipantDto> {
    room.participants.iter().map(participant_to_dto).collect()
}

/// Full room state as sent to a joining client.
pub fn snapshot(room: &Room) -> RoomSnapshotDto {
    RoomSnapshotDto {
        room_id: room.id.as_str().to_string(),
        name: room.name().to_string(),
        creator_id: room.creator_id.as_str().to_string(),
        dj_set: dj_set_dto(room),
        is_public: room.settings.is_public,
        tags: room.settings.tags.clone(),
        description: room.settings.description.clone(),
        queue: queue_dto(room),
        current: room.current.as_ref().map(entry_to_dto),
        transport: transport_to_dto(&room.transport),
        participants: participants_dto(room),
        song_requests: room.song_requests.iter().map(request_to_dto).collect(),
    }
}

pub fn event_for_change(room: &Room, change: &RoomChange) -> RoomEvent {
    match change {
        RoomChange::QueueUpdated => RoomEvent::QueueUpdated(queue_dto(room)),
        RoomChange::TrackChanged => RoomEvent::TrackChanged {
            current: room.current.as_ref().map(entry_to_dto),
            transport: transport_to_dto(&room.transport),
        },
        RoomChange::Transport(action) => RoomEvent::Transport {
            action: match action {
                TransportAction::Play => protocol::TransportAction::Play,
                TransportAction::Pause => protocol::TransportAction::Pause,
                TransportAction::Seek => protocol::TransportAction::Seek,
            },
            transport: transport_to_dto(&room.transport),
        },
        RoomChange::DjSetUpdated => RoomEvent::DjSetUpdated(dj_set_dto(room)),
        RoomChange::RequestsUpdated => {
            RoomEvent::RequestsUpdated(room.song_requests.iter().map(request_to_dto).collect())
        }
        RoomChange::ParticipantsUpdated => RoomEvent::ParticipantsUpdated(participants_dto(room)),
        RoomChange::Reaction(reaction) => RoomEvent::Reaction(ReactionDto {
            reaction_id: reaction.reaction_id,
            identity: reaction.identity.as_str().to_string(),
            display_name: reaction.display_name.clone(),
            emoji: reaction.emoji.as_str().to_string(),
        }),
    }
}

/// Wrap `event` in an envelope stamped with the room's current revision.
pub fn room_message(room: &Room, event: RoomEvent, now: Timestamp) -> ServerMessage {
    ServerMessage::Room(RoomEnvelope {
        room_id: room.id.as_str().to_string(),
        revision: room.revision,
        server_time: now.value(),
        event,
    })
}

/// Serialize a server message, logging instead of failing.
pub fn encode(message: &ServerMessage) -> Option<String> {
    match serde_json::to_string(message) {
        Ok(json) => Some(json),
        Err(e) => {
            tracing::error!("Failed to serialize server message: {}", e);
            None
        }
    }
}
