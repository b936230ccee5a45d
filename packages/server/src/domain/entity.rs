//! Core domain models for listening rooms.
//!
//! [`Room`] is the authoritative state of one room. Every command is a
//! method that validates the requester, mutates the room, and returns the
//! [`RoomChange`]s the coordinator must broadcast. A command that changes
//! nothing returns an empty list and leaves `revision` untouched.

use std::collections::BTreeSet;

use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};

use super::{
    authority,
    error::{RoomError, ValueObjectError},
    value_object::{
        ConnectionId, Emoji, EntryId, Identity, Position, Profile, RequestId, RoomId, Timestamp,
        Track,
    },
};

/// Default maximum number of participants allowed in a room
pub const DEFAULT_PARTICIPANT_CAPACITY: usize = 50;

/// Default maximum number of queued entries in a room
pub const DEFAULT_QUEUE_CAPACITY: usize = 500;

/// Default maximum number of song requests kept by a room
pub const DEFAULT_REQUEST_CAPACITY: usize = 200;

const MAX_TAGS: usize = 10;
const TAG_MAX_LEN: usize = 32;
const NAME_MAX_LEN: usize = 64;
const DESCRIPTION_MAX_LEN: usize = 500;

/// Per-room capacities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomLimits {
    pub participant_capacity: usize,
    pub queue_capacity: usize,
    pub request_capacity: usize,
}

impl Default for RoomLimits {
    fn default() -> Self {
        Self {
            participant_capacity: DEFAULT_PARTICIPANT_CAPACITY,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            request_capacity: DEFAULT_REQUEST_CAPACITY,
        }
    }
}

/// Metadata chosen at creation. `is_public` only affects discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSettings {
    pub name: String,
    pub is_public: bool,
    pub tags: Vec<String>,
    pub description: String,
}

impl RoomSettings {
    pub fn new(
        name: Option<&str>,
        is_public: bool,
        tags: Vec<String>,
        description: &str,
    ) -> Result<Self, ValueObjectError> {
        let name = name.map(str::trim).unwrap_or_default().to_string();
        check_len("name", &name, NAME_MAX_LEN)?;
        if tags.len() > MAX_TAGS {
            return Err(ValueObjectError::TooManyTags {
                max: MAX_TAGS,
                actual: tags.len(),
            });
        }
        let tags = tags
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>();
        for tag in &tags {
            check_len("tag", tag, TAG_MAX_LEN)?;
        }
        check_len("description", description, DESCRIPTION_MAX_LEN)?;
        Ok(Self {
            name,
            is_public,
            tags,
            description: description.to_string(),
        })
    }
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            name: String::new(),
            is_public: true,
            tags: Vec::new(),
            description: String::new(),
        }
    }
}

fn check_len(field: &'static str, value: &str, max: usize) -> Result<(), ValueObjectError> {
    let actual = value.chars().count();
    if actual > max {
        return Err(ValueObjectError::TooLong { field, max, actual });
    }
    Ok(())
}

/// Represents a participant connected to a room
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub connection_id: ConnectionId,
    pub identity: Identity,
    pub profile: Profile,
    pub joined_at: Timestamp,
}

impl Participant {
    pub fn new(
        connection_id: ConnectionId,
        identity: Identity,
        profile: Profile,
        joined_at: Timestamp,
    ) -> Self {
        Self {
            connection_id,
            identity,
            profile,
            joined_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub entry_id: EntryId,
    pub track: Track,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestStatus {
    Pending,
    Accepted,
    Declined,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongRequest {
    pub request_id: RequestId,
    pub track: Track,
    pub requester: Identity,
    pub status: RequestStatus,
}

/// Playback clock. `position` is the position at `last_updated_at`; it is
/// never ticked in the store.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transport {
    pub is_playing: bool,
    pub position: Position,
    pub last_updated_at: Timestamp,
}

impl Transport {
    pub fn stopped(now: Timestamp) -> Self {
        Self {
            is_playing: false,
            position: Position::ZERO,
            last_updated_at: now,
        }
    }

    fn playing_from_start(now: Timestamp) -> Self {
        Self {
            is_playing: true,
            position: Position::ZERO,
            last_updated_at: now,
        }
    }

    /// Position extrapolated to `now`.
    pub fn position_at(&self, now: Timestamp) -> Position {
        if !self.is_playing {
            return self.position;
        }
        let elapsed =
            groove_shared::time::elapsed_seconds(self.last_updated_at.value(), now.value());
        Position::new(self.position.seconds() + elapsed).unwrap_or(self.position)
    }
}

/// DJ transport intent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransportCommand {
    Play(Position),
    /// `None` freezes the extrapolated position.
    Pause(Option<Position>),
    Seek(Position),
}

impl TransportCommand {
    fn action(&self) -> TransportAction {
        match self {
            Self::Play(_) => TransportAction::Play,
            Self::Pause(_) => TransportAction::Pause,
            Self::Seek(_) => TransportAction::Seek,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportAction {
    Play,
    Pause,
    Seek,
}

impl TransportAction {
    fn command_name(&self) -> &'static str {
        match self {
            Self::Play => "send_play",
            Self::Pause => "send_pause",
            Self::Seek => "send_seek",
        }
    }
}

/// Ephemeral reaction, broadcast but never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reaction {
    pub reaction_id: u64,
    pub identity: Identity,
    pub display_name: String,
    pub emoji: Emoji,
}

/// Which slice of the room a command touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomChange {
    QueueUpdated,
    TrackChanged,
    Transport(TransportAction),
    DjSetUpdated,
    RequestsUpdated,
    ParticipantsUpdated,
    Reaction(Reaction),
}

/// Represents a listening room
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub creator_id: Identity,
    /// Granted co-DJs; never contains `creator_id`.
    pub dj_set: BTreeSet<Identity>,
    pub settings: RoomSettings,
    pub queue: Vec<QueueEntry>,
    pub current: Option<QueueEntry>,
    pub transport: Transport,
    /// Ordered by join time
    pub participants: Vec<Participant>,
    pub song_requests: Vec<SongRequest>,
    pub created_at: Timestamp,
    /// Incremented once per applied state change
    pub revision: u64,
    pub limits: RoomLimits,
    /// Set while the room has no participants
    pub emptied_at: Option<Timestamp>,
    next_entry_id: u64,
    next_request_id: u64,
    next_reaction_id: u64,
}

impl Room {
    /// Create a new empty room owned by `creator_id`
    pub fn create(
        id: RoomId,
        creator_id: Identity,
        settings: RoomSettings,
        limits: RoomLimits,
        now: Timestamp,
    ) -> Self {
        Self {
            id,
            creator_id,
            dj_set: BTreeSet::new(),
            settings,
            queue: Vec::new(),
            current: None,
            transport: Transport::stopped(now),
            participants: Vec::new(),
            song_requests: Vec::new(),
            created_at: now,
            revision: 0,
            limits,
            emptied_at: Some(now),
            next_entry_id: 0,
            next_request_id: 0,
            next_reaction_id: 0,
        }
    }

    /// Display name, falling back to the slug
    pub fn name(&self) -> &str {
        if self.settings.name.is_empty() {
            self.id.as_str()
        } else {
            &self.settings.name
        }
    }

    pub fn is_dj(&self, identity: &Identity) -> bool {
        authority::is_dj(self, identity)
    }

    /// Get a participant by connection id
    ///
    /// # Errors
    ///
    /// `RoomError::NotParticipant` if the connection has not joined.
    pub fn participant(&self, connection_id: &ConnectionId) -> Result<&Participant, RoomError> {
        self.participants
            .iter()
            .find(|p| &p.connection_id == connection_id)
            .ok_or(RoomError::NotParticipant)
    }

    fn requester(&self, connection_id: &ConnectionId) -> Result<Identity, RoomError> {
        self.participant(connection_id).map(|p| p.identity.clone())
    }

    fn commit(&mut self, changes: Vec<RoomChange>) -> Vec<RoomChange> {
        if !changes.is_empty() {
            self.revision += 1;
        }
        changes
    }

    /// Add a participant, or refresh it when the connection joins again.
    ///
    /// # Errors
    ///
    /// `RoomError::CapacityExceeded` if the room is at full capacity.
    pub fn join(&mut self, participant: Participant) -> Result<Vec<RoomChange>, RoomError> {
        if let Some(existing) = self
            .participants
            .iter_mut()
            .find(|p| p.connection_id == participant.connection_id)
        {
            *existing = participant;
        } else {
            if self.participants.len() >= self.limits.participant_capacity {
                return Err(RoomError::CapacityExceeded {
                    resource: "participant",
                    capacity: self.limits.participant_capacity,
                    current: self.participants.len(),
                });
            }
            self.participants.push(participant);
        }
        self.emptied_at = None;
        Ok(self.commit(vec![RoomChange::ParticipantsUpdated]))
    }

    /// Remove a participant by connection id. Unknown ids are ignored.
    pub fn leave(&mut self, connection_id: &ConnectionId, now: Timestamp) -> Vec<RoomChange> {
        let before = self.participants.len();
        self.participants.retain(|p| &p.connection_id != connection_id);
        if self.participants.len() == before {
            return Vec::new();
        }
        if self.participants.is_empty() {
            self.emptied_at = Some(now);
        }
        self.commit(vec![RoomChange::ParticipantsUpdated])
    }

    /// Append a track; open to every participant.
    pub fn add_to_queue(
        &mut self,
        connection_id: &ConnectionId,
        track: Track,
    ) -> Result<(EntryId, Vec<RoomChange>), RoomError> {
        self.participant(connection_id)?;
        self.ensure_queue_capacity()?;
        let entry_id = self.push_entry(track);
        Ok((entry_id, self.commit(vec![RoomChange::QueueUpdated])))
    }

    fn ensure_queue_capacity(&self) -> Result<(), RoomError> {
        if self.queue.len() >= self.limits.queue_capacity {
            return Err(RoomError::CapacityExceeded {
                resource: "queue",
                capacity: self.limits.queue_capacity,
                current: self.queue.len(),
            });
        }
        Ok(())
    }

    fn push_entry(&mut self, track: Track) -> EntryId {
        self.next_entry_id += 1;
        let entry_id = EntryId::new(self.next_entry_id);
        self.queue.push(QueueEntry { entry_id, track });
        entry_id
    }

    /// DJ only. Removing an absent entry is a successful no-op.
    pub fn remove_from_queue(
        &mut self,
        connection_id: &ConnectionId,
        entry_id: EntryId,
    ) -> Result<Vec<RoomChange>, RoomError> {
        let identity = self.requester(connection_id)?;
        authority::ensure_dj(self, &identity, "remove_from_queue")?;
        let before = self.queue.len();
        self.queue.retain(|e| e.entry_id != entry_id);
        if self.queue.len() == before {
            return Ok(Vec::new());
        }
        Ok(self.commit(vec![RoomChange::QueueUpdated]))
    }

    /// DJ only.
    pub fn shuffle_queue<R: Rng + ?Sized>(
        &mut self,
        connection_id: &ConnectionId,
        rng: &mut R,
    ) -> Result<Vec<RoomChange>, RoomError> {
        let identity = self.requester(connection_id)?;
        authority::ensure_dj(self, &identity, "shuffle_queue")?;
        if self.queue.len() < 2 {
            return Ok(Vec::new());
        }
        self.queue.shuffle(rng);
        Ok(self.commit(vec![RoomChange::QueueUpdated]))
    }

    /// DJ only. Pops the queue head into `current` and restarts the clock.
    ///
    /// When `expected` is given and differs from the current entry the
    /// command is stale (another DJ already advanced) and does nothing.
    pub fn play_next(
        &mut self,
        connection_id: &ConnectionId,
        expected: Option<EntryId>,
        now: Timestamp,
    ) -> Result<Vec<RoomChange>, RoomError> {
        let identity = self.requester(connection_id)?;
        authority::ensure_dj(self, &identity, "next_song")?;
        if let Some(expected) = expected
            && self.current.as_ref().map(|e| e.entry_id) != Some(expected)
        {
            return Ok(Vec::new());
        }
        Ok(self.advance(now))
    }

    fn advance(&mut self, now: Timestamp) -> Vec<RoomChange> {
        if self.queue.is_empty() {
            if self.current.is_none() && !self.transport.is_playing {
                return Vec::new();
            }
            self.current = None;
            self.transport = Transport::stopped(now);
            return self.commit(vec![RoomChange::TrackChanged]);
        }
        let next = self.queue.remove(0);
        self.current = Some(next);
        self.transport = Transport::playing_from_start(now);
        self.commit(vec![RoomChange::QueueUpdated, RoomChange::TrackChanged])
    }

    /// DJ only. Play and seek without a loaded track do nothing.
    pub fn set_transport(
        &mut self,
        connection_id: &ConnectionId,
        command: TransportCommand,
        now: Timestamp,
    ) -> Result<Vec<RoomChange>, RoomError> {
        let action = command.action();
        let identity = self.requester(connection_id)?;
        authority::ensure_dj(self, &identity, action.command_name())?;
        if self.current.is_none() && action != TransportAction::Pause {
            return Ok(Vec::new());
        }
        self.transport = match command {
            TransportCommand::Play(position) => Transport {
                is_playing: true,
                position,
                last_updated_at: now,
            },
            TransportCommand::Pause(position) => Transport {
                is_playing: false,
                position: position.unwrap_or_else(|| self.transport.position_at(now)),
                last_updated_at: now,
            },
            TransportCommand::Seek(position) => Transport {
                is_playing: self.transport.is_playing,
                position,
                last_updated_at: now,
            },
        };
        Ok(self.commit(vec![RoomChange::Transport(action)]))
    }

    /// Creator only. Granting the creator or an existing co-DJ is a no-op.
    pub fn grant_dj(
        &mut self,
        connection_id: &ConnectionId,
        target: Identity,
    ) -> Result<Vec<RoomChange>, RoomError> {
        let identity = self.requester(connection_id)?;
        authority::ensure_creator(self, &identity, "grant_dj_permission")?;
        if target == self.creator_id || !self.dj_set.insert(target) {
            return Ok(Vec::new());
        }
        Ok(self.commit(vec![RoomChange::DjSetUpdated]))
    }

    /// Creator only. The creator can never be revoked.
    pub fn revoke_dj(
        &mut self,
        connection_id: &ConnectionId,
        target: &Identity,
    ) -> Result<Vec<RoomChange>, RoomError> {
        let identity = self.requester(connection_id)?;
        authority::ensure_creator(self, &identity, "revoke_dj_permission")?;
        if target == &self.creator_id {
            return Err(RoomError::Forbidden {
                action: "revoke_dj_permission",
                required: "a target other than the room creator",
            });
        }
        if !self.dj_set.remove(target) {
            return Ok(Vec::new());
        }
        Ok(self.commit(vec![RoomChange::DjSetUpdated]))
    }

    /// Open to every participant; creates a pending request.
    pub fn submit_request(
        &mut self,
        connection_id: &ConnectionId,
        track: Track,
    ) -> Result<(RequestId, Vec<RoomChange>), RoomError> {
        let requester = self.requester(connection_id)?;
        if self.song_requests.len() >= self.limits.request_capacity {
            return Err(RoomError::CapacityExceeded {
                resource: "song request",
                capacity: self.limits.request_capacity,
                current: self.song_requests.len(),
            });
        }
        self.next_request_id += 1;
        let request_id = RequestId::new(self.next_request_id);
        self.song_requests.push(SongRequest {
            request_id,
            track,
            requester,
            status: RequestStatus::Pending,
        });
        Ok((request_id, self.commit(vec![RoomChange::RequestsUpdated])))
    }

    /// DJ only. Accepting also queues the track. Resolving an unknown or
    /// already resolved request is a no-op: accepted and declined are
    /// terminal.
    pub fn resolve_request(
        &mut self,
        connection_id: &ConnectionId,
        request_id: RequestId,
        accept: bool,
    ) -> Result<Vec<RoomChange>, RoomError> {
        let action = if accept {
            "accept_request"
        } else {
            "decline_request"
        };
        let identity = self.requester(connection_id)?;
        authority::ensure_dj(self, &identity, action)?;
        let Some(index) = self
            .song_requests
            .iter()
            .position(|r| r.request_id == request_id && r.status == RequestStatus::Pending)
        else {
            return Ok(Vec::new());
        };
        if !accept {
            self.song_requests[index].status = RequestStatus::Declined;
            return Ok(self.commit(vec![RoomChange::RequestsUpdated]));
        }
        self.ensure_queue_capacity()?;
        self.song_requests[index].status = RequestStatus::Accepted;
        let track = self.song_requests[index].track.clone();
        self.push_entry(track);
        Ok(self.commit(vec![
            RoomChange::RequestsUpdated,
            RoomChange::QueueUpdated,
        ]))
    }

    /// Ephemeral; does not touch `revision`.
    pub fn react(
        &mut self,
        connection_id: &ConnectionId,
        emoji: Emoji,
    ) -> Result<Vec<RoomChange>, RoomError> {
        let participant = self.participant(connection_id)?;
        let identity = participant.identity.clone();
        let display_name = participant.profile.display_name().to_string();
        self.next_reaction_id += 1;
        Ok(vec![RoomChange::Reaction(Reaction {
            reaction_id: self.next_reaction_id,
            identity,
            display_name,
            emoji,
        })])
    }

    /// Creator only. Marks the final revision; the repository tears the
    /// room down afterwards.
    pub fn delete(&mut self, connection_id: &ConnectionId) -> Result<(), RoomError> {
        let identity = self.requester(connection_id)?;
        authority::ensure_creator(self, &identity, "delete_room")?;
        self.revision += 1;
        Ok(())
    }

    /// `true` once the room has been empty since before `cutoff`.
    pub fn is_idle_since(&self, cutoff: Timestamp) -> bool {
        self.participants.is_empty() && self.emptied_at.is_some_and(|t| t <= cutoff)
    }
}
