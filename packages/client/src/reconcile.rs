//! Reconciliation Engine
//!
//! クライアント側のルーム状態レプリカを管理するステートマシン。
//!
//! - スナップショットは全体を置き換える
//! - 部分更新は対象スライス（queue / transport / dj_set / requests / participants）
//!   を丸ごと置き換える（last-write-wins、差分マージはしない）
//! - 楽観的な表示は `PendingOverlay` に分離し、同じスライスの権威ある更新が
//!   届いたら破棄する
//! - 古い revision のエンベロープは捨てる

use groove_shared::protocol::{
    ClientMessage, JoinRejectReason, ProfileDto, ReactionDto, RoomEnvelope, RoomEvent,
    RoomSnapshotDto, SongRequestDto, TrackDto, TransportAction,
};

use crate::{command::UserCommand, playback::PlaybackDriver};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Disconnected,
    /// Waiting for the first snapshot
    Joining,
    /// Waiting for a fresh snapshot after a reconnect
    Resyncing,
    Synced,
    Left,
    Rejected,
}

/// What an incoming envelope changed
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Ignored,
    Synced,
    Queue,
    Track(Option<TrackDto>),
    Transport(TransportAction),
    DjSet,
    Requests,
    Participants,
    Reaction(ReactionDto),
    Deleted,
}

/// Locally issued changes not yet confirmed by the coordinator
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PendingOverlay {
    pub queue: Vec<TrackDto>,
    pub requests: Vec<TrackDto>,
}

/// One line of the queue as displayed
#[derive(Debug, Clone, PartialEq)]
pub struct QueueLine {
    /// `None` while only optimistic
    pub entry_id: Option<u64>,
    pub track: TrackDto,
}

/// Read-only projection for display
#[derive(Debug, Clone, PartialEq)]
pub struct RoomView {
    pub room_id: String,
    pub name: String,
    pub state: SyncState,
    pub is_dj: bool,
    pub current: Option<TrackDto>,
    pub is_playing: bool,
    pub position: f64,
    pub duration: f64,
    pub queue: Vec<QueueLine>,
    pub requests: Vec<SongRequestDto>,
    pub pending_requests: Vec<TrackDto>,
    pub dj_set: Vec<String>,
    pub listeners: Vec<String>,
}

pub struct Reconciler<D: PlaybackDriver> {
    room_id: String,
    identity: String,
    state: SyncState,
    replica: Option<RoomSnapshotDto>,
    last_revision: Option<u64>,
    /// Coordinator clock minus local clock, from the latest envelope
    clock_offset_millis: i64,
    pending: PendingOverlay,
    /// Buffered position while a scrub gesture is in progress
    scrub: Option<f64>,
    loaded_entry: Option<u64>,
    driver: D,
}

impl<D: PlaybackDriver> Reconciler<D> {
    pub fn new(room_id: impl Into<String>, identity: impl Into<String>, driver: D) -> Self {
        Self {
            room_id: room_id.into(),
            identity: identity.into(),
            state: SyncState::Disconnected,
            replica: None,
            last_revision: None,
            clock_offset_millis: 0,
            pending: PendingOverlay::default(),
            scrub: None,
            loaded_entry: None,
            driver,
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn replica(&self) -> Option<&RoomSnapshotDto> {
        self.replica.as_ref()
    }

    pub fn pending(&self) -> &PendingOverlay {
        &self.pending
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Cached DJ flag for display. The coordinator enforces the real check.
    pub fn is_dj(&self) -> bool {
        self.replica
            .as_ref()
            .is_some_and(|r| r.dj_set.iter().any(|id| id == &self.identity))
    }

    /// Start the join handshake. Any previous replica is discarded.
    pub fn begin_join(&mut self, profile: ProfileDto) -> ClientMessage {
        self.state = match self.state {
            SyncState::Disconnected if self.last_revision.is_some() => SyncState::Resyncing,
            _ => SyncState::Joining,
        };
        self.replica = None;
        self.last_revision = None;
        self.pending = PendingOverlay::default();
        self.scrub = None;
        ClientMessage::JoinRoom {
            room_id: self.room_id.clone(),
            identity: self.identity.clone(),
            profile,
        }
    }

    /// The connection dropped; local state is stale until the next snapshot.
    pub fn disconnected(&mut self) {
        if matches!(self.state, SyncState::Left | SyncState::Rejected) {
            return;
        }
        tracing::info!("Lost connection to room '{}'", self.room_id);
        self.state = SyncState::Disconnected;
        self.replica = None;
        self.pending = PendingOverlay::default();
        self.scrub = None;
    }

    pub fn reject(&mut self, reason: JoinRejectReason) {
        tracing::warn!("Join of '{}' rejected: {:?}", self.room_id, reason);
        self.abandon(SyncState::Rejected);
    }

    pub fn leave(&mut self) -> ClientMessage {
        self.abandon(SyncState::Left);
        ClientMessage::LeaveRoom {
            room_id: self.room_id.clone(),
        }
    }

    fn abandon(&mut self, state: SyncState) {
        self.state = state;
        self.replica = None;
        self.pending = PendingOverlay::default();
        self.scrub = None;
        self.loaded_entry = None;
        self.driver.pause();
    }

    /// Apply one envelope from the coordinator.
    pub fn apply(&mut self, envelope: RoomEnvelope, local_now: i64) -> Outcome {
        if envelope.room_id != self.room_id {
            tracing::debug!("Ignoring envelope for other room '{}'", envelope.room_id);
            return Outcome::Ignored;
        }
        if !matches!(
            self.state,
            SyncState::Joining | SyncState::Resyncing | SyncState::Synced
        ) {
            return Outcome::Ignored;
        }
        if let Some(last) = self.last_revision
            && envelope.revision < last
        {
            tracing::debug!(
                "Dropping stale revision {} (last applied {})",
                envelope.revision,
                last
            );
            return Outcome::Ignored;
        }

        let is_snapshot = matches!(envelope.event, RoomEvent::Snapshot(_));
        if self.replica.is_none() && !is_snapshot && !envelope.event.is_terminal() {
            // Partial updates mean nothing before the first snapshot.
            return Outcome::Ignored;
        }

        self.clock_offset_millis = envelope.server_time - local_now;
        self.last_revision = Some(envelope.revision);

        match envelope.event {
            RoomEvent::Snapshot(snapshot) => {
                self.replica = Some(snapshot);
                self.state = SyncState::Synced;
                self.pending = PendingOverlay::default();
                self.sync_driver(local_now);
                Outcome::Synced
            }
            RoomEvent::QueueUpdated(queue) => {
                self.with_replica(|r| r.queue = queue);
                self.pending.queue.clear();
                Outcome::Queue
            }
            RoomEvent::TrackChanged { current, transport } => {
                let track = current.as_ref().map(|e| e.track.clone());
                self.with_replica(|r| {
                    r.current = current;
                    r.transport = transport;
                });
                self.sync_driver(local_now);
                Outcome::Track(track)
            }
            RoomEvent::Transport { action, transport } => {
                self.with_replica(|r| r.transport = transport);
                self.sync_driver(local_now);
                Outcome::Transport(action)
            }
            RoomEvent::DjSetUpdated(dj_set) => {
                self.with_replica(|r| r.dj_set = dj_set);
                Outcome::DjSet
            }
            RoomEvent::RequestsUpdated(requests) => {
                self.with_replica(|r| r.song_requests = requests);
                self.pending.requests.clear();
                Outcome::Requests
            }
            RoomEvent::ParticipantsUpdated(participants) => {
                self.with_replica(|r| r.participants = participants);
                Outcome::Participants
            }
            RoomEvent::Reaction(reaction) => Outcome::Reaction(reaction),
            RoomEvent::RoomDeleted => {
                tracing::info!("Room '{}' was deleted", self.room_id);
                self.abandon(SyncState::Left);
                Outcome::Deleted
            }
        }
    }

    fn with_replica(&mut self, update: impl FnOnce(&mut RoomSnapshotDto)) {
        if let Some(replica) = self.replica.as_mut() {
            update(replica);
        }
    }

    /// Coordinator time estimated from the local clock
    fn server_now(&self, local_now: i64) -> i64 {
        local_now + self.clock_offset_millis
    }

    /// Drive the player to the replica's current track and transport.
    fn sync_driver(&mut self, local_now: i64) {
        let Some(replica) = self.replica.as_ref() else {
            return;
        };
        let Some(entry) = replica.current.as_ref() else {
            self.loaded_entry = None;
            self.driver.pause();
            return;
        };
        let entry_id = entry.entry_id;
        let media_id = entry.track.media_id.clone();
        let transport = replica.transport;
        let position = transport.position_at(self.server_now(local_now));

        if self.loaded_entry != Some(entry_id) {
            self.driver.load(&media_id);
            self.loaded_entry = Some(entry_id);
        }
        self.driver.seek(position);
        if transport.is_playing {
            self.driver.play();
        } else {
            self.driver.pause();
        }
    }

    /// Position shown to the user
    pub fn position(&self) -> f64 {
        self.scrub.unwrap_or_else(|| self.driver.position())
    }

    /// Periodic sampling. Returns a command only when a DJ's player
    /// reports the end of the current track.
    pub fn on_tick(&mut self) -> Option<ClientMessage> {
        if self.state != SyncState::Synced || self.scrub.is_some() {
            return None;
        }
        if !self.driver.take_ended() {
            return None;
        }
        if !self.is_dj() {
            tracing::debug!("Track ended; waiting for a DJ to advance");
            return None;
        }
        Some(self.next_song())
    }

    pub fn begin_scrub(&mut self) {
        self.scrub = Some(self.driver.position());
    }

    /// Move the scrub handle without sending anything
    pub fn scrub_to(&mut self, seconds: f64) {
        if self.scrub.is_some() {
            self.scrub = Some(seconds.max(0.0));
        }
    }

    /// Finish the gesture with a single seek. Non-DJs only move locally
    /// until the next broadcast corrects them.
    pub fn end_scrub(&mut self) -> Option<ClientMessage> {
        let position = self.scrub.take()?;
        if !self.is_dj() {
            tracing::warn!("Only DJs can seek in '{}'", self.room_id);
            return None;
        }
        self.driver.seek(position);
        Some(ClientMessage::SendSeek {
            room_id: self.room_id.clone(),
            position,
        })
    }

    /// `next_song` guarded by the entry this client believes is playing
    pub fn next_song(&self) -> ClientMessage {
        ClientMessage::NextSong {
            room_id: self.room_id.clone(),
            current_entry_id: self
                .replica
                .as_ref()
                .and_then(|r| r.current.as_ref())
                .map(|e| e.entry_id),
        }
    }

    /// Translate a user command into the message to send, if any.
    pub fn command(&mut self, command: UserCommand) -> Option<ClientMessage> {
        let room_id = self.room_id.clone();
        let message = match command {
            UserCommand::Add(track) => {
                self.pending.queue.push(track.clone());
                ClientMessage::AddToQueue { room_id, track }
            }
            UserCommand::Remove(entry_id) => ClientMessage::RemoveFromQueue { room_id, entry_id },
            UserCommand::Shuffle => ClientMessage::ShuffleQueue { room_id },
            UserCommand::Next => self.next_song(),
            UserCommand::Play(position) => ClientMessage::SendPlay {
                room_id,
                position: position.unwrap_or_else(|| self.position()),
            },
            UserCommand::Pause => ClientMessage::SendPause {
                room_id,
                position: Some(self.position()),
            },
            UserCommand::Seek(seconds) => {
                self.begin_scrub();
                self.scrub_to(seconds);
                return self.end_scrub();
            }
            UserCommand::Grant(target_identity) => ClientMessage::GrantDjPermission {
                room_id,
                target_identity,
            },
            UserCommand::Revoke(target_identity) => ClientMessage::RevokeDjPermission {
                room_id,
                target_identity,
            },
            UserCommand::Request(track) => {
                self.pending.requests.push(track.clone());
                ClientMessage::RequestSong { room_id, track }
            }
            UserCommand::Accept(request_id) => ClientMessage::AcceptRequest {
                room_id,
                request_id,
            },
            UserCommand::Decline(request_id) => ClientMessage::DeclineRequest {
                room_id,
                request_id,
            },
            UserCommand::React(emoji) => ClientMessage::SendReaction { room_id, emoji },
            UserCommand::Delete => ClientMessage::DeleteRoom { room_id },
            UserCommand::Queue | UserCommand::Status | UserCommand::Quit => return None,
        };
        Some(message)
    }

    pub fn view(&self) -> RoomView {
        let replica = self.replica.as_ref();
        let mut queue: Vec<QueueLine> = replica
            .map(|r| {
                r.queue
                    .iter()
                    .map(|e| QueueLine {
                        entry_id: Some(e.entry_id),
                        track: e.track.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        queue.extend(self.pending.queue.iter().map(|track| QueueLine {
            entry_id: None,
            track: track.clone(),
        }));

        RoomView {
            room_id: self.room_id.clone(),
            name: replica.map(|r| r.name.clone()).unwrap_or_default(),
            state: self.state,
            is_dj: self.is_dj(),
            current: replica.and_then(|r| r.current.as_ref().map(|e| e.track.clone())),
            is_playing: replica.is_some_and(|r| r.transport.is_playing),
            position: self.position(),
            duration: self.driver.duration(),
            queue,
            requests: replica.map(|r| r.song_requests.clone()).unwrap_or_default(),
            pending_requests: self.pending.requests.clone(),
            dj_set: replica.map(|r| r.dj_set.clone()).unwrap_or_default(),
            listeners: replica
                .map(|r| r.participants.iter().map(|p| p.display_name.clone()).collect())
                .unwrap_or_default(),
        }
    }
}
