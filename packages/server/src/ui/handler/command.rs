//! Dispatch of decoded client commands to the use cases.
//!
//! Failures are turned into unicast replies for the issuing connection;
//! nothing here writes to the room broadcast stream directly.

use std::{collections::HashSet, sync::Arc};

use groove_shared::protocol::{ClientMessage, ErrorCode, ProfileDto, ServerMessage};
use tokio::sync::{Mutex, mpsc::UnboundedSender};

use crate::{
    domain::{
        ConnectionId, Emoji, EntryId, Identity, Position, RequestId, RoomId, RoomSettings,
        TransportCommand,
    },
    infrastructure::dto::websocket::{profile_from_dto, track_from_dto},
    ui::state::AppState,
    usecase::{
        CommandError, ControlPlaybackUseCase, CreateRoomUseCase, DeleteRoomUseCase, JoinError,
        JoinRoomUseCase, LeaveRoomUseCase, ManageDjUseCase, ManageQueueUseCase,
        SendReactionUseCase, SongRequestUseCase,
    },
};

/// Everything a command needs to know about the connection that sent it
pub struct ConnectionContext {
    pub state: Arc<AppState>,
    pub connection_id: ConnectionId,
    /// Identity bound at the WebSocket handshake
    pub identity: Identity,
    pub sender: UnboundedSender<String>,
    /// Rooms this connection has joined, left on disconnect
    pub joined_rooms: Arc<Mutex<HashSet<RoomId>>>,
}

impl ConnectionContext {
    /// Decode and execute one text frame, returning the unicast reply if any.
    pub async fn handle_text(&self, text: &str) -> Option<ServerMessage> {
        let message = match serde_json::from_str::<ClientMessage>(text) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!("Malformed message from '{}': {}", self.connection_id, e);
                return Some(ServerMessage::CommandRejected {
                    room_id: String::new(),
                    command: "unknown".to_string(),
                    code: ErrorCode::Malformed,
                    message: e.to_string(),
                });
            }
        };
        tracing::debug!(
            "'{}' -> {} ({})",
            self.connection_id,
            message.name(),
            message.room_id()
        );
        self.dispatch(message).await
    }

    pub async fn dispatch(&self, message: ClientMessage) -> Option<ServerMessage> {
        if let ClientMessage::JoinRoom {
            room_id,
            identity,
            profile,
        } = &message
        {
            return match self.join(room_id, identity, profile).await {
                Ok(()) => None,
                Err(e) => {
                    tracing::warn!("Join of '{}' by '{}' rejected: {}", room_id, self.identity, e);
                    Some(ServerMessage::JoinRejected {
                        room_id: room_id.clone(),
                        reason: e.reason(),
                        message: e.to_string(),
                    })
                }
            };
        }

        let command = message.name();
        let room_id = message.room_id().to_string();
        match self.execute(message).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(
                    "Command {} in '{}' from '{}' rejected: {}",
                    command,
                    room_id,
                    self.identity,
                    e
                );
                Some(ServerMessage::CommandRejected {
                    room_id,
                    command: command.to_string(),
                    code: e.code(),
                    message: e.to_string(),
                })
            }
        }
    }

    async fn join(
        &self,
        room_id: &str,
        identity: &str,
        profile: &ProfileDto,
    ) -> Result<(), JoinError> {
        let room_id =
            RoomId::new(room_id).map_err(|_| JoinError::RoomNotFound(room_id.to_string()))?;
        let requested = Identity::new(identity).map_err(|_| JoinError::IdentityMismatch {
            connected: self.identity.to_string(),
            requested: identity.to_string(),
        })?;
        let profile = profile_from_dto(profile)?;

        JoinRoomUseCase::new(self.state.repository.clone())
            .execute(
                self.connection_id.clone(),
                &self.identity,
                &room_id,
                requested,
                profile,
                self.sender.clone(),
            )
            .await?;
        tracing::info!("'{}' joined room '{}'", self.identity, room_id);
        self.joined_rooms.lock().await.insert(room_id);
        Ok(())
    }

    async fn execute(&self, message: ClientMessage) -> Result<Option<ServerMessage>, CommandError> {
        let room_id = RoomId::new(message.room_id())?;
        let repository = self.state.repository.clone();
        let connection_id = self.connection_id.clone();

        match message {
            // handled by `dispatch`
            ClientMessage::JoinRoom { .. } => {}
            ClientMessage::CreateRoom { config, .. } => {
                let settings = RoomSettings::new(
                    config.name.as_deref(),
                    config.is_public,
                    config.tags,
                    &config.description,
                )?;
                let room_id = CreateRoomUseCase::new(repository, self.state.limits)
                    .execute(self.identity.clone(), room_id, settings)
                    .await?;
                return Ok(Some(ServerMessage::RoomCreated {
                    room_id: room_id.to_string(),
                }));
            }
            ClientMessage::LeaveRoom { .. } => {
                LeaveRoomUseCase::new(repository)
                    .execute(&connection_id, &room_id)
                    .await?;
                self.joined_rooms.lock().await.remove(&room_id);
            }
            ClientMessage::AddToQueue { track, .. } => {
                ManageQueueUseCase::new(repository)
                    .add(connection_id, &room_id, track_from_dto(&track)?)
                    .await?;
            }
            ClientMessage::RemoveFromQueue { entry_id, .. } => {
                ManageQueueUseCase::new(repository)
                    .remove(connection_id, &room_id, EntryId::new(entry_id))
                    .await?;
            }
            ClientMessage::ShuffleQueue { .. } => {
                ManageQueueUseCase::new(repository)
                    .shuffle(connection_id, &room_id)
                    .await?;
            }
            ClientMessage::NextSong {
                current_entry_id, ..
            } => {
                ControlPlaybackUseCase::new(repository)
                    .next(connection_id, &room_id, current_entry_id.map(EntryId::new))
                    .await?;
            }
            ClientMessage::SendPlay { position, .. } => {
                let command = TransportCommand::Play(Position::new(position)?);
                ControlPlaybackUseCase::new(repository)
                    .transport(connection_id, &room_id, command)
                    .await?;
            }
            ClientMessage::SendPause { position, .. } => {
                let command = TransportCommand::Pause(position.map(Position::new).transpose()?);
                ControlPlaybackUseCase::new(repository)
                    .transport(connection_id, &room_id, command)
                    .await?;
            }
            ClientMessage::SendSeek { position, .. } => {
                let command = TransportCommand::Seek(Position::new(position)?);
                ControlPlaybackUseCase::new(repository)
                    .transport(connection_id, &room_id, command)
                    .await?;
            }
            ClientMessage::GrantDjPermission {
                target_identity, ..
            } => {
                ManageDjUseCase::new(repository)
                    .grant(connection_id, &room_id, Identity::new(&target_identity)?)
                    .await?;
            }
            ClientMessage::RevokeDjPermission {
                target_identity, ..
            } => {
                ManageDjUseCase::new(repository)
                    .revoke(connection_id, &room_id, Identity::new(&target_identity)?)
                    .await?;
            }
            ClientMessage::RequestSong { track, .. } => {
                SongRequestUseCase::new(repository)
                    .submit(connection_id, &room_id, track_from_dto(&track)?)
                    .await?;
            }
            ClientMessage::AcceptRequest { request_id, .. } => {
                SongRequestUseCase::new(repository)
                    .resolve(connection_id, &room_id, RequestId::new(request_id), true)
                    .await?;
            }
            ClientMessage::DeclineRequest { request_id, .. } => {
                SongRequestUseCase::new(repository)
                    .resolve(connection_id, &room_id, RequestId::new(request_id), false)
                    .await?;
            }
            ClientMessage::DeleteRoom { .. } => {
                DeleteRoomUseCase::new(repository)
                    .execute(&connection_id, &room_id)
                    .await?;
                self.joined_rooms.lock().await.remove(&room_id);
            }
            ClientMessage::SendReaction { emoji, .. } => {
                SendReactionUseCase::new(repository)
                    .execute(connection_id, &room_id, Emoji::new(&emoji)?)
                    .await?;
            }
        }
        Ok(None)
    }

    /// Leave every joined room; called once the socket is gone.
    pub async fn leave_all(&self) {
        let rooms: Vec<RoomId> = self.joined_rooms.lock().await.drain().collect();
        let usecase = LeaveRoomUseCase::new(self.state.repository.clone());
        for room_id in rooms {
            if let Err(e) = usecase.execute(&self.connection_id, &room_id).await {
                tracing::debug!("Skipping leave of '{}': {}", room_id, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{RoomLimits, RoomRepository},
        infrastructure::repository::InMemoryRoomRepository,
    };
    use groove_shared::protocol::{JoinRejectReason, RoomEvent};
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    fn context(
        state: &Arc<AppState>,
        connection_id: &str,
        identity: &str,
    ) -> (ConnectionContext, UnboundedReceiver<String>) {
        let (sender, rx) = mpsc::unbounded_channel();
        (
            ConnectionContext {
                state: state.clone(),
                connection_id: ConnectionId::new(connection_id.to_string()),
                identity: Identity::new(identity).unwrap(),
                sender,
                joined_rooms: Arc::new(Mutex::new(HashSet::new())),
            },
            rx,
        )
    }

    fn create_test_state() -> Arc<AppState> {
        Arc::new(AppState::new(
            Arc::new(InMemoryRoomRepository::new()),
            RoomLimits::default(),
        ))
    }

    fn parse(json: &str) -> ClientMessage {
        serde_json::from_str(json).unwrap()
    }

    #[tokio::test]
    async fn test_create_then_join() {
        // テスト項目: create_room には room_created が返り、join_room でスナップショットが届く
        // given (前提条件):
        let state = create_test_state();
        let (u1, mut rx) = context(&state, "c1", "u1");

        // when (操作):
        let created = u1
            .dispatch(parse(r#"{"type":"create_room","room_id":"Chill"}"#))
            .await;
        let joined = u1
            .dispatch(parse(
                r##"{"type":"join_room","room_id":"chill","identity":"u1","profile":{"display_name":"DJ","color":"#fff"}}"##,
            ))
            .await;

        // then (期待する結果):
        assert_eq!(
            created,
            Some(ServerMessage::RoomCreated {
                room_id: "chill".to_string()
            })
        );
        assert_eq!(joined, None);
        let message: ServerMessage = serde_json::from_str(&rx.try_recv().unwrap()).unwrap();
        assert!(matches!(
            message,
            ServerMessage::Room(envelope) if matches!(envelope.event, RoomEvent::Snapshot(_))
        ));
        assert!(u1.joined_rooms.lock().await.contains(&RoomId::new("chill").unwrap()));
    }

    #[tokio::test]
    async fn test_join_with_other_identity_is_rejected() {
        // テスト項目: コネクションと異なる Identity での join_room は join_rejected になる
        // given (前提条件):
        let state = create_test_state();
        let (u1, _rx1) = context(&state, "c1", "u1");
        u1.dispatch(parse(r#"{"type":"create_room","room_id":"chill"}"#))
            .await;
        let (u2, _rx2) = context(&state, "c2", "u2");

        // when (操作):
        let reply = u2
            .dispatch(parse(
                r#"{"type":"join_room","room_id":"chill","identity":"u1","profile":{"display_name":"x","color":""}}"#,
            ))
            .await;

        // then (期待する結果):
        match reply {
            Some(ServerMessage::JoinRejected { reason, .. }) => {
                assert_eq!(reason, JoinRejectReason::IdentityMismatch)
            }
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_command_before_join_is_forbidden() {
        // テスト項目: 参加していないルームへのコマンドは forbidden で拒否される
        // given (前提条件):
        let state = create_test_state();
        let (u1, _rx) = context(&state, "c1", "u1");
        u1.dispatch(parse(r#"{"type":"create_room","room_id":"chill"}"#))
            .await;

        // when (操作):
        let reply = u1
            .dispatch(parse(
                r#"{"type":"add_to_queue","room_id":"chill","track":{"media_id":"a","title":"A"}}"#,
            ))
            .await;

        // then (期待する結果):
        match reply {
            Some(ServerMessage::CommandRejected { command, code, .. }) => {
                assert_eq!(command, "add_to_queue");
                assert_eq!(code, ErrorCode::Forbidden);
            }
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_and_invalid_input() {
        let state = create_test_state();
        let (u1, _rx) = context(&state, "c1", "u1");

        match u1.handle_text("not json").await {
            Some(ServerMessage::CommandRejected { code, .. }) => {
                assert_eq!(code, ErrorCode::Malformed)
            }
            other => panic!("unexpected reply: {other:?}"),
        }
        match u1
            .handle_text(r#"{"type":"send_seek","room_id":"chill","position":-3.0}"#)
            .await
        {
            Some(ServerMessage::CommandRejected { code, .. }) => {
                assert_eq!(code, ErrorCode::InvalidInput)
            }
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_leave_all_on_disconnect() {
        // テスト項目: 切断時には参加中の全ルームから退出する
        // given (前提条件):
        let state = create_test_state();
        let (u1, _rx) = context(&state, "c1", "u1");
        for room in ["a", "b"] {
            u1.dispatch(parse(&format!(r#"{{"type":"create_room","room_id":"{room}"}}"#)))
                .await;
            u1.dispatch(parse(&format!(
                r#"{{"type":"join_room","room_id":"{room}","identity":"u1","profile":{{"display_name":"u1","color":""}}}}"#
            )))
            .await;
        }

        // when (操作):
        u1.leave_all().await;

        // then (期待する結果):
        for room in ["a", "b"] {
            let room = state
                .repository
                .get_room(&RoomId::new(room).unwrap())
                .await
                .unwrap();
            assert!(room.participants.is_empty());
        }
        assert!(u1.joined_rooms.lock().await.is_empty());
    }
}
