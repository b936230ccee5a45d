//! Room session loop.
//!
//! Owns one [`Reconciler`] and, while online, one [`RoomConnection`]. Server
//! messages, user commands and the one-second player tick are handled on
//! a single task, so the reconciler never runs concurrently with itself.
//! A dropped connection is retried with backoff and a full re-join.

use std::time::Duration;

use groove_shared::{
    protocol::{ClientMessage, ErrorCode, ProfileDto, RoomConfigDto, ServerMessage},
    time::now_millis,
};
use tokio::sync::mpsc;

use crate::{
    command::UserCommand,
    connection::RoomConnection,
    error::ClientError,
    playback::PlaybackDriver,
    reconcile::{Outcome, Reconciler, RoomView, SyncState},
};

pub const JOIN_TIMEOUT: Duration = Duration::from_secs(10);
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);
const INITIAL_BACKOFF: Duration = Duration::from_millis(500);
const MAX_BACKOFF: Duration = Duration::from_secs(15);

/// Something the front end should show
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Notice(String),
    Room(Outcome),
    Rejected {
        command: String,
        code: ErrorCode,
        message: String,
    },
    View(RoomView),
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub url: String,
    pub room_id: String,
    /// Create the room with this config before the first join
    pub create: Option<RoomConfigDto>,
    pub join_timeout: Duration,
    pub tick: Duration,
}

enum Exit {
    Quit,
}

pub struct Session<D: PlaybackDriver> {
    config: SessionConfig,
    profile: ProfileDto,
    reconciler: Reconciler<D>,
    events: mpsc::UnboundedSender<SessionEvent>,
}

impl<D: PlaybackDriver> Session<D> {
    pub fn new(
        config: SessionConfig,
        identity: &str,
        profile: ProfileDto,
        driver: D,
        events: mpsc::UnboundedSender<SessionEvent>,
    ) -> Self {
        let reconciler = Reconciler::new(config.room_id.clone(), identity, driver);
        Self {
            config,
            profile,
            reconciler,
            events,
        }
    }

    fn emit(&self, event: SessionEvent) {
        // The front end may already be gone during shutdown.
        let _ = self.events.send(event);
    }

    /// Run until the user quits or the room ends for good.
    pub async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<UserCommand>,
    ) -> Result<(), ClientError> {
        let mut backoff = INITIAL_BACKOFF;
        let mut ever_synced = false;

        loop {
            let result = match RoomConnection::connect(&self.config.url).await {
                Ok(mut connection) => {
                    let result = self
                        .online(&mut connection, &mut commands, &mut ever_synced)
                        .await;
                    if result.is_ok() {
                        connection.close().await;
                    }
                    result
                }
                Err(e) => Err(e),
            };

            match result {
                Ok(Exit::Quit) => return Ok(()),
                Err(e) if e.is_terminal() => return Err(e),
                Err(e) if !ever_synced => return Err(e),
                Err(e) => {
                    tracing::warn!("Connection to '{}' lost: {}", self.config.room_id, e);
                    self.reconciler.disconnected();
                    self.emit(SessionEvent::Notice(format!(
                        "connection lost, retrying in {:.1}s",
                        backoff.as_secs_f64()
                    )));
                }
            }

            // Wait out the backoff, still honouring /quit
            let deadline = tokio::time::sleep(backoff);
            tokio::pin!(deadline);
            loop {
                tokio::select! {
                    _ = &mut deadline => break,
                    command = commands.recv() => match command {
                        None | Some(UserCommand::Quit) => return Ok(()),
                        Some(_) => self.emit(SessionEvent::Notice(
                            "offline, command dropped".to_string(),
                        )),
                    },
                }
            }
            backoff = (backoff * 2).min(MAX_BACKOFF);
        }
    }

    async fn online(
        &mut self,
        connection: &mut RoomConnection,
        commands: &mut mpsc::UnboundedReceiver<UserCommand>,
        ever_synced: &mut bool,
    ) -> Result<Exit, ClientError> {
        if let Some(config) = self.config.create.take() {
            self.create(connection, config).await?;
        }

        tokio::time::timeout(self.config.join_timeout, self.join(connection))
            .await
            .map_err(|_| ClientError::Timeout("room snapshot"))??;
        *ever_synced = true;
        self.emit(SessionEvent::View(self.reconciler.view()));

        let mut ticker = tokio::time::interval(self.config.tick);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                message = connection.recv() => {
                    let Some(message) = message else {
                        return Err(ClientError::closed());
                    };
                    self.handle_server(message)?;
                }
                command = commands.recv() => {
                    match command {
                        None | Some(UserCommand::Quit) => {
                            connection.send(self.reconciler.leave())?;
                            return Ok(Exit::Quit);
                        }
                        Some(command) => self.handle_user(connection, command)?,
                    }
                }
                _ = ticker.tick() => {
                    if let Some(message) = self.reconciler.on_tick() {
                        tracing::info!("Track ended, asking for the next one");
                        connection.send(message)?;
                    }
                }
            }
        }
    }

    async fn create(
        &mut self,
        connection: &mut RoomConnection,
        config: RoomConfigDto,
    ) -> Result<(), ClientError> {
        connection.send(ClientMessage::CreateRoom {
            room_id: self.config.room_id.clone(),
            config,
        })?;
        loop {
            match connection.recv().await {
                Some(ServerMessage::RoomCreated { room_id }) => {
                    self.emit(SessionEvent::Notice(format!("created room '{room_id}'")));
                    return Ok(());
                }
                Some(ServerMessage::CommandRejected { code, message, .. }) => {
                    // An existing room is joined as is.
                    if code != ErrorCode::AlreadyExists {
                        tracing::warn!("create_room rejected: {}", message);
                    }
                    self.emit(SessionEvent::Notice(message));
                    return Ok(());
                }
                Some(other) => tracing::debug!("Ignoring {:?} while creating", other),
                None => {
                    return Err(ClientError::closed());
                }
            }
        }
    }

    /// Blocks until the snapshot or a rejection arrives
    async fn join(&mut self, connection: &mut RoomConnection) -> Result<(), ClientError> {
        connection.send(self.reconciler.begin_join(self.profile.clone()))?;
        loop {
            let Some(message) = connection.recv().await else {
                return Err(ClientError::closed());
            };
            match message {
                ServerMessage::JoinRejected {
                    reason, message, ..
                } => {
                    self.reconciler.reject(reason);
                    return Err(ClientError::JoinRejected { reason, message });
                }
                other => {
                    self.handle_server(other)?;
                    if self.reconciler.state() == SyncState::Synced {
                        tracing::info!("Joined room '{}'", self.config.room_id);
                        return Ok(());
                    }
                }
            }
        }
    }

    fn handle_server(&mut self, message: ServerMessage) -> Result<(), ClientError> {
        match message {
            ServerMessage::Room(envelope) => {
                match self.reconciler.apply(envelope, now_millis()) {
                    Outcome::Ignored => {}
                    Outcome::Deleted => {
                        self.emit(SessionEvent::Room(Outcome::Deleted));
                        return Err(ClientError::RoomDeleted(self.config.room_id.clone()));
                    }
                    outcome => self.emit(SessionEvent::Room(outcome)),
                }
            }
            ServerMessage::CommandRejected {
                command,
                code,
                message,
                ..
            } => {
                tracing::warn!("{} rejected ({:?}): {}", command, code, message);
                self.emit(SessionEvent::Rejected {
                    command,
                    code,
                    message,
                });
            }
            ServerMessage::JoinRejected {
                reason, message, ..
            } => {
                self.reconciler.reject(reason);
                return Err(ClientError::JoinRejected { reason, message });
            }
            ServerMessage::RoomCreated { room_id } => {
                tracing::debug!("Room '{}' created", room_id);
            }
        }
        Ok(())
    }

    fn handle_user(
        &mut self,
        connection: &RoomConnection,
        command: UserCommand,
    ) -> Result<(), ClientError> {
        match command {
            UserCommand::Queue | UserCommand::Status => {
                self.emit(SessionEvent::View(self.reconciler.view()));
            }
            command => {
                if let Some(message) = self.reconciler.command(command) {
                    connection.send(message)?;
                }
            }
        }
        Ok(())
    }
}
