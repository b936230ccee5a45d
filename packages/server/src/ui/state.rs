//! Server state and connection parameters.

use serde::Deserialize;
use std::sync::Arc;

use crate::domain::{RoomLimits, RoomRepository};

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    /// Account id or persisted guest id; fixed for the connection's lifetime
    pub identity: String,
}

/// Shared application state
pub struct AppState {
    /// Repository（データアクセス層の抽象化）
    pub repository: Arc<dyn RoomRepository>,
    /// Capacities applied to newly created rooms
    pub limits: RoomLimits,
}

impl AppState {
    pub fn new(repository: Arc<dyn RoomRepository>, limits: RoomLimits) -> Self {
        Self { repository, limits }
    }
}
