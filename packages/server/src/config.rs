//! Command-line and environment configuration for the room server.

use std::time::Duration;

use clap::Parser;

use crate::domain::{
    DEFAULT_PARTICIPANT_CAPACITY, DEFAULT_QUEUE_CAPACITY, DEFAULT_REQUEST_CAPACITY, RoomLimits,
};

/// Groove room server
#[derive(Debug, Clone, Parser)]
#[command(name = "groove-server", version, about, long_about = None)]
pub struct ServerConfig {
    /// Address to bind
    #[arg(long, default_value = "0.0.0.0", env = "GROOVE_HOST")]
    pub host: String,

    /// Port to bind
    #[arg(short, long, default_value_t = 3000, env = "GROOVE_PORT")]
    pub port: u16,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, default_value = "info", env = "GROOVE_LOG_LEVEL")]
    pub log_level: String,

    /// Maximum participants per room
    #[arg(
        long,
        default_value_t = DEFAULT_PARTICIPANT_CAPACITY,
        env = "GROOVE_PARTICIPANT_CAPACITY"
    )]
    pub participant_capacity: usize,

    /// Maximum queued tracks per room
    #[arg(long, default_value_t = DEFAULT_QUEUE_CAPACITY, env = "GROOVE_QUEUE_CAPACITY")]
    pub queue_capacity: usize,

    /// Maximum song requests kept per room
    #[arg(long, default_value_t = DEFAULT_REQUEST_CAPACITY, env = "GROOVE_REQUEST_CAPACITY")]
    pub request_capacity: usize,

    /// Seconds an empty room is kept before removal (0 keeps rooms forever)
    #[arg(long, default_value_t = 300, env = "GROOVE_EMPTY_ROOM_RETENTION_SECS")]
    pub empty_room_retention_secs: u64,

    /// Seconds between idle-room sweeps
    #[arg(long, default_value_t = 30, env = "GROOVE_SWEEP_INTERVAL_SECS")]
    pub sweep_interval_secs: u64,
}

impl ServerConfig {
    pub fn room_limits(&self) -> RoomLimits {
        RoomLimits {
            participant_capacity: self.participant_capacity,
            queue_capacity: self.queue_capacity,
            request_capacity: self.request_capacity,
        }
    }

    pub fn empty_room_retention(&self) -> Duration {
        Duration::from_secs(self.empty_room_retention_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            participant_capacity: DEFAULT_PARTICIPANT_CAPACITY,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            request_capacity: DEFAULT_REQUEST_CAPACITY,
            empty_room_retention_secs: 300,
            sweep_interval_secs: 30,
        }
    }
}
