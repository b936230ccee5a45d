//! Command-line configuration for the CLI client.

use std::path::PathBuf;

use clap::Parser;
use url::Url;

use crate::error::ClientError;

/// Groove listening-room client
#[derive(Debug, Clone, Parser)]
#[command(name = "groove-client", version, about, long_about = None)]
pub struct ClientConfig {
    /// Coordinator base URL
    #[arg(short, long, default_value = "ws://127.0.0.1:3000", env = "GROOVE_SERVER")]
    pub server: String,

    /// Room to join
    #[arg(short, long)]
    pub room: String,

    /// Create the room before joining
    #[arg(long)]
    pub create: bool,

    /// Hide a created room from discovery
    #[arg(long, requires = "create")]
    pub private: bool,

    /// Authenticated account id; takes precedence over the guest id
    #[arg(long, env = "GROOVE_ACCOUNT_ID")]
    pub account_id: Option<String>,

    /// Display name to use (persisted)
    #[arg(short, long)]
    pub name: Option<String>,

    /// Display color to use (persisted)
    #[arg(long)]
    pub color: Option<String>,

    /// Directory holding the persisted guest profile
    #[arg(long, env = "GROOVE_PROFILE_DIR")]
    pub profile_dir: Option<PathBuf>,

    /// Simulated track length in seconds
    #[arg(long, default_value_t = 180.0)]
    pub track_seconds: f64,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, default_value = "warn", env = "GROOVE_LOG_LEVEL")]
    pub log_level: String,
}

impl ClientConfig {
    /// WebSocket endpoint for the given identity
    pub fn ws_url(&self, identity: &str) -> Result<String, ClientError> {
        let invalid = || ClientError::InvalidServerUrl(self.server.clone());
        let mut url = Url::parse(&self.server).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .push("ws");
        url.query_pairs_mut().append_pair("identity", identity);
        Ok(url.into())
    }

    /// Profile directory, falling back to the current directory
    pub fn profile_path(&self) -> PathBuf {
        self.profile_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(crate::identity::PROFILE_FILE_NAME)
    }
}
