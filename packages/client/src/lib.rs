//! Groove listening-room client.
//!
//! Resolves the local identity, joins a room over WebSocket, keeps a
//! reconciled replica of the room and drives a playback engine from it.

pub mod command;
pub mod config;
pub mod connection;
pub mod display;
pub mod error;
pub mod identity;
pub mod playback;
pub mod reconcile;
pub mod session;

pub use config::ClientConfig;
pub use error::ClientError;
pub use session::{Session, SessionConfig, SessionEvent};
