//! Groove room server library.
//!
//! Coordinates synchronized listening rooms: room state, DJ authority,
//! queue and playback commands, and ordered fan-out of room events over
//! WebSocket.

pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

// Re-export entry points
pub use config::ServerConfig;
pub use error::ServerError;
pub use ui::{run, serve};
