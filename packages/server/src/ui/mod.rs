//! WebSocket room server implementation.

mod handler;
mod runner;
mod signal;
pub mod state; // UseCase 層からアクセスするため public に変更

pub use runner::{build_app, run, serve};
