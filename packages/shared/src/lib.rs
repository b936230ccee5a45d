//! Shared building blocks for the Groove server and client.
//!
//! The wire protocol lives here so both ends agree on a single message
//! schema, together with the logger bootstrap and wall-clock helpers.

pub mod logger;
pub mod protocol;
pub mod time;
