//! Groove room server.
//!
//! Hosts listening rooms and relays room events to every participant over WebSocket.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin groove-server -- --port 3000
//! ```

use clap::Parser;
use groove_server::ServerConfig;
use groove_shared::logger::setup_logger;

#[tokio::main]
async fn main() {
    let config = ServerConfig::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &config.log_level);

    // Run the server
    if let Err(e) = groove_server::run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
