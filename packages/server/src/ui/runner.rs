//! Router assembly and server lifecycle.

use std::{future::Future, sync::Arc, time::Duration};

use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::{
    config::ServerConfig,
    domain::{RoomRepository, Timestamp},
    error::ServerError,
    infrastructure::repository::InMemoryRoomRepository,
    ui::{
        handler::{debug_room_state, get_room_detail, get_rooms, health_check, websocket_handler},
        signal::shutdown_signal,
        state::AppState,
    },
    usecase::SweepIdleRoomsUseCase,
};

/// Build the HTTP/WebSocket router over the given state
pub fn build_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ws", get(websocket_handler))
        .route("/api/health", get(health_check))
        .route("/api/rooms", get(get_rooms))
        .route("/api/rooms/{room_id}", get(get_room_detail))
        .route("/debug/rooms/{room_id}", get(debug_room_state))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Bind to the configured address and serve until SIGINT/SIGTERM
pub async fn run(config: ServerConfig) -> Result<(), ServerError> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.clone(),
            source,
        })?;

    serve(listener, &config, shutdown_signal()).await
}

/// Serve on an already-bound listener until `shutdown` resolves
pub async fn serve<F>(
    listener: TcpListener,
    config: &ServerConfig,
    shutdown: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    // Repository（データアクセス層の具象実装）
    let repository: Arc<dyn RoomRepository> = Arc::new(InMemoryRoomRepository::new());
    let state = Arc::new(AppState::new(repository.clone(), config.room_limits()));

    let sweeper = spawn_sweeper(
        repository,
        config.empty_room_retention(),
        config.sweep_interval(),
    );

    let app = build_app(state);

    match listener.local_addr() {
        Ok(addr) => tracing::info!("Listening on {}", addr),
        Err(e) => tracing::warn!("Could not read local address: {}", e),
    }

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await;

    if let Some(sweeper) = sweeper {
        sweeper.abort();
    }
    tracing::info!("Server stopped");
    Ok(result?)
}

fn spawn_sweeper(
    repository: Arc<dyn RoomRepository>,
    retention: Duration,
    interval: Duration,
) -> Option<tokio::task::JoinHandle<()>> {
    if retention.is_zero() {
        tracing::info!("Idle room sweeping disabled");
        return None;
    }

    let usecase = SweepIdleRoomsUseCase::new(repository, retention);
    let period = interval.max(Duration::from_secs(1));
    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let removed = usecase.execute(Timestamp::now()).await;
            if !removed.is_empty() {
                tracing::debug!("Sweep removed {} room(s)", removed.len());
            }
        }
    }))
}
