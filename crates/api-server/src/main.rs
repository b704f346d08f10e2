//! API Server for Tarefas
//!
//! Main entry point for the Rust backend: REST API plus the purge
//! worker that hard-deletes completed tasks after their delay.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_server::state::AppState;
use tarefas_core::purge::start_purge_worker;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "api_server=debug,tarefas_core=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine data directory
    let data_dir = std::env::var("TAREFAS_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(".tarefas-data"));

    tracing::info!("Using data directory: {:?}", data_dir);

    let app_state = AppState::new(data_dir)
        .await
        .expect("Failed to initialize application state");

    // Purge worker runs detached from request handling; scheduled jobs
    // are durable, so a restart picks them back up.
    start_purge_worker(
        app_state.purge_queue(),
        app_state.store(),
        app_state.cache(),
        Duration::from_secs(1),
    );

    let app = api_server::app(app_state);

    let port = std::env::var("TAREFAS_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8081);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!("REST API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");
    axum::serve(listener, app).await.expect("Server error");
}
