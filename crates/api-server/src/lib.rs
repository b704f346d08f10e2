//! REST API server for Tarefas
//!
//! Exposes task CRUD plus a completion toggle over the core task store,
//! with a tag cache on the single-task read path and a transport-level
//! response cache on GET requests.

pub mod error;
pub mod response_cache;
pub mod routes;
pub mod state;

use axum::middleware;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::response_cache::cache_get_responses;
use crate::state::AppState;

/// Build the application router
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::router())
        .merge(routes::task::router().layer(middleware::from_fn_with_state(
            state.response_cache(),
            cache_get_responses,
        )))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
