//! Route definitions

use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Presentation client API
        .route("/search", get(handlers::search))
        .route("/execute", post(handlers::execute))
        .route(
            "/aliases",
            get(handlers::get_aliases).put(handlers::save_aliases),
        )
        // Provider management
        .route("/providers", get(handlers::providers))
        .route("/providers/reload", post(handlers::reload_providers))
        .route("/stats", get(handlers::stats))
        .route("/health", get(handlers::health))
        // Add middleware
        .layer(cors)
        // Add state
        .with_state(state)
}
