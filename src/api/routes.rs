//! API Routes
//!
//! Configures the Axum router with all proxy endpoints.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    feed_handler, health_handler, remove_cache_handler, stats_handler, AppState,
};

/// REST namespace of the service.
pub const API_NAMESPACE: &str = "/sherv-challenge/v1";

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /sherv-challenge/v1/strategy11-data` - Cached upstream feed
/// - `POST /sherv-challenge/v1/remove-cache` - Drop every cached entry (admin)
/// - `GET /stats` - Cache statistics
/// - `GET /health` - Health check endpoint
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/strategy11-data", get(feed_handler))
        .route("/remove-cache", post(remove_cache_handler));

    Router::new()
        .nest(API_NAMESPACE, api)
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
