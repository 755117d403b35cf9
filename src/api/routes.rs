//! API Routes
//!
//! Configures the Axum router with all proxy endpoints.

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    health_handler, proxy_get_handler, proxy_post_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /api/proxy` - Forward a read, cached and deduplicated
/// - `POST /api/proxy` - Forward a write, deduplicated, invalidating the target's cache
/// - `GET /stats` - Cache and deduplication counters
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin, since browser userscripts call the proxy cross-origin
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([super::handlers::X_CACHE]);

    Router::new()
        .route("/api/proxy", get(proxy_get_handler).post(proxy_post_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
