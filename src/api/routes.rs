//! API Routes
//!
//! Configures the Axum router: the proxy's own endpoints under `/__proxy`
//! and a fallback that proxies every other path.

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use super::handlers::{health_handler, proxy_handler, stats_handler, AppState};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /__proxy/health` - Health check endpoint
/// - `GET /__proxy/stats` - Cache statistics
/// - anything else - proxied (GET only, other methods get 405)
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/__proxy/health", get(health_handler))
        .route("/__proxy/stats", get(stats_handler))
        .fallback(proxy_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
