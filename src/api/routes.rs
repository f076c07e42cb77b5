//! API Routes Module
//!
//! Route table for the gateway: report execution, replay, and admin
//! operations over the caches and the last-request store.

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::api::AppState;

// == Router Setup ==
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Report execution
        .route("/reports/:endpoint", post(handlers::run_report))
        .route("/reports/:endpoint/replay", post(handlers::replay_report))
        .route("/last-requests/:endpoint", get(handlers::list_last_requests))
        // Cache administration
        .route("/admin/cache/stats", get(handlers::cache_stats))
        .route("/admin/cache/flush", post(handlers::cache_flush))
        .route(
            "/admin/cache/flush-expired",
            post(handlers::cache_flush_expired),
        )
        // Last-request store administration
        .route("/admin/last-requests/stats", get(handlers::store_stats))
        .route(
            "/admin/last-requests/cleanup",
            post(handlers::store_cleanup),
        )
        // Health check
        .route("/health", get(handlers::health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
