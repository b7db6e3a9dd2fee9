use axum::{
    routing::{get, post},
    Router,
};

use crate::AppState;

pub mod health;
pub mod sync;

/// Health reads and manual sync triggers
pub fn analytics_routes() -> Router<AppState> {
    Router::new()
        .route("/api/analytics/health", get(health::get_health))
        .route("/api/analytics/health/{feed}", get(health::get_feed_health))
        .route("/api/analytics/sync", post(sync::trigger_sync_all))
        .route("/api/analytics/sync/{feed}", post(sync::trigger_sync))
}
