//! Manual sync triggers
//!
//! POST /api/analytics/sync          every feed, in order
//! POST /api/analytics/sync/{feed}   one feed
//!
//! A run with any failed feed answers 500 with the same body shape, so
//! callers can read per-feed outcomes either way.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::{info, warn};

use crate::models::feed::FeedType;
use crate::models::summary::{ErrorResponse, SyncOutcome, SyncRunSummary};
use crate::AppState;

pub async fn trigger_sync_all(State(state): State<AppState>) -> (StatusCode, Json<SyncRunSummary>) {
    info!("Manual analytics sync requested for all feeds");

    let summary = state.sync_service.run_all().await;
    let status = if summary.is_success() {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(summary))
}

pub async fn trigger_sync(
    State(state): State<AppState>,
    Path(feed): Path<String>,
) -> Result<(StatusCode, Json<SyncOutcome>), (StatusCode, Json<ErrorResponse>)> {
    let feed = feed.parse::<FeedType>().map_err(|e| {
        warn!(error = %e, "Sync requested for unknown feed");
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
    })?;

    info!(feed_type = %feed, "Manual analytics sync requested");
    let result = state.sync_service.execute_sync(feed).await;
    let status = if result.is_success() {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    Ok((status, Json(SyncOutcome::from(&result))))
}
