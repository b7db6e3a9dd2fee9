//! Sync health endpoints
//!
//! GET /api/analytics/health          usage feed
//! GET /api/analytics/health/{feed}   any feed, by wire name or alias

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::{debug, error, warn};

use crate::models::feed::FeedType;
use crate::models::health::{Health, HealthError, HealthReport, HealthStatus};
use crate::AppState;

type HealthResult = Result<Json<HealthReport>, (StatusCode, Json<HealthError>)>;

pub async fn get_health(State(state): State<AppState>) -> HealthResult {
    report(&state, FeedType::UsageRecords).await
}

pub async fn get_feed_health(State(state): State<AppState>, Path(feed): Path<String>) -> HealthResult {
    let feed = feed.parse::<FeedType>().map_err(|e| {
        warn!(error = %e, "Health requested for unknown feed");
        (
            StatusCode::BAD_REQUEST,
            Json(HealthError {
                status: HealthStatus::Error,
                health: Health::Unknown,
                error: e.to_string(),
            }),
        )
    })?;

    report(&state, feed).await
}

async fn report(state: &AppState, feed: FeedType) -> HealthResult {
    debug!(feed_type = %feed, "Health check requested");

    let report = state.sync_service.health_report(feed).await.map_err(|e| {
        error!(feed_type = %feed, error = %e, "Error checking health status");
        (StatusCode::INTERNAL_SERVER_ERROR, Json(HealthError::new(e.to_string())))
    })?;

    Ok(Json(report))
}
