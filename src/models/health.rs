use serde::Serialize;

use crate::models::feed::{FeedType, SyncStatus};
use crate::models::payload::format_optional_timestamp;
use crate::models::sync_state::SyncState;

pub const NO_SYNC_MESSAGE: &str = "No synchronization has been performed yet";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    NoData,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Health {
    Ok,
    Degraded,
    Unknown,
    Unhealthy,
}

/// Latest sync state of one feed, as exposed on the status surface
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum HealthReport {
    Synced {
        status: HealthStatus,
        health: Health,
        feed_type: FeedType,
        last_sync_timestamp: Option<String>,
        last_job_id: Option<String>,
        last_status: SyncStatus,
        log: Option<String>,
    },
    NeverSynced {
        status: HealthStatus,
        health: Health,
        feed_type: FeedType,
        message: String,
    },
}

impl HealthReport {
    pub fn from_state(feed_type: FeedType, state: Option<SyncState>) -> Self {
        match state {
            Some(state) => {
                let health = if state.status.is_success() {
                    Health::Ok
                } else {
                    Health::Degraded
                };
                HealthReport::Synced {
                    status: HealthStatus::Healthy,
                    health,
                    feed_type,
                    last_sync_timestamp: format_optional_timestamp(state.timestamp.as_ref()),
                    last_job_id: state.parsed_log.job_id.clone(),
                    last_status: state.status,
                    log: state.log,
                }
            }
            None => HealthReport::NeverSynced {
                status: HealthStatus::NoData,
                health: Health::Unknown,
                feed_type,
                message: NO_SYNC_MESSAGE.to_string(),
            },
        }
    }

    pub fn health(&self) -> Health {
        match self {
            HealthReport::Synced { health, .. } | HealthReport::NeverSynced { health, .. } => {
                *health
            }
        }
    }
}

/// Body returned when the state store cannot be read
#[derive(Debug, Clone, Serialize)]
pub struct HealthError {
    pub status: HealthStatus,
    pub health: Health,
    pub error: String,
}

impl HealthError {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Error,
            health: Health::Unhealthy,
            error: error.into(),
        }
    }
}
