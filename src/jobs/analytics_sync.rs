//! Scheduled analytics sync
//!
//! Runs every feed type once per interval. The first tick fires immediately
//! so a fresh deployment ships data without waiting a full period.

use std::env;
use tokio::time::{interval, Duration as TokioDuration, MissedTickBehavior};
use tracing::{error, info};

use crate::services::analytics_sync::AnalyticsSyncService;

/// Default sync interval in seconds (1 hour)
const DEFAULT_SYNC_INTERVAL_SECS: u64 = 3600;

const ENV_SYNC_INTERVAL: &str = "ANALYTICS_SYNC_INTERVAL_SECS";
const ENV_SYNC_ENABLED: &str = "ANALYTICS_SYNC_ENABLED";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncJobConfig {
    pub interval_secs: u64,
    pub enabled: bool,
}

impl SyncJobConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let interval_secs = lookup(ENV_SYNC_INTERVAL)
            .and_then(|s| s.trim().parse().ok())
            .filter(|secs: &u64| *secs > 0)
            .unwrap_or(DEFAULT_SYNC_INTERVAL_SECS);

        let enabled = lookup(ENV_SYNC_ENABLED)
            .map(|v| v.trim().to_lowercase() != "false")
            .unwrap_or(true);

        Self {
            interval_secs,
            enabled,
        }
    }
}

/// Spawn the background sync loop. Stops on ctrl-c.
pub async fn start_analytics_sync_job(service: AnalyticsSyncService, config: SyncJobConfig) {
    if !config.enabled {
        info!("Analytics sync job disabled via {}", ENV_SYNC_ENABLED);
        return;
    }

    tokio::spawn(async move {
        info!(interval_secs = config.interval_secs, "Analytics sync job started");

        let mut interval = interval(TokioDuration::from_secs(config.interval_secs));
        // A run that overruns the period should not trigger a burst afterwards
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown signal received, stopping analytics sync job");
                    break;
                }
                _ = interval.tick() => {
                    match service.run_all().await.into_result() {
                        Ok(summary) => {
                            info!(successes = summary.successes, "Scheduled analytics sync completed");
                        }
                        Err(e) => {
                            error!(error = %e, "Scheduled analytics sync failed");
                            // Next tick retries from the last successful window
                        }
                    }
                }
            }
        }

        info!("Analytics sync job stopped");
    });
}
