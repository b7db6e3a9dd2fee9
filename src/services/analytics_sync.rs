//! Sync orchestration
//!
//! One `execute_sync` call runs a single feed through
//! read state -> select window -> extract -> build -> deliver -> append state,
//! strictly in that order. Every attempt appends exactly one state row and
//! operational failures come back as a `Failed` result, never as an error.

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::{StoreError, SyncError};
use crate::models::feed::{ExtractionWindow, FeedType, SyncStatus};
use crate::models::health::HealthReport;
use crate::models::summary::{SyncOutcome, SyncRunSummary};
use crate::models::sync_state::{now_micros, SyncAttemptResult, SyncState, NOT_AVAILABLE};
use crate::services::data_source::DataSource;
use crate::services::host_context::{AdminModeGuard, HostContext};
use crate::services::payload_builder::{build_document, ExportContext};
use crate::services::receiver_client::Delivery;
use crate::services::sync_state::{record_attempt, SyncStateStore};

/// Serializes attempts per feed so two triggers cannot read the same
/// last-success row and ship overlapping windows
#[derive(Default)]
struct FeedLocks {
    usage: Mutex<()>,
    metadata: Mutex<()>,
}

impl FeedLocks {
    fn get(&self, feed: FeedType) -> &Mutex<()> {
        match feed {
            FeedType::UsageRecords => &self.usage,
            FeedType::MetadataRecords => &self.metadata,
        }
    }
}

#[derive(Clone)]
pub struct AnalyticsSyncService {
    data_source: Arc<dyn DataSource>,
    delivery: Arc<dyn Delivery>,
    store: Arc<dyn SyncStateStore>,
    host: Arc<dyn HostContext>,
    locks: Arc<FeedLocks>,
}

impl AnalyticsSyncService {
    pub fn new(
        data_source: Arc<dyn DataSource>,
        delivery: Arc<dyn Delivery>,
        store: Arc<dyn SyncStateStore>,
        host: Arc<dyn HostContext>,
    ) -> Self {
        Self {
            data_source,
            delivery,
            store,
            host,
            locks: Arc::new(FeedLocks::default()),
        }
    }

    /// Run one sync attempt for `feed`
    pub async fn execute_sync(&self, feed: FeedType) -> SyncAttemptResult {
        let _feed_lock = self.locks.get(feed).lock().await;

        let mut result = SyncAttemptResult::started(feed);
        tracing::info!(feed_type = %feed, "Starting analytics sync");

        if let Err(e) = self.run_attempt(feed, &mut result).await {
            tracing::error!(feed_type = %feed, error = %e, "Analytics sync failed");
            result.status = SyncStatus::Failed;
            result.job_id = None;
            result.message = format!("[{feed}] Error: {e}");
            result.error = Some(e);
        }

        result.end_time = Some(now_micros());

        {
            let _admin = AdminModeGuard::acquire(self.host.as_ref());
            record_attempt(self.store.as_ref(), &result).await;
        }

        tracing::info!(
            feed_type = %feed,
            status = %result.status,
            sessions = result.counts.sessions,
            audits = result.counts.audits,
            modules = result.counts.modules,
            job_id = ?result.job_id,
            duration_ms = result.duration_ms(),
            "Analytics sync finished"
        );
        result
    }

    async fn run_attempt(
        &self,
        feed: FeedType,
        result: &mut SyncAttemptResult,
    ) -> Result<(), SyncError> {
        let source_instance = self.resolve_source_instance().await;

        let last_success = {
            let _admin = AdminModeGuard::acquire(self.host.as_ref());
            self.store.last_successful(feed).await?
        };

        let window = ExtractionWindow::select(feed, last_success.and_then(|s| s.timestamp));
        tracing::info!(
            feed_type = %feed,
            since = ?window.since,
            days = ?window.days,
            "Selected extraction window"
        );

        let extraction = {
            let _admin = AdminModeGuard::acquire(self.host.as_ref());
            self.data_source.extract(feed, window).await?
        };

        result.counts = extraction.counts();
        let total = result.counts.total();

        // Nothing to ship. The success row still advances the next window.
        if total == 0 {
            tracing::info!(feed_type = %feed, "No new data to send");
            result.status = SyncStatus::Success;
            result.message = format!("[{feed}] No new data to send");
            return Ok(());
        }

        let context = ExportContext {
            source_instance,
            exported_at: now_micros(),
            days_exported: window.days,
        };
        let document = build_document(&extraction, &context);
        let body = serde_json::to_string(&document)?;
        tracing::debug!(
            feed_type = %feed,
            schema_version = document.schema_version(),
            bytes = body.len(),
            payload = %body,
            "Built payload"
        );

        let ack = self.delivery.send(&body).await?;

        result.status = SyncStatus::Success;
        result.message = format!(
            "[{feed}] Successfully sent {total} records. Job ID: {}",
            ack.job_id.as_deref().unwrap_or(NOT_AVAILABLE)
        );
        result.job_id = ack.job_id;
        Ok(())
    }

    /// Never fails: a missing identifier becomes an empty string
    async fn resolve_source_instance(&self) -> String {
        let _admin = AdminModeGuard::acquire(self.host.as_ref());
        match self.data_source.source_instance().await {
            Ok(instance) => instance,
            Err(e) => {
                tracing::warn!(error = %e, "Could not determine source instance, using empty identifier");
                String::new()
            }
        }
    }

    /// Run every feed type once, in order
    pub async fn run_all(&self) -> SyncRunSummary {
        tracing::info!(feeds = FeedType::ALL.len(), "Starting analytics sync run");

        let mut summary = SyncRunSummary::default();
        for feed in FeedType::ALL {
            let result = self.execute_sync(feed).await;
            summary.push(SyncOutcome::from(&result));
        }

        for line in summary.lines() {
            tracing::info!("{line}");
        }
        if summary.is_success() {
            tracing::info!(successes = summary.successes, "Analytics sync run completed");
        } else {
            tracing::error!(
                successes = summary.successes,
                failures = summary.failures,
                "Analytics sync run completed with failures"
            );
        }
        summary
    }

    /// Newest successful state row for `feed`
    pub async fn last_successful_state(&self, feed: FeedType) -> Result<Option<SyncState>, StoreError> {
        let _admin = AdminModeGuard::acquire(self.host.as_ref());
        self.store.last_successful(feed).await
    }

    /// Newest state row for `feed`, any status
    pub async fn health_state(&self, feed: FeedType) -> Result<Option<SyncState>, StoreError> {
        let _admin = AdminModeGuard::acquire(self.host.as_ref());
        self.store.latest(feed).await
    }

    pub async fn health_report(&self, feed: FeedType) -> Result<HealthReport, StoreError> {
        let state = self.health_state(feed).await?;
        Ok(HealthReport::from_state(feed, state))
    }
}
