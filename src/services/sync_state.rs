//! Durable per-feed sync history
//!
//! Rows are appended once per attempt and never updated. Readers only ask
//! for the newest row, either the newest success (window selection) or the
//! newest of any status (health).

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::entities::{analytics_sync, prelude::*};
use crate::error::StoreError;
use crate::models::feed::{FeedType, SyncStatus};
use crate::models::sync_state::{NewSyncState, SyncAttemptResult, SyncState};

#[async_trait]
pub trait SyncStateStore: Send + Sync {
    async fn append(&self, row: NewSyncState) -> Result<(), StoreError>;

    /// Newest row with status SUCCESS and a timestamp
    async fn last_successful(&self, feed: FeedType) -> Result<Option<SyncState>, StoreError>;

    /// Newest row with a timestamp, any status
    async fn latest(&self, feed: FeedType) -> Result<Option<SyncState>, StoreError>;
}

/// Append the outcome of `result`. Persistence errors are logged and
/// reported through the return value, never raised.
pub async fn record_attempt(store: &dyn SyncStateStore, result: &SyncAttemptResult) -> bool {
    let row = NewSyncState::from_result(result);
    match store.append(row).await {
        Ok(()) => {
            tracing::debug!(
                feed_type = %result.feed_type,
                status = %result.status,
                "Recorded sync state"
            );
            true
        }
        Err(e) => {
            tracing::error!(
                feed_type = %result.feed_type,
                status = %result.status,
                error = %e,
                "Failed to persist sync state"
            );
            false
        }
    }
}

#[derive(Clone)]
pub struct SeaOrmSyncStateStore {
    db: DatabaseConnection,
}

impl SeaOrmSyncStateStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn to_state(feed: FeedType, model: analytics_sync::Model) -> SyncState {
        SyncState::new(
            feed,
            model.last_sync.map(|ts| ts.with_timezone(&Utc)),
            SyncStatus::from_db(&model.last_status),
            model.log,
        )
    }
}

#[async_trait]
impl SyncStateStore for SeaOrmSyncStateStore {
    async fn append(&self, row: NewSyncState) -> Result<(), StoreError> {
        let model = analytics_sync::ActiveModel {
            sync_type: Set(row.feed_type.as_str().to_string()),
            last_sync: Set(Some(row.timestamp.fixed_offset())),
            last_status: Set(row.status.as_str().to_string()),
            log: Set(Some(row.log)),
            ..Default::default()
        };
        model.insert(&self.db).await?;
        Ok(())
    }

    async fn last_successful(&self, feed: FeedType) -> Result<Option<SyncState>, StoreError> {
        let row = AnalyticsSync::find()
            .filter(analytics_sync::Column::SyncType.eq(feed.as_str()))
            .filter(analytics_sync::Column::LastStatus.eq(SyncStatus::Success.as_str()))
            .filter(analytics_sync::Column::LastSync.is_not_null())
            .order_by_desc(analytics_sync::Column::LastSync)
            .order_by_desc(analytics_sync::Column::Id)
            .one(&self.db)
            .await?;

        Ok(row.map(|m| Self::to_state(feed, m)))
    }

    async fn latest(&self, feed: FeedType) -> Result<Option<SyncState>, StoreError> {
        let row = AnalyticsSync::find()
            .filter(analytics_sync::Column::SyncType.eq(feed.as_str()))
            .filter(analytics_sync::Column::LastSync.is_not_null())
            .order_by_desc(analytics_sync::Column::LastSync)
            .order_by_desc(analytics_sync::Column::Id)
            .one(&self.db)
            .await?;

        Ok(row.map(|m| Self::to_state(feed, m)))
    }
}

/// Volatile store for local runs and tests
#[derive(Default)]
pub struct InMemorySyncStateStore {
    rows: Mutex<Vec<NewSyncState>>,
}

impl InMemorySyncStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every row appended for `feed`, oldest first
    pub fn rows(&self, feed: FeedType) -> Vec<NewSyncState> {
        self.rows
            .lock()
            .iter()
            .filter(|r| r.feed_type == feed)
            .cloned()
            .collect()
    }

    fn newest(&self, feed: FeedType, success_only: bool) -> Option<SyncState> {
        let rows = self.rows.lock();
        rows.iter()
            .enumerate()
            .filter(|(_, r)| r.feed_type == feed)
            .filter(|(_, r)| !success_only || r.status.is_success())
            // Later appends win timestamp ties, like the id tiebreak in SQL
            .max_by_key(|(idx, r)| (r.timestamp, *idx))
            .map(|(_, r)| SyncState::new(feed, Some(r.timestamp), r.status, Some(r.log.clone())))
    }
}

#[async_trait]
impl SyncStateStore for InMemorySyncStateStore {
    async fn append(&self, row: NewSyncState) -> Result<(), StoreError> {
        self.rows.lock().push(row);
        Ok(())
    }

    async fn last_successful(&self, feed: FeedType) -> Result<Option<SyncState>, StoreError> {
        Ok(self.newest(feed, true))
    }

    async fn latest(&self, feed: FeedType) -> Result<Option<SyncState>, StoreError> {
        Ok(self.newest(feed, false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone};

    fn row(feed: FeedType, ts: DateTime<Utc>, status: SyncStatus, job: &str) -> NewSyncState {
        NewSyncState {
            feed_type: feed,
            timestamp: ts,
            status,
            log: format!("Job ID: {job}\nMessage: test"),
        }
    }

    #[tokio::test]
    async fn test_in_memory_queries_pick_newest() {
        let store = InMemorySyncStateStore::new();
        let t1 = Utc.with_ymd_and_hms(2026, 10, 1, 0, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2026, 10, 2, 0, 0, 0).unwrap();
        let t3 = Utc.with_ymd_and_hms(2026, 10, 3, 0, 0, 0).unwrap();

        // Out of order on purpose
        store.append(row(FeedType::UsageRecords, t2, SyncStatus::Success, "J-2")).await.unwrap();
        store.append(row(FeedType::UsageRecords, t1, SyncStatus::Success, "J-1")).await.unwrap();
        store.append(row(FeedType::UsageRecords, t3, SyncStatus::Failed, "N/A")).await.unwrap();
        store.append(row(FeedType::MetadataRecords, t3, SyncStatus::Success, "M-1")).await.unwrap();

        let success = store.last_successful(FeedType::UsageRecords).await.unwrap().unwrap();
        assert_eq!(success.timestamp, Some(t2));
        assert_eq!(success.job_id(), Some("J-2"));

        let latest = store.latest(FeedType::UsageRecords).await.unwrap().unwrap();
        assert_eq!(latest.timestamp, Some(t3));
        assert_eq!(latest.status, SyncStatus::Failed);
        assert_eq!(latest.job_id(), None);
    }

    #[tokio::test]
    async fn test_in_memory_empty_feed() {
        let store = InMemorySyncStateStore::new();
        assert!(store.last_successful(FeedType::MetadataRecords).await.unwrap().is_none());
        assert!(store.latest(FeedType::MetadataRecords).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_record_attempt_appends_rendered_log() {
        let store = InMemorySyncStateStore::new();
        let mut result = SyncAttemptResult::started(FeedType::UsageRecords);
        result.status = SyncStatus::Success;
        result.job_id = Some("J-9".to_string());
        result.counts.sessions = 2;
        result.message = "sent".to_string();
        result.end_time = Some(result.start_time);

        assert!(record_attempt(&store, &result).await);

        let rows = store.rows(FeedType::UsageRecords);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].log, "Job ID: J-9\nSessions: 2\nMessage: sent");
    }
}
