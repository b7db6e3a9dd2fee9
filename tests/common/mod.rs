#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, DurationRound, Utc};
use parking_lot::Mutex;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, Schema,
};
use sea_orm_migration::MigratorTrait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering};
use std::sync::Arc;

use analytics_exporter::entities::prelude::*;
use analytics_exporter::error::{DeliveryError, ExtractionError, StoreError};
use analytics_exporter::models::feed::{ExtractionWindow, FeedType};
use analytics_exporter::models::records::{
    AuditEnrichment, Extraction, ModuleRecord, SessionRecord, SessionRef, UsageAuditRecord,
};
use analytics_exporter::models::sync_state::{NewSyncState, SyncState};
use analytics_exporter::services::analytics_sync::AnalyticsSyncService;
use analytics_exporter::services::data_source::DataSource;
use analytics_exporter::services::host_context::HostContext;
use analytics_exporter::services::receiver_client::{Acknowledgement, Delivery};
use analytics_exporter::services::sync_state::{InMemorySyncStateStore, SyncStateStore};

/// In-memory SQLite pinned to a single connection so every query sees the
/// same database
async fn connect_memory() -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    Database::connect(options).await
}

/// Sync-state database with the real migrations applied
pub async fn setup_state_db() -> Result<DatabaseConnection, DbErr> {
    let db = connect_memory().await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

/// Host database with the tables the data source reads
pub async fn setup_host_db() -> Result<DatabaseConnection, DbErr> {
    let db = connect_memory().await?;
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let statements = [
        schema.create_table_from_entity(AdSession),
        schema.create_table_from_entity(AdSessionUsageAudit),
        schema.create_table_from_entity(AdModule),
        schema.create_table_from_entity(AdTab),
        schema.create_table_from_entity(AdWindow),
        schema.create_table_from_entity(AdProcess),
        schema.create_table_from_entity(AdSystemInfo),
    ];
    for statement in statements.iter() {
        db.execute(backend.build(statement)).await?;
    }
    Ok(db)
}

/// Current instant rounded down to whole seconds
pub fn now_secs() -> DateTime<Utc> {
    Utc::now()
        .duration_trunc(Duration::seconds(1))
        .unwrap_or_else(|_| Utc::now())
}

pub fn session(id: &str, created: DateTime<Utc>) -> SessionRecord {
    SessionRecord {
        id: id.to_string(),
        username: Some("admin".to_string()),
        created: Some(created),
        created_by: Some("100".to_string()),
        updated: Some(created),
        updated_by: Some("100".to_string()),
        session_active: false,
        login_status: Some("S".to_string()),
        server_url: Some("https://erp.acme.test".to_string()),
        remote_address: Some("10.0.0.7".to_string()),
        last_ping: Some(created + Duration::minutes(30)),
    }
}

pub fn audit(id: &str, session_id: &str, created: DateTime<Utc>) -> UsageAuditRecord {
    UsageAuditRecord {
        id: id.to_string(),
        session: Some(SessionRef {
            id: session_id.to_string(),
            username: Some("admin".to_string()),
            remote_address: Some("10.0.0.7".to_string()),
        }),
        command: Some("SAVE".to_string()),
        object_id: Some("TAB1".to_string()),
        process_time_ms: Some(5.0),
        created: Some(created),
        created_by: Some("100".to_string()),
        enrichment: AuditEnrichment::default(),
    }
}

pub fn module(id: &str, name: &str) -> ModuleRecord {
    ModuleRecord {
        id: id.to_string(),
        javapackage: Some(format!("com.acme.{}", name.to_lowercase())),
        name: Some(name.to_string()),
        version: Some("1.0.0".to_string()),
        module_type: Some("M".to_string()),
        is_commercial: false,
        enabled: true,
    }
}

pub fn usage_extraction(sessions: usize, audits: usize) -> Extraction {
    let now = now_secs();
    Extraction::Usage {
        sessions: (0..sessions)
            .map(|i| session(&format!("S{i}"), now - Duration::minutes(i as i64 + 1)))
            .collect(),
        audits: (0..audits)
            .map(|i| audit(&format!("A{i}"), "S0", now - Duration::minutes(i as i64 + 1)))
            .collect(),
        core_version: Some("3.0.251".to_string()),
    }
}

pub fn empty_extraction(feed: FeedType) -> Extraction {
    match feed {
        FeedType::UsageRecords => Extraction::Usage {
            sessions: vec![],
            audits: vec![],
            core_version: None,
        },
        FeedType::MetadataRecords => Extraction::ModuleMetadata { modules: vec![] },
    }
}

/// Data source returning canned extractions and recording every window it
/// was asked for
#[derive(Default)]
pub struct StubDataSource {
    responses: Mutex<HashMap<FeedType, Result<Extraction, String>>>,
    instance: Mutex<Option<Result<String, String>>>,
    windows: Mutex<Vec<(FeedType, ExtractionWindow)>>,
    delay: Mutex<Option<std::time::Duration>>,
}

impl StubDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_extraction(self, feed: FeedType, extraction: Extraction) -> Self {
        self.responses.lock().insert(feed, Ok(extraction));
        self
    }

    pub fn with_failure(self, feed: FeedType, message: &str) -> Self {
        self.responses.lock().insert(feed, Err(message.to_string()));
        self
    }

    pub fn with_instance(self, instance: Result<&str, &str>) -> Self {
        *self.instance.lock() = Some(instance.map(str::to_string).map_err(str::to_string));
        self
    }

    pub fn with_delay(self, delay: std::time::Duration) -> Self {
        *self.delay.lock() = Some(delay);
        self
    }

    pub fn set_extraction(&self, feed: FeedType, extraction: Extraction) {
        self.responses.lock().insert(feed, Ok(extraction));
    }

    pub fn windows(&self) -> Vec<(FeedType, ExtractionWindow)> {
        self.windows.lock().clone()
    }

    pub fn windows_for(&self, feed: FeedType) -> Vec<ExtractionWindow> {
        self.windows
            .lock()
            .iter()
            .filter(|(f, _)| *f == feed)
            .map(|(_, w)| *w)
            .collect()
    }
}

#[async_trait]
impl DataSource for StubDataSource {
    async fn source_instance(&self) -> Result<String, ExtractionError> {
        let instance = self.instance.lock().clone();
        match instance {
            Some(Ok(instance)) => Ok(instance),
            Some(Err(message)) => Err(ExtractionError::Source(message)),
            None => Ok("test-instance".to_string()),
        }
    }

    async fn extract(
        &self,
        feed: FeedType,
        window: ExtractionWindow,
    ) -> Result<Extraction, ExtractionError> {
        self.windows.lock().push((feed, window));

        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let response = self.responses.lock().get(&feed).cloned();
        match response {
            Some(Ok(extraction)) => Ok(extraction),
            Some(Err(message)) => Err(ExtractionError::Source(message)),
            None => Ok(empty_extraction(feed)),
        }
    }
}

/// Delivery double: pops queued responses, otherwise acknowledges with
/// `J-<n>`
#[derive(Default)]
pub struct RecordingDelivery {
    responses: Mutex<VecDeque<Result<Acknowledgement, DeliveryError>>>,
    bodies: Mutex<Vec<String>>,
}

impl RecordingDelivery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond_with(self, response: Result<Acknowledgement, DeliveryError>) -> Self {
        self.responses.lock().push_back(response);
        self
    }

    pub fn calls(&self) -> usize {
        self.bodies.lock().len()
    }

    pub fn bodies(&self) -> Vec<String> {
        self.bodies.lock().clone()
    }
}

pub fn ack(job_id: &str) -> Acknowledgement {
    Acknowledgement {
        status: Some("queued".to_string()),
        job_id: Some(job_id.to_string()),
        message: Some("accepted".to_string()),
        queue_position: Some(1),
        error: None,
    }
}

#[async_trait]
impl Delivery for RecordingDelivery {
    async fn send(&self, body: &str) -> Result<Acknowledgement, DeliveryError> {
        let call = {
            let mut bodies = self.bodies.lock();
            bodies.push(body.to_string());
            bodies.len()
        };
        let queued = self.responses.lock().pop_front();
        queued.unwrap_or_else(|| Ok(ack(&format!("J-{call}"))))
    }
}

/// In-memory store whose reads and writes can be switched to fail
#[derive(Default)]
pub struct FlakyStore {
    pub inner: InMemorySyncStateStore,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    append_attempts: AtomicUsize,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn append_attempts(&self) -> usize {
        self.append_attempts.load(Ordering::SeqCst)
    }

    fn check(&self, flag: &AtomicBool) -> Result<(), StoreError> {
        if flag.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl SyncStateStore for FlakyStore {
    async fn append(&self, row: NewSyncState) -> Result<(), StoreError> {
        self.append_attempts.fetch_add(1, Ordering::SeqCst);
        self.check(&self.fail_writes)?;
        self.inner.append(row).await
    }

    async fn last_successful(&self, feed: FeedType) -> Result<Option<SyncState>, StoreError> {
        self.check(&self.fail_reads)?;
        self.inner.last_successful(feed).await
    }

    async fn latest(&self, feed: FeedType) -> Result<Option<SyncState>, StoreError> {
        self.check(&self.fail_reads)?;
        self.inner.latest(feed).await
    }
}

/// Host context that counts elevations and tracks nesting depth
#[derive(Default)]
pub struct CountingHostContext {
    depth: AtomicI32,
    entered: AtomicUsize,
    restored: AtomicUsize,
}

impl CountingHostContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entered(&self) -> usize {
        self.entered.load(Ordering::SeqCst)
    }

    pub fn restored(&self) -> usize {
        self.restored.load(Ordering::SeqCst)
    }

    pub fn depth(&self) -> i32 {
        self.depth.load(Ordering::SeqCst)
    }
}

impl HostContext for CountingHostContext {
    fn enter_admin_mode(&self) -> bool {
        self.entered.fetch_add(1, Ordering::SeqCst);
        self.depth.fetch_add(1, Ordering::SeqCst) > 0
    }

    fn restore_mode(&self, _previous: bool) {
        self.restored.fetch_add(1, Ordering::SeqCst);
        self.depth.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct Harness {
    pub source: Arc<StubDataSource>,
    pub delivery: Arc<RecordingDelivery>,
    pub store: Arc<FlakyStore>,
    pub host: Arc<CountingHostContext>,
    pub service: AnalyticsSyncService,
}

impl Harness {
    pub fn new(source: StubDataSource, delivery: RecordingDelivery) -> Self {
        let source = Arc::new(source);
        let delivery = Arc::new(delivery);
        let store = Arc::new(FlakyStore::new());
        let host = Arc::new(CountingHostContext::new());
        let service = AnalyticsSyncService::new(
            source.clone(),
            delivery.clone(),
            store.clone(),
            host.clone(),
        );
        Self {
            source,
            delivery,
            store,
            host,
            service,
        }
    }
}
