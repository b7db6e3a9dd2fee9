//! Record extraction from the host application's tables

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use rust_decimal::prelude::ToPrimitive;
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
};
use std::collections::HashMap;
use std::env;

use crate::entities::{ad_module, ad_session, ad_session_usage_audit, prelude::*};
use crate::error::ExtractionError;
use crate::models::feed::{ExtractionWindow, FeedType};
use crate::models::records::{
    AuditEnrichment, Extraction, ModuleRecord, ModuleRef, NamedRef, ObjectType, SessionRecord,
    SessionRef, UsageAuditRecord,
};

pub const ENV_SOURCE_INSTANCE: &str = "ANALYTICS_SOURCE_INSTANCE";

/// Point-of-sale logins are terminal traffic, not user activity
const POS_LOGIN_STATUS: &str = "OBPOS_POS";
const CORE_MODULE_ID: &str = "0";

#[async_trait]
pub trait DataSource: Send + Sync {
    /// Identifier of the host installation, may be empty
    async fn source_instance(&self) -> Result<String, ExtractionError>;

    async fn extract(
        &self,
        feed: FeedType,
        window: ExtractionWindow,
    ) -> Result<Extraction, ExtractionError>;
}

#[derive(Clone)]
pub struct SeaOrmDataSource {
    db: DatabaseConnection,
    instance_override: Option<String>,
}

impl SeaOrmDataSource {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            instance_override: None,
        }
    }

    /// Honour `ANALYTICS_SOURCE_INSTANCE` when set
    pub fn from_env(db: DatabaseConnection) -> Self {
        Self::new(db).with_instance_override(env::var(ENV_SOURCE_INSTANCE).ok())
    }

    pub fn with_instance_override(mut self, instance: Option<String>) -> Self {
        self.instance_override = instance
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        self
    }

    async fn extract_usage(&self, window: ExtractionWindow) -> Result<Extraction, ExtractionError> {
        let now = Utc::now();

        let sessions = AdSession::find()
            .filter(exclude_pos(ad_session::Column::LoginStatus))
            .filter(window_condition(ad_session::Column::Created, &window, now))
            .order_by_desc(ad_session::Column::Created)
            .all(&self.db)
            .await?;
        tracing::debug!(count = sessions.len(), incremental = window.is_incremental(), "Extracted sessions");

        let audits = AdSessionUsageAudit::find()
            .find_also_related(AdSession)
            .filter(ad_session::Column::AdSessionId.is_not_null())
            .filter(exclude_pos(ad_session::Column::LoginStatus))
            .filter(window_condition(ad_session_usage_audit::Column::Created, &window, now))
            .order_by_desc(ad_session_usage_audit::Column::Created)
            .all(&self.db)
            .await?;
        tracing::debug!(count = audits.len(), "Extracted usage audits");

        let mut resolver = EnrichmentResolver::new(&self.db);
        let mut audit_records = Vec::with_capacity(audits.len());
        for (audit, session) in audits {
            let object_type = ObjectType::from_command(audit.command.as_deref());
            let enrichment = resolver.resolve(object_type, audit.object_id.as_deref()).await;
            audit_records.push(audit_record(audit, session, enrichment));
        }

        let core_version = match AdModule::find_by_id(CORE_MODULE_ID.to_string()).one(&self.db).await {
            Ok(module) => module.and_then(|m| m.version),
            Err(e) => {
                tracing::warn!(error = %e, "Could not resolve core module version");
                None
            }
        };

        Ok(Extraction::Usage {
            sessions: sessions.into_iter().map(session_record).collect(),
            audits: audit_records,
            core_version,
        })
    }

    async fn extract_modules(&self, window: ExtractionWindow) -> Result<Extraction, ExtractionError> {
        let modules = AdModule::find()
            .filter(ad_module::Column::Enabled.eq("Y"))
            .filter(window_condition(ad_module::Column::Created, &window, Utc::now()))
            .order_by_asc(ad_module::Column::Name)
            .all(&self.db)
            .await?;
        tracing::debug!(count = modules.len(), incremental = window.is_incremental(), "Extracted modules");

        Ok(Extraction::ModuleMetadata {
            modules: modules
                .into_iter()
                .map(|m| ModuleRecord {
                    id: m.ad_module_id,
                    javapackage: m.javapackage,
                    name: m.name,
                    version: m.version,
                    module_type: m.module_type,
                    is_commercial: is_yes(&m.iscommercial),
                    enabled: is_yes(&m.enabled),
                })
                .collect(),
        })
    }
}

#[async_trait]
impl DataSource for SeaOrmDataSource {
    async fn source_instance(&self) -> Result<String, ExtractionError> {
        if let Some(instance) = &self.instance_override {
            return Ok(instance.clone());
        }

        let identifier = AdSystemInfo::find()
            .one(&self.db)
            .await?
            .and_then(|info| info.system_identifier)
            .unwrap_or_default();

        if identifier.trim().is_empty() {
            tracing::warn!("Empty system identifier, source instance will be empty");
        }
        Ok(identifier)
    }

    async fn extract(
        &self,
        feed: FeedType,
        window: ExtractionWindow,
    ) -> Result<Extraction, ExtractionError> {
        match feed {
            FeedType::UsageRecords => self.extract_usage(window).await,
            FeedType::MetadataRecords => self.extract_modules(window).await,
        }
    }
}

/// `created > since` for incremental windows, `created >= now - days` for
/// capped ones, no restriction otherwise
fn window_condition<C: ColumnTrait>(column: C, window: &ExtractionWindow, now: DateTime<Utc>) -> Condition {
    match (window.since, window.cutoff(now)) {
        (Some(since), _) => Condition::all().add(column.gt(since.naive_utc())),
        (None, Some(cutoff)) => Condition::all().add(column.gte(cutoff.naive_utc())),
        (None, None) => Condition::all(),
    }
}

fn exclude_pos<C: ColumnTrait>(column: C) -> Condition {
    Condition::any()
        .add(column.ne(POS_LOGIN_STATUS))
        .add(column.is_null())
}

fn is_yes(flag: &str) -> bool {
    flag.eq_ignore_ascii_case("Y")
}

fn utc(ts: NaiveDateTime) -> DateTime<Utc> {
    Utc.from_utc_datetime(&ts)
}

fn session_record(model: ad_session::Model) -> SessionRecord {
    SessionRecord {
        id: model.ad_session_id,
        username: model.username,
        created: Some(utc(model.created)),
        created_by: model.createdby,
        updated: model.updated.map(utc),
        updated_by: model.updatedby,
        session_active: is_yes(&model.session_active),
        login_status: model.login_status,
        server_url: model.server_url,
        remote_address: model.remote_addr,
        last_ping: model.last_session_ping.map(utc),
    }
}

fn audit_record(
    audit: ad_session_usage_audit::Model,
    session: Option<ad_session::Model>,
    enrichment: AuditEnrichment,
) -> UsageAuditRecord {
    UsageAuditRecord {
        id: audit.ad_session_usage_audit_id,
        session: session.map(|s| SessionRef {
            id: s.ad_session_id,
            username: s.username,
            remote_address: s.remote_addr,
        }),
        command: audit.command,
        object_id: audit.object_id,
        process_time_ms: audit.processtime.and_then(|d| d.to_f64()),
        created: Some(utc(audit.created)),
        created_by: audit.createdby,
        enrichment,
    }
}

/// Window, process and module lookups for one extraction, memoised by
/// object. A failed lookup logs a warning and leaves the fields empty.
struct EnrichmentResolver<'a> {
    db: &'a DatabaseConnection,
    resolved: HashMap<(&'static str, String), AuditEnrichment>,
    modules: HashMap<String, Option<ModuleRef>>,
}

impl<'a> EnrichmentResolver<'a> {
    fn new(db: &'a DatabaseConnection) -> Self {
        Self {
            db,
            resolved: HashMap::new(),
            modules: HashMap::new(),
        }
    }

    async fn resolve(&mut self, object_type: ObjectType, object_id: Option<&str>) -> AuditEnrichment {
        let Some(object_id) = object_id else {
            return AuditEnrichment::default();
        };

        let key = (object_type.code(), object_id.to_string());
        if let Some(hit) = self.resolved.get(&key) {
            return hit.clone();
        }

        let lookup = match object_type {
            ObjectType::Window => self.window_from_tab(object_id).await,
            ObjectType::Process => self.process(object_id).await,
        };

        match lookup {
            Ok(enrichment) => {
                self.resolved.insert(key, enrichment.clone());
                enrichment
            }
            Err(e) => {
                tracing::warn!(
                    object_type = object_type.code(),
                    object_id,
                    error = %e,
                    "Could not resolve usage audit object"
                );
                AuditEnrichment::default()
            }
        }
    }

    async fn window_from_tab(&mut self, tab_id: &str) -> Result<AuditEnrichment, DbErr> {
        let Some(window_id) = AdTab::find_by_id(tab_id.to_string())
            .one(self.db)
            .await?
            .and_then(|tab| tab.ad_window_id)
        else {
            return Ok(AuditEnrichment::default());
        };

        let Some(window) = AdWindow::find_by_id(window_id).one(self.db).await? else {
            return Ok(AuditEnrichment::default());
        };

        let module = self.module(window.ad_module_id.as_deref()).await?;
        Ok(AuditEnrichment {
            module,
            window: Some(NamedRef {
                id: window.ad_window_id,
                name: window.name,
            }),
            process: None,
        })
    }

    async fn process(&mut self, process_id: &str) -> Result<AuditEnrichment, DbErr> {
        let Some(process) = AdProcess::find_by_id(process_id.to_string()).one(self.db).await? else {
            return Ok(AuditEnrichment::default());
        };

        let module = self.module(process.ad_module_id.as_deref()).await?;
        Ok(AuditEnrichment {
            module,
            window: None,
            process: Some(NamedRef {
                id: process.ad_process_id,
                name: process.name,
            }),
        })
    }

    async fn module(&mut self, module_id: Option<&str>) -> Result<Option<ModuleRef>, DbErr> {
        let Some(module_id) = module_id else {
            return Ok(None);
        };
        if let Some(hit) = self.modules.get(module_id) {
            return Ok(hit.clone());
        }

        let module = AdModule::find_by_id(module_id.to_string())
            .one(self.db)
            .await?
            .map(|m| ModuleRef {
                id: m.ad_module_id,
                name: m.name,
                javapackage: m.javapackage,
                version: m.version,
            });
        self.modules.insert(module_id.to_string(), module.clone());
        Ok(module)
    }
}
