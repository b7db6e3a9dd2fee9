//! Pure mapping from extracted host records to wire documents

use chrono::{DateTime, Utc};

use crate::models::payload::{
    format_optional_timestamp, format_timestamp, Document, ModuleEntry, ModuleMetadataHeader,
    ModuleMetadataPayload, SessionEntry, UsageAuditEntry, UsageMetadata, UsagePayload,
    EXPORTER_VERSION, MODULE_METADATA_SCHEMA_VERSION, USAGE_SCHEMA_VERSION,
};
use crate::models::records::{Extraction, ModuleRecord, SessionRecord, UsageAuditRecord};

/// Export metadata that is an input to the builder rather than read from a clock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportContext {
    pub source_instance: String,
    pub exported_at: DateTime<Utc>,
    /// Day cap applied to the extraction, if any
    pub days_exported: Option<u32>,
}

/// Map a host login status code to its display value
pub fn map_login_status(code: Option<&str>) -> String {
    match code {
        Some("S") => "Success".to_string(),
        Some("F") => "Failed".to_string(),
        Some("L") => "Locked".to_string(),
        Some(other) => other.to_string(),
        None => "Unknown".to_string(),
    }
}

pub fn build_document(extraction: &Extraction, context: &ExportContext) -> Document {
    match extraction {
        Extraction::Usage {
            sessions,
            audits,
            core_version,
        } => Document::Usage(build_usage_payload(
            sessions,
            audits,
            core_version.as_deref(),
            context,
        )),
        Extraction::ModuleMetadata { modules } => {
            Document::ModuleMetadata(build_module_metadata_payload(modules, context))
        }
    }
}

pub fn build_usage_payload(
    sessions: &[SessionRecord],
    audits: &[UsageAuditRecord],
    core_version: Option<&str>,
    context: &ExportContext,
) -> UsagePayload {
    let core_version = core_version.unwrap_or_default();

    UsagePayload {
        schema_version: USAGE_SCHEMA_VERSION.to_string(),
        metadata: UsageMetadata {
            source_instance: context.source_instance.clone(),
            export_timestamp: format_timestamp(&context.exported_at),
            exporter_version: EXPORTER_VERSION.to_string(),
            days_exported: context.days_exported,
        },
        sessions: sessions.iter().map(session_entry).collect(),
        usage_audits: audits
            .iter()
            .map(|audit| usage_audit_entry(audit, core_version))
            .collect(),
    }
}

fn session_entry(session: &SessionRecord) -> SessionEntry {
    // An inactive session's last ping is the closest thing to a logout time
    let logout_time = if session.session_active {
        None
    } else {
        format_optional_timestamp(session.last_ping.as_ref())
    };

    SessionEntry {
        session_id: session.id.clone(),
        username: session.username.clone(),
        user_id: session.created_by.clone(),
        login_time: format_optional_timestamp(session.created.as_ref()),
        logout_time,
        session_active: session.session_active,
        login_status: map_login_status(session.login_status.as_deref()),
        server_url: session.server_url.clone(),
        created: format_optional_timestamp(session.created.as_ref()),
        created_by: session.created_by.clone(),
        updated: format_optional_timestamp(session.updated.as_ref()),
        updated_by: session.updated_by.clone(),
        ip: session.remote_address.clone(),
    }
}

fn usage_audit_entry(audit: &UsageAuditRecord, core_version: &str) -> UsageAuditEntry {
    let session = audit.session.as_ref();
    let module = audit.enrichment.module.as_ref();
    let window = audit.enrichment.window.as_ref();
    let process = audit.enrichment.process.as_ref();

    UsageAuditEntry {
        usage_audit_id: audit.id.clone(),
        session_id: session.map(|s| s.id.clone()),
        username: session.and_then(|s| s.username.clone()),
        command: audit.command.clone(),
        execution_time: format_optional_timestamp(audit.created.as_ref()),
        process_time_ms: audit.process_time_ms,
        module_id: module.map(|m| m.id.clone()),
        module_name: module.and_then(|m| m.name.clone()),
        module_javapackage: module.and_then(|m| m.javapackage.clone()),
        module_version: module.and_then(|m| m.version.clone()),
        core_version: core_version.to_string(),
        object_id: audit.object_id.clone(),
        object_type: audit.object_type().code().to_string(),
        window_id: window.map(|w| w.id.clone()),
        window_name: window.and_then(|w| w.name.clone()),
        process_id: process.map(|p| p.id.clone()),
        process_name: process.and_then(|p| p.name.clone()),
        record_count: 0,
        created: format_optional_timestamp(audit.created.as_ref()),
        created_by: audit.created_by.clone(),
        ip: session.and_then(|s| s.remote_address.clone()),
    }
}

pub fn build_module_metadata_payload(
    modules: &[ModuleRecord],
    context: &ExportContext,
) -> ModuleMetadataPayload {
    ModuleMetadataPayload {
        schema_version: MODULE_METADATA_SCHEMA_VERSION.to_string(),
        metadata: ModuleMetadataHeader {
            source_instance: context.source_instance.clone(),
            check_type: MODULE_METADATA_SCHEMA_VERSION.to_string(),
            storage_only: true,
            exported_at: format_timestamp(&context.exported_at),
        },
        records: modules
            .iter()
            .map(|module| ModuleEntry {
                ad_module_id: module.id.clone(),
                javapackage: module.javapackage.clone(),
                name: module.name.clone(),
                version: module.version.clone(),
                module_type: module.module_type.clone(),
                iscommercial: module.is_commercial,
                enabled: module.enabled,
            })
            .collect(),
    }
}
