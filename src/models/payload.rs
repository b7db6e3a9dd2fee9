//! Wire documents shipped to the analytics receiver
//!
//! Two schemas exist, one per feed type:
//! - `1.0`: sessions + usage audits
//! - `module_metadata_v1`: installed module snapshot
//!
//! Optional fields serialize as `null` rather than being omitted, except
//! `days_exported` which only appears on day-capped exports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const USAGE_SCHEMA_VERSION: &str = "1.0";
pub const MODULE_METADATA_SCHEMA_VERSION: &str = "module_metadata_v1";
pub const EXPORTER_VERSION: &str = "1.0.0";

/// Render an instant as `yyyy-MM-ddTHH:mm:ss.SSSSSS+00:00`.
///
/// Every timestamp in a payload uses this profile: microsecond precision
/// and an explicit offset, never the `Z` suffix.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.6f%:z").to_string()
}

pub fn format_optional_timestamp(ts: Option<&DateTime<Utc>>) -> Option<String> {
    ts.map(format_timestamp)
}

/// Serialized document for either feed type
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Document {
    Usage(UsagePayload),
    ModuleMetadata(ModuleMetadataPayload),
}

impl Document {
    pub fn schema_version(&self) -> &str {
        match self {
            Document::Usage(p) => &p.schema_version,
            Document::ModuleMetadata(p) => &p.schema_version,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageMetadata {
    pub source_instance: String,
    pub export_timestamp: String,
    pub exporter_version: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub days_exported: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEntry {
    pub session_id: String,
    pub username: Option<String>,
    pub user_id: Option<String>,
    pub login_time: Option<String>,
    pub logout_time: Option<String>,
    pub session_active: bool,
    pub login_status: String,
    pub server_url: Option<String>,
    pub created: Option<String>,
    pub created_by: Option<String>,
    pub updated: Option<String>,
    pub updated_by: Option<String>,
    pub ip: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageAuditEntry {
    pub usage_audit_id: String,
    pub session_id: Option<String>,
    pub username: Option<String>,
    pub command: Option<String>,
    pub execution_time: Option<String>,
    pub process_time_ms: Option<f64>,
    pub module_id: Option<String>,
    pub module_name: Option<String>,
    pub module_javapackage: Option<String>,
    pub module_version: Option<String>,
    pub core_version: String,
    pub object_id: Option<String>,
    pub object_type: String,
    pub window_id: Option<String>,
    pub window_name: Option<String>,
    pub process_id: Option<String>,
    pub process_name: Option<String>,
    pub record_count: i64,
    pub created: Option<String>,
    pub created_by: Option<String>,
    pub ip: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsagePayload {
    pub schema_version: String,
    pub metadata: UsageMetadata,
    pub sessions: Vec<SessionEntry>,
    pub usage_audits: Vec<UsageAuditEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleMetadataHeader {
    pub source_instance: String,
    pub check_type: String,
    pub storage_only: bool,
    pub exported_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleEntry {
    pub ad_module_id: String,
    pub javapackage: Option<String>,
    pub name: Option<String>,
    pub version: Option<String>,
    #[serde(rename = "type")]
    pub module_type: Option<String>,
    pub iscommercial: bool,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleMetadataPayload {
    pub schema_version: String,
    pub metadata: ModuleMetadataHeader,
    pub records: Vec<ModuleEntry>,
}
