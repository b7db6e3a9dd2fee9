//! Raw host records returned by the data source

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Host login session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    pub id: String,
    pub username: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub created_by: Option<String>,
    pub updated: Option<DateTime<Utc>>,
    pub updated_by: Option<String>,
    pub session_active: bool,
    /// Raw login status code (S, F, L, ...)
    pub login_status: Option<String>,
    pub server_url: Option<String>,
    pub remote_address: Option<String>,
    pub last_ping: Option<DateTime<Utc>>,
}

/// Session fields repeated on each usage audit
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRef {
    pub id: String,
    pub username: Option<String>,
    pub remote_address: Option<String>,
}

/// Kind of object a usage audit points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectType {
    /// `object_id` is a tab; the window is reached through it
    Window,
    /// `object_id` is a process
    Process,
}

impl ObjectType {
    /// The host records process executions with the DEFAULT command
    pub fn from_command(command: Option<&str>) -> Self {
        match command {
            Some("DEFAULT") => ObjectType::Process,
            _ => ObjectType::Window,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ObjectType::Window => "W",
            ObjectType::Process => "P",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRef {
    pub id: String,
    pub name: Option<String>,
    pub javapackage: Option<String>,
    pub version: Option<String>,
}

/// Id and display name of a window or process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedRef {
    pub id: String,
    pub name: Option<String>,
}

/// Best-effort lookups resolved by the data source. Any part may be
/// missing when the lookup failed or found nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditEnrichment {
    pub module: Option<ModuleRef>,
    pub window: Option<NamedRef>,
    pub process: Option<NamedRef>,
}

/// One command executed inside a session
#[derive(Debug, Clone, PartialEq)]
pub struct UsageAuditRecord {
    pub id: String,
    pub session: Option<SessionRef>,
    pub command: Option<String>,
    pub object_id: Option<String>,
    pub process_time_ms: Option<f64>,
    pub created: Option<DateTime<Utc>>,
    pub created_by: Option<String>,
    pub enrichment: AuditEnrichment,
}

impl UsageAuditRecord {
    pub fn object_type(&self) -> ObjectType {
        ObjectType::from_command(self.command.as_deref())
    }
}

/// Installed host module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRecord {
    pub id: String,
    pub javapackage: Option<String>,
    pub name: Option<String>,
    pub version: Option<String>,
    pub module_type: Option<String>,
    pub is_commercial: bool,
    pub enabled: bool,
}

/// Records extracted for one feed type
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    Usage {
        sessions: Vec<SessionRecord>,
        audits: Vec<UsageAuditRecord>,
        /// Version of the host core module, if it could be resolved
        core_version: Option<String>,
    },
    ModuleMetadata {
        modules: Vec<ModuleRecord>,
    },
}

impl Extraction {
    pub fn counts(&self) -> RecordCounts {
        match self {
            Extraction::Usage {
                sessions, audits, ..
            } => RecordCounts {
                sessions: sessions.len(),
                audits: audits.len(),
                modules: 0,
            },
            Extraction::ModuleMetadata { modules } => RecordCounts {
                modules: modules.len(),
                ..Default::default()
            },
        }
    }
}

/// Record category counted in results and sync logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Sessions,
    Audits,
    Modules,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Sessions, Category::Audits, Category::Modules];

    pub fn label(&self) -> &'static str {
        match self {
            Category::Sessions => "Sessions",
            Category::Audits => "Audits",
            Category::Modules => "Modules",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.label() == s)
            .ok_or_else(|| format!("Unknown record category: {}", s))
    }
}

/// Per-category extraction counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RecordCounts {
    pub sessions: usize,
    pub audits: usize,
    pub modules: usize,
}

impl RecordCounts {
    pub fn get(&self, category: Category) -> usize {
        match category {
            Category::Sessions => self.sessions,
            Category::Audits => self.audits,
            Category::Modules => self.modules,
        }
    }

    pub fn set(&mut self, category: Category, count: usize) {
        match category {
            Category::Sessions => self.sessions = count,
            Category::Audits => self.audits = count,
            Category::Modules => self.modules = count,
        }
    }

    pub fn total(&self) -> usize {
        self.sessions + self.audits + self.modules
    }

    /// Categories with at least one record, in log order
    pub fn non_zero(self) -> impl Iterator<Item = (Category, usize)> {
        Category::ALL
            .into_iter()
            .map(move |c| (c, self.get(c)))
            .filter(|(_, n)| *n > 0)
    }
}
