//! Sync attempt results and persisted sync state
//!
//! The persisted `log` column packs the job id and record counts into
//! free text for compatibility with existing rows. `SyncLog` is the typed
//! form; the text is only produced on write and parsed right after read.

use chrono::{DateTime, SubsecRound, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::error::SyncError;
use crate::models::feed::{FeedType, SyncStatus};
use crate::models::records::{Category, RecordCounts};

pub const JOB_ID_PREFIX: &str = "Job ID: ";
pub const NOT_AVAILABLE: &str = "N/A";
const MESSAGE_PREFIX: &str = "Message: ";
const ERROR_SEPARATOR: &str = "\nError: ";

lazy_static! {
    static ref COUNT_LINE: Regex = Regex::new(r"^(Sessions|Audits|Modules): (\d+)$").unwrap();
}

/// Current instant at the precision the state store keeps
pub fn now_micros() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// In-memory outcome of one `execute_sync` call
#[derive(Debug)]
pub struct SyncAttemptResult {
    pub feed_type: FeedType,
    pub start_time: DateTime<Utc>,
    /// Always set once the attempt returns
    pub end_time: Option<DateTime<Utc>>,
    pub status: SyncStatus,
    pub message: String,
    pub job_id: Option<String>,
    pub counts: RecordCounts,
    pub error: Option<SyncError>,
}

impl SyncAttemptResult {
    pub fn started(feed_type: FeedType) -> Self {
        Self {
            feed_type,
            start_time: now_micros(),
            end_time: None,
            status: SyncStatus::Failed,
            message: String::new(),
            job_id: None,
            counts: RecordCounts::default(),
            error: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn duration_ms(&self) -> i64 {
        self.end_time
            .map(|end| (end - self.start_time).num_milliseconds())
            .unwrap_or(0)
    }

    /// Instant recorded as the row timestamp
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.end_time.unwrap_or(self.start_time)
    }

    pub fn sync_log(&self) -> SyncLog {
        SyncLog {
            job_id: self.job_id.clone(),
            counts: self.counts,
            message: self.message.clone(),
            error: self.error.as_ref().map(|e| e.to_string()),
        }
    }
}

/// Typed form of the persisted log text.
///
/// Text layout:
/// ```text
/// Job ID: <id|N/A>
/// Sessions: <n>        (only non-zero categories)
/// Message: <text>
/// Error: <text>        (failures only)
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncLog {
    pub job_id: Option<String>,
    pub counts: RecordCounts,
    pub message: String,
    pub error: Option<String>,
}

impl SyncLog {
    pub fn render(&self) -> String {
        let mut text = String::new();
        text.push_str(JOB_ID_PREFIX);
        text.push_str(self.job_id.as_deref().unwrap_or(NOT_AVAILABLE));
        text.push('\n');
        for (category, count) in self.counts.non_zero() {
            text.push_str(&format!("{}: {}\n", category.label(), count));
        }
        text.push_str(MESSAGE_PREFIX);
        text.push_str(&self.message);
        if let Some(error) = &self.error {
            text.push_str(ERROR_SEPARATOR);
            text.push_str(error);
        }
        text
    }

    /// Lenient parse: missing parts come back empty
    pub fn parse(text: &str) -> Self {
        let mut counts = RecordCounts::default();
        let (head, message_part) = match text.find(MESSAGE_PREFIX) {
            Some(idx) => (&text[..idx], Some(&text[idx + MESSAGE_PREFIX.len()..])),
            None => (text, None),
        };

        for line in head.lines() {
            if let Some(caps) = COUNT_LINE.captures(line.trim()) {
                if let (Ok(category), Ok(n)) = (caps[1].parse::<Category>(), caps[2].parse()) {
                    counts.set(category, n);
                }
            }
        }

        let (message, error) = match message_part {
            Some(rest) => match rest.find(ERROR_SEPARATOR) {
                Some(idx) => (
                    rest[..idx].to_string(),
                    Some(rest[idx + ERROR_SEPARATOR.len()..].to_string()),
                ),
                None => (rest.to_string(), None),
            },
            None => (String::new(), None),
        };

        Self {
            job_id: parse_job_id(text),
            counts,
            message,
            error,
        }
    }
}

/// Extract the job id from a log: the text after `Job ID: ` up to the next
/// newline, trimmed. A literal `N/A` or a missing line yields `None`.
pub fn parse_job_id(log: &str) -> Option<String> {
    let start = log.find(JOB_ID_PREFIX)? + JOB_ID_PREFIX.len();
    let rest = &log[start..];
    let value = match rest.find('\n') {
        Some(end) => &rest[..end],
        None => rest,
    }
    .trim();

    if value == NOT_AVAILABLE {
        None
    } else {
        Some(value.to_string())
    }
}

/// Row to append for one attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSyncState {
    pub feed_type: FeedType,
    pub timestamp: DateTime<Utc>,
    pub status: SyncStatus,
    pub log: String,
}

impl NewSyncState {
    pub fn from_result(result: &SyncAttemptResult) -> Self {
        Self {
            feed_type: result.feed_type,
            timestamp: result.completed_at(),
            status: result.status,
            log: result.sync_log().render(),
        }
    }
}

/// Persisted sync state row, with its log already parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncState {
    pub feed_type: FeedType,
    pub timestamp: Option<DateTime<Utc>>,
    pub status: SyncStatus,
    pub log: Option<String>,
    pub parsed_log: SyncLog,
}

impl SyncState {
    pub fn new(
        feed_type: FeedType,
        timestamp: Option<DateTime<Utc>>,
        status: SyncStatus,
        log: Option<String>,
    ) -> Self {
        let parsed_log = log.as_deref().map(SyncLog::parse).unwrap_or_default();
        Self {
            feed_type,
            timestamp,
            status,
            log,
            parsed_log,
        }
    }

    pub fn job_id(&self) -> Option<&str> {
        self.parsed_log.job_id.as_deref()
    }
}
