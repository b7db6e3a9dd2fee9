//! Serializable views of finished sync attempts

use serde::Serialize;

use crate::error::RunFailed;
use crate::models::feed::{FeedType, SyncStatus};
use crate::models::payload::format_timestamp;
use crate::models::records::RecordCounts;
use crate::models::sync_state::SyncAttemptResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// One finished attempt, as returned by the trigger endpoints
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncOutcome {
    pub feed_type: FeedType,
    pub status: SyncStatus,
    pub message: String,
    pub job_id: Option<String>,
    pub counts: RecordCounts,
    pub start_time: String,
    pub end_time: Option<String>,
    pub duration_ms: i64,
    pub error: Option<String>,
}

impl From<&SyncAttemptResult> for SyncOutcome {
    fn from(result: &SyncAttemptResult) -> Self {
        Self {
            feed_type: result.feed_type,
            status: result.status,
            message: result.message.clone(),
            job_id: result.job_id.clone(),
            counts: result.counts,
            start_time: format_timestamp(&result.start_time),
            end_time: result.end_time.as_ref().map(format_timestamp),
            duration_ms: result.duration_ms(),
            error: result.error.as_ref().map(|e| e.to_string()),
        }
    }
}

impl SyncOutcome {
    /// `✓ SESSION_USAGE_AUDITS: 3 sessions, 10 audits` or `✗ <FEED>: <message>`
    pub fn summary_line(&self) -> String {
        if !self.status.is_success() {
            return format!("✗ {}: {}", self.feed_type, self.message);
        }
        match self.feed_type {
            FeedType::UsageRecords => format!(
                "✓ {}: {} sessions, {} audits",
                self.feed_type, self.counts.sessions, self.counts.audits
            ),
            FeedType::MetadataRecords => {
                format!("✓ {}: {} modules", self.feed_type, self.counts.modules)
            }
        }
    }
}

/// Result of running every feed type once
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncRunSummary {
    pub successes: usize,
    pub failures: usize,
    pub outcomes: Vec<SyncOutcome>,
}

impl SyncRunSummary {
    pub fn push(&mut self, outcome: SyncOutcome) {
        if outcome.status.is_success() {
            self.successes += 1;
        } else {
            self.failures += 1;
        }
        self.outcomes.push(outcome);
    }

    pub fn lines(&self) -> Vec<String> {
        self.outcomes.iter().map(SyncOutcome::summary_line).collect()
    }

    pub fn is_success(&self) -> bool {
        self.failures == 0
    }

    pub fn into_result(self) -> Result<Self, RunFailed> {
        if self.failures > 0 {
            Err(RunFailed {
                failures: self.failures,
                lines: self.lines(),
            })
        } else {
            Ok(self)
        }
    }
}
