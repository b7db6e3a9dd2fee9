//! Feed types, sync statuses and incremental window selection

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default lookback for record-oriented feeds on their first run
pub const DEFAULT_DAYS_EXPORT: u32 = 7;

/// Independently tracked category of exportable data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FeedType {
    /// Sessions and usage audits, shipped together in one payload
    #[serde(rename = "SESSION_USAGE_AUDITS")]
    UsageRecords,
    /// Installed module snapshot
    #[serde(rename = "MODULE_METADATA")]
    MetadataRecords,
}

impl FeedType {
    /// Every feed type, in the order a full run executes them
    pub const ALL: [FeedType; 2] = [FeedType::UsageRecords, FeedType::MetadataRecords];

    /// Wire name, also the key of the persisted state rows
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedType::UsageRecords => "SESSION_USAGE_AUDITS",
            FeedType::MetadataRecords => "MODULE_METADATA",
        }
    }

    /// Day cap applied when the feed has never synced successfully.
    ///
    /// Metadata has no natural decay window, so its first run exports the
    /// full snapshot.
    pub fn default_window_days(&self) -> Option<u32> {
        match self {
            FeedType::UsageRecords => Some(DEFAULT_DAYS_EXPORT),
            FeedType::MetadataRecords => None,
        }
    }
}

impl fmt::Display for FeedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownFeedType(pub String);

impl fmt::Display for UnknownFeedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown sync type: {}", self.0)
    }
}

impl std::error::Error for UnknownFeedType {}

impl FromStr for FeedType {
    type Err = UnknownFeedType;

    /// Accepts the wire names plus the short aliases used in URLs
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SESSION_USAGE_AUDITS" | "USAGE" | "RECORDS" => Ok(FeedType::UsageRecords),
            "MODULE_METADATA" | "METADATA" | "MODULES" => Ok(FeedType::MetadataRecords),
            _ => Err(UnknownFeedType(s.to_string())),
        }
    }
}

/// Outcome of one sync attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncStatus {
    Success,
    Failed,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Success => "SUCCESS",
            SyncStatus::Failed => "FAILED",
        }
    }

    /// Anything other than SUCCESS is treated as a failed attempt
    pub fn from_db(value: &str) -> Self {
        if value.eq_ignore_ascii_case("SUCCESS") {
            SyncStatus::Success
        } else {
            SyncStatus::Failed
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SyncStatus::Success)
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Time range handed to the data source: `[since, now)` or the last `days`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionWindow {
    pub since: Option<DateTime<Utc>>,
    pub days: Option<u32>,
}

impl ExtractionWindow {
    /// Pick the window for `feed` given its last successful sync instant.
    ///
    /// A prior success yields an open-ended incremental window with no day
    /// cap; otherwise the feed's default lookback applies.
    pub fn select(feed: FeedType, last_success: Option<DateTime<Utc>>) -> Self {
        match last_success {
            Some(since) => Self {
                since: Some(since),
                days: None,
            },
            None => Self {
                since: None,
                days: feed.default_window_days(),
            },
        }
    }

    pub fn is_incremental(&self) -> bool {
        self.since.is_some()
    }

    /// Lower bound for a day-capped window, relative to `now`
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match (self.since, self.days) {
            (Some(_), _) => None,
            (None, Some(days)) if days > 0 => Some(now - chrono::Duration::days(days as i64)),
            _ => None,
        }
    }
}
