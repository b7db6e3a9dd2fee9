//! Error types for extraction, delivery, state persistence and the sync cycle.

use thiserror::Error;

/// Keywords marking a transport failure as transient
const TRANSIENT_KEYWORDS: [&str; 4] = ["timeout", "connection", "network", "server error"];

/// Failure reading records from the host data store
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("{0}")]
    Source(String),
}

/// Failure reading or appending sync state rows
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("sync state store unavailable: {0}")]
    Unavailable(String),
}

/// Failure shipping a payload to the receiver
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// 4xx, never retried
    #[error("Client error: {status} - {body}")]
    ClientError { status: u16, body: String },

    /// 5xx, retried until the attempt bound
    #[error("Server error: {status} - {body}")]
    ServerError { status: u16, body: String },

    /// Neither 202, 4xx nor 5xx
    #[error("Unexpected response code: {status}")]
    UnexpectedStatus { status: u16, body: String },

    /// I/O or timeout while talking to the receiver
    #[error("{message}")]
    Transport { message: String, retryable: bool },

    /// 202 with a body that is not an acknowledgement
    #[error("Invalid acknowledgement from receiver: {0}")]
    InvalidAcknowledgement(String),

    #[error("Failed to send data after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last_error: Box<DeliveryError>,
    },

    #[error("Invalid receiver configuration: {0}")]
    Configuration(String),
}

impl DeliveryError {
    /// Transport failure classified by its message
    pub fn transport(message: impl Into<String>) -> Self {
        let message = message.into();
        let retryable = is_transient_message(&message);
        Self::Transport { message, retryable }
    }

    /// Transport failure known to be transient regardless of its message
    pub fn transient_transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: true,
        }
    }

    /// Returns true if another attempt may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            DeliveryError::ServerError { .. } => true,
            DeliveryError::Transport { retryable, .. } => *retryable,
            _ => false,
        }
    }
}

/// True when the message names a transient network condition
pub fn is_transient_message(message: &str) -> bool {
    let message = message.to_lowercase();
    TRANSIENT_KEYWORDS.iter().any(|k| message.contains(k))
}

/// Flatten an error and its sources into one message
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Anything that aborts a sync attempt
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Failed to extract analytics data: {0}")]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    #[error("Failed to read sync state: {0}")]
    State(#[from] StoreError),

    #[error("Failed to serialize payload: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A full run in which at least one feed failed
#[derive(Debug, Error)]
#[error("Orchestration completed with {failures} failure(s)")]
pub struct RunFailed {
    pub failures: usize,
    pub lines: Vec<String>,
}
