//! HTTPS delivery of serialized documents to the analytics receiver
//!
//! One document is in flight at a time. Each call makes at most
//! `max_retries` POSTs:
//! - 202 parses the acknowledgement and returns
//! - 5xx and transient transport errors wait `retry_delay` and try again
//! - 4xx, other status codes and non-transient errors fail immediately

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use crate::error::{error_chain, DeliveryError};

pub const DEFAULT_RECEIVER_URL: &str = "https://receiver.otel2.etendo.cloud/process";
pub const MAX_RETRIES: u32 = 3;
pub const RETRY_DELAY_MS: u64 = 2000;
pub const CONNECT_TIMEOUT_SECS: u64 = 30;
pub const READ_TIMEOUT_SECS: u64 = 60;
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=UTF-8";

pub const ENV_RECEIVER_URL: &str = "ANALYTICS_RECEIVER_URL";
pub const ENV_MAX_RETRIES: &str = "ANALYTICS_RECEIVER_MAX_RETRIES";
pub const ENV_RETRY_DELAY_MS: &str = "ANALYTICS_RECEIVER_RETRY_DELAY_MS";

/// Receiver response to an accepted document. Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acknowledgement {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub queue_position: Option<i64>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Transport for one serialized document
#[async_trait]
pub trait Delivery: Send + Sync {
    async fn send(&self, body: &str) -> Result<Acknowledgement, DeliveryError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiverConfig {
    pub url: String,
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_RECEIVER_URL.to_string(),
            max_retries: MAX_RETRIES,
            retry_delay: Duration::from_millis(RETRY_DELAY_MS),
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            read_timeout: Duration::from_secs(READ_TIMEOUT_SECS),
        }
    }
}

impl ReceiverConfig {
    pub fn from_env() -> Result<Self, DeliveryError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from any key lookup. A blank URL falls back to the
    /// default receiver.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, DeliveryError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_RECEIVER_URL).filter(|v| !v.trim().is_empty()) {
            config.url = url.trim().to_string();
        }

        if let Some(raw) = lookup(ENV_MAX_RETRIES) {
            let max_retries: u32 = raw.trim().parse().map_err(|_| {
                DeliveryError::Configuration(format!("{ENV_MAX_RETRIES} is not a number: {raw}"))
            })?;
            if max_retries == 0 {
                return Err(DeliveryError::Configuration(format!(
                    "{ENV_MAX_RETRIES} must be at least 1"
                )));
            }
            config.max_retries = max_retries;
        }

        if let Some(raw) = lookup(ENV_RETRY_DELAY_MS) {
            let delay_ms: u64 = raw.trim().parse().map_err(|_| {
                DeliveryError::Configuration(format!("{ENV_RETRY_DELAY_MS} is not a number: {raw}"))
            })?;
            config.retry_delay = Duration::from_millis(delay_ms);
        }

        Ok(config)
    }
}

#[derive(Clone)]
pub struct ReceiverClient {
    client: Client,
    config: ReceiverConfig,
}

impl ReceiverClient {
    pub fn new(config: ReceiverConfig) -> Result<Self, DeliveryError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.read_timeout)
            .build()
            .map_err(|e| DeliveryError::Configuration(error_chain(&e)))?;

        tracing::debug!(url = %config.url, "Receiver client initialized");
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ReceiverConfig {
        &self.config
    }

    /// One POST, classified
    async fn attempt(&self, body: &str) -> Result<Acknowledgement, DeliveryError> {
        let response = self
            .client
            .post(&self.config.url)
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .body(body.to_owned())
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        let text = response.text().await.map_err(classify_transport)?;
        tracing::debug!(status = status.as_u16(), body = %text, "Receiver responded");

        classify_response(status, text)
    }
}

#[async_trait]
impl Delivery for ReceiverClient {
    async fn send(&self, body: &str) -> Result<Acknowledgement, DeliveryError> {
        let max_retries = self.config.max_retries;
        tracing::debug!(bytes = body.len(), "Sending payload to receiver");

        for attempt in 1..=max_retries {
            tracing::debug!(attempt, max_retries, "Delivery attempt");

            match self.attempt(body).await {
                Ok(ack) => {
                    tracing::info!(job_id = ?ack.job_id, attempt, "Receiver accepted payload");
                    return Ok(ack);
                }
                Err(e) if e.is_retryable() => {
                    tracing::warn!(attempt, max_retries, error = %e, "Delivery attempt failed");
                    if attempt == max_retries {
                        tracing::error!(attempts = max_retries, "Failed to send data to receiver");
                        return Err(DeliveryError::RetriesExhausted {
                            attempts: max_retries,
                            last_error: Box::new(e),
                        });
                    }
                    tokio::time::sleep(self.config.retry_delay).await;
                }
                Err(e) => {
                    tracing::error!(attempt, error = %e, "Delivery failed, not retrying");
                    return Err(e);
                }
            }
        }

        Err(DeliveryError::Configuration(format!(
            "max retries must be at least 1, got {max_retries}"
        )))
    }
}

fn classify_response(status: StatusCode, body: String) -> Result<Acknowledgement, DeliveryError> {
    let code = status.as_u16();
    match code {
        202 => {
            if body.trim().is_empty() {
                return Ok(Acknowledgement::default());
            }
            serde_json::from_str(&body).map_err(|e| DeliveryError::InvalidAcknowledgement(e.to_string()))
        }
        500.. => Err(DeliveryError::ServerError { status: code, body }),
        400..=499 => Err(DeliveryError::ClientError { status: code, body }),
        _ => Err(DeliveryError::UnexpectedStatus { status: code, body }),
    }
}

/// Timeouts and refused connections are always transient; anything else is
/// judged by its message
fn classify_transport(err: reqwest::Error) -> DeliveryError {
    let message = error_chain(&err);
    if err.is_timeout() || err.is_connect() {
        DeliveryError::transient_transport(message)
    } else {
        DeliveryError::transport(message)
    }
}
