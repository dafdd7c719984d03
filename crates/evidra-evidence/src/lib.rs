//! Evidence sink client.
//!
//! One activity, one POST. No retries, no batching: the caller decides what to do with a
//! failure.

#![forbid(unsafe_code)]

use evidra_types::Activity;
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use std::time::{Duration, Instant};

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("build http client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("serialize activity: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("post to {endpoint}: {source}")]
    Transport {
        endpoint: String,
        source: reqwest::Error,
    },

    #[error("evidence push failed: {status}: {body}")]
    Rejected { status: StatusCode, body: String },

    #[error("deadline exceeded publishing to {endpoint}")]
    DeadlineExceeded { endpoint: String },
}

/// Posts activity records to a single endpoint.
#[derive(Clone, Debug)]
pub struct EvidencePublisher {
    endpoint: String,
    timeout: Duration,
    client: reqwest::blocking::Client,
}

impl EvidencePublisher {
    /// `timeout` bounds every request made through this publisher.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, PublishError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(PublishError::Client)?;
        Ok(Self {
            endpoint: endpoint.into(),
            timeout,
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn publish(&self, activity: &Activity) -> Result<(), PublishError> {
        self.publish_until(activity, None)
    }

    /// Publish, giving up once `deadline` passes. An already expired deadline sends nothing.
    pub fn publish_until(
        &self,
        activity: &Activity,
        deadline: Option<Instant>,
    ) -> Result<(), PublishError> {
        let payload = serde_json::to_vec(activity)?;

        let mut request = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .body(payload);

        if let Some(deadline) = deadline {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(self.deadline_exceeded());
            }
            request = request.timeout(remaining.min(self.timeout));
        }

        tracing::debug!(
            endpoint = %self.endpoint,
            kind = %activity.kind(),
            "publishing activity"
        );

        let response = request.send().map_err(|source| {
            if source.is_timeout() && deadline.is_some_and(|d| Instant::now() >= d) {
                self.deadline_exceeded()
            } else {
                PublishError::Transport {
                    endpoint: self.endpoint.clone(),
                    source,
                }
            }
        })?;

        let status = response.status();
        if status != StatusCode::NO_CONTENT {
            // Best effort: an unreadable body still reports the status.
            let body = response.text().unwrap_or_default();
            tracing::warn!(endpoint = %self.endpoint, %status, "evidence sink rejected activity");
            return Err(PublishError::Rejected { status, body });
        }

        tracing::info!(endpoint = %self.endpoint, "published activity");
        Ok(())
    }

    fn deadline_exceeded(&self) -> PublishError {
        PublishError::DeadlineExceeded {
            endpoint: self.endpoint.clone(),
        }
    }
}
