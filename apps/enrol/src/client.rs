//! # Admissions HTTP Client
//!
//! Posts the form aggregate to the admissions backend.
//!
//! Every failure mode (timeout, unreachable host, non-2xx status) comes back
//! as a `SubmitError`; the caller decides whether to retry.

use crate::Config;
use enrol_core::FormData;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

/// Errors from the submission request.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("Submission timed out after {0:?}")]
    Timeout(Duration),

    #[error("Cannot reach the admissions server at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    /// The server answered with a status outside 2xx.
    #[error("Server rejected the submission ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Cannot build HTTP client: {0}")]
    Client(String),
}

/// What the backend said when it accepted the application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ack {
    pub status: u16,
    /// Response body: JSON when it parses, a string otherwise, null when empty.
    pub body: Value,
}

/// HTTP client bound to one submission endpoint.
#[derive(Debug, Clone)]
pub struct SubmitClient {
    http: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl SubmitClient {
    /// Create a client for `url` with a whole-request `timeout`.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, SubmitError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SubmitError::Client(e.to_string()))?;
        Ok(Self {
            http,
            url: url.into(),
            timeout,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, SubmitError> {
        Self::new(config.submit_url(), config.submit_timeout())
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// POST the aggregate as JSON.
    pub async fn submit(&self, payload: &FormData) -> Result<Ack, SubmitError> {
        let resp = self
            .http
            .post(&self.url)
            .json(payload)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| self.classify(e))?;

        if !status.is_success() {
            return Err(SubmitError::Rejected {
                status: status.as_u16(),
                body: text,
            });
        }

        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };
        Ok(Ack {
            status: status.as_u16(),
            body,
        })
    }

    fn classify(&self, error: reqwest::Error) -> SubmitError {
        if error.is_timeout() {
            SubmitError::Timeout(self.timeout)
        } else {
            SubmitError::ConnectionFailed {
                url: self.url.clone(),
                reason: error.to_string(),
            }
        }
    }
}
