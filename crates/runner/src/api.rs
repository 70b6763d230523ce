//! REST client for the runner's start-job endpoint.
//!
//! Wraps the single HTTP call that kicks off a job using [`reqwest`].
//! The runner acknowledges with a session id or a rejection; both
//! non-2xx statuses and `success: false` bodies map to errors.

use serde::Deserialize;
use vidwatch_core::types::SessionId;

/// HTTP client for one job runner.
pub struct RunnerApi {
    client: reqwest::Client,
    api_url: String,
}

/// Acknowledgment returned by the start-job endpoint.
#[derive(Debug, Deserialize)]
pub struct StartJobResponse {
    #[serde(default)]
    pub success: bool,
    /// Runner-assigned identifier for the accepted job.
    #[serde(default)]
    pub session_id: Option<SessionId>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Errors from the start-job REST layer.
#[derive(Debug, thiserror::Error)]
pub enum RunnerApiError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The runner returned a non-2xx status with no parseable body.
    #[error("Job runner error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The runner explicitly rejected the submission.
    #[error("{0}")]
    Rejected(String),

    /// The runner acknowledged with a body this client cannot use.
    #[error("Malformed runner response: {0}")]
    Malformed(String),
}

impl RunnerApi {
    /// Create a new API client for a runner.
    ///
    /// * `api_url` - Base HTTP URL, e.g. `http://host:5000`.
    pub fn new(api_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url,
        }
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_url: String) -> Self {
        Self { client, api_url }
    }

    /// Submit a job for the given source locator.
    ///
    /// Sends `POST /api/download-video` and returns the runner-assigned
    /// session id. Rejections (`success: false`, at any HTTP status)
    /// surface the runner's `error` message.
    pub async fn start_job(&self, source_url: &str) -> Result<SessionId, RunnerApiError> {
        let body = serde_json::json!({
            "source_url": source_url,
        });

        let response = self
            .client
            .post(format!("{}/api/download-video", self.api_url))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        match serde_json::from_str::<StartJobResponse>(&text) {
            Ok(ack) if ack.success => ack.session_id.ok_or_else(|| {
                RunnerApiError::Malformed("success acknowledgment without session_id".to_string())
            }),
            Ok(ack) => Err(RunnerApiError::Rejected(ack.error.unwrap_or_else(|| {
                format!("job runner returned status {status}")
            }))),
            Err(_) if !status.is_success() => Err(RunnerApiError::Api {
                status: status.as_u16(),
                body: text,
            }),
            Err(e) => Err(RunnerApiError::Malformed(e.to_string())),
        }
    }
}
