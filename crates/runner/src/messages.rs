//! Channel message types and parser.
//!
//! The runner sends JSON text frames shaped
//! `{"topic": "<kind>", "data": {...}}`. Ordinary progress updates
//! arrive on the `progress` topic; the two mutually exclusive terminal
//! notifications arrive on the dedicated `complete` and `error` topics
//! rather than as status values on a progress event.

use serde::Deserialize;
use vidwatch_core::event::{Level, ProgressEvent, StepStatus};
use vidwatch_core::session::VideoInfo;
use vidwatch_core::types::SessionId;

/// All known channel message kinds.
///
/// Deserialized via the internally-tagged `"topic"` field with
/// associated `"data"` content.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "topic", content = "data", rename_all = "lowercase")]
pub enum RunnerMessage {
    /// A non-terminal step-level progress update.
    Progress(ProgressPayload),

    /// The job finished; carries the artifact locator and metadata.
    Complete(CompletePayload),

    /// The job failed; terminal.
    Error(ErrorPayload),
}

/// Payload of `progress` messages.
///
/// `session_id` is optional: events without one are scoped to the
/// channel subscription that requested them.
#[derive(Debug, Clone, Deserialize)]
pub struct ProgressPayload {
    #[serde(default)]
    pub session_id: Option<SessionId>,
    pub step: String,
    pub status: StepStatus,
    #[serde(default)]
    pub progress: Option<u8>,
    pub message: String,
    #[serde(default)]
    pub level: Option<Level>,
    #[serde(default)]
    pub details: Option<String>,
}

impl ProgressPayload {
    /// Split into the session scope and the domain event.
    pub fn into_event(self) -> (Option<SessionId>, ProgressEvent) {
        (
            self.session_id,
            ProgressEvent {
                step: self.step,
                status: self.status,
                progress: self.progress,
                message: self.message,
                level: self.level,
                details: self.details,
            },
        )
    }
}

/// Payload of `complete` messages.
#[derive(Debug, Clone, Deserialize)]
pub struct CompletePayload {
    pub session_id: SessionId,
    pub download_url: String,
    pub video_info: VideoInfo,
}

/// Payload of `error` messages.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorPayload {
    pub session_id: SessionId,
    pub message: String,
    /// Optional machine classification of the failure.
    #[serde(default)]
    pub kind: Option<String>,
}

/// Parse a channel text frame into a typed message.
///
/// Returns `Err` for malformed JSON, unknown `topic` values, or
/// missing required fields. Callers should log and continue.
pub fn parse_message(text: &str) -> Result<RunnerMessage, serde_json::Error> {
    serde_json::from_str(text)
}
