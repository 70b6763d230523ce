//! Session state for one observed job lifecycle.

use serde::{Deserialize, Serialize};

use crate::log::LogHistory;
use crate::types::SessionId;

/// Observer-side lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    /// No job is being tracked.
    Idle,
    /// The start request was issued; no progress event has arrived yet.
    Submitting,
    Running,
    Succeeded,
    Failed,
}

impl SessionStatus {
    /// Whether this is one of the two terminal states.
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionStatus::Succeeded | SessionStatus::Failed)
    }
}

/// Descriptive metadata for a produced artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoInfo {
    pub title: String,
    /// Human-formatted duration, stored verbatim (e.g. `"3m2s"`).
    pub duration: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    /// Directly fetchable media locator, when the runner exposes one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size_bytes: Option<u64>,
}

/// Terminal success outcome: where to fetch the artifact, plus metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobResult {
    /// GET-able locator for the produced artifact. The observer tracks
    /// and exposes it; it never proxies the bytes.
    pub download_url: String,
    pub video_info: VideoInfo,
}

/// Terminal failure outcome as reported by the runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobError {
    pub message: String,
    /// Optional machine classification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

/// The complete renderable state of one observed session.
///
/// Owned by the session registry; mutated only by the reducer and the
/// submission orchestrator. `result` is present exactly when
/// `status == Succeeded`, `error` exactly when `status == Failed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Assigned by the runner at acceptance; `None` until bound.
    pub session_id: Option<SessionId>,
    pub status: SessionStatus,
    /// Displayed percentage, 0-100, monotonically non-decreasing while
    /// `Running`.
    pub progress: u8,
    /// Label of the most recently reported step.
    pub current_step: String,
    pub result: Option<JobResult>,
    pub error: Option<JobError>,
    pub logs: LogHistory,
}

impl Session {
    /// The untracked state.
    pub fn idle() -> Self {
        Self {
            session_id: None,
            status: SessionStatus::Idle,
            progress: 0,
            current_step: String::new(),
            result: None,
            error: None,
            logs: LogHistory::new(),
        }
    }

    /// Fresh state for a submission that has just been issued.
    pub fn submitting() -> Self {
        Self {
            current_step: "Initializing".into(),
            status: SessionStatus::Submitting,
            ..Self::idle()
        }
    }

    /// Whether the given id matches this session's bound id.
    pub fn is_tracking(&self, session_id: &str) -> bool {
        self.session_id.as_deref() == Some(session_id)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::idle()
    }
}
