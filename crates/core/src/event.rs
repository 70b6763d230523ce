//! Progress events and severity classification.
//!
//! The runner reports step-level progress with a status vocabulary that
//! is richer than the session lifecycle: `ACTIVATED` marks a fallback
//! code path, not a terminal condition, and new values may appear on
//! the runner side without notice. Classification for display collapses
//! that vocabulary into exactly one [`LogClass`] per event.

use serde::{Deserialize, Serialize};

/// Step-level status reported by the runner.
///
/// Unknown values deserialize as [`StepStatus::Unknown`] rather than
/// failing the whole event; they classify as running-class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepStatus {
    Success,
    Failed,
    InProgress,
    Warning,
    Running,
    /// A fallback code path was engaged. Non-terminal, non-error.
    Activated,
    #[serde(other)]
    Unknown,
}

/// Optional severity override carried on an event.
///
/// When present, `ERROR` and `WARNING` take precedence over the step
/// status for classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Level {
    Error,
    Warning,
    Info,
}

/// Display classification for a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogClass {
    Success,
    Failed,
    /// Covers `IN_PROGRESS` and `RUNNING` (and unknown statuses).
    Running,
    Warning,
    /// Covers `ACTIVATED`.
    Fallback,
}

impl std::fmt::Display for LogClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            LogClass::Success => "SUCCESS",
            LogClass::Failed => "FAILED",
            LogClass::Running => "RUNNING",
            LogClass::Warning => "WARNING",
            LogClass::Fallback => "FALLBACK",
        };
        f.pad(label)
    }
}

/// A non-terminal progress update received over the event channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Label of the step being reported.
    pub step: String,
    pub status: StepStatus,
    /// Completion percentage (0-100). Absent means "no change".
    pub progress: Option<u8>,
    /// Human-readable detail.
    pub message: String,
    pub level: Option<Level>,
    /// Raw compound detail string, `|`-delimited (see [`crate::log`]).
    pub details: Option<String>,
}

/// Collapse an event's status and optional level into one [`LogClass`].
///
/// Precedence: error > warning > fallback > success > running. A
/// `level` of `ERROR` or `WARNING` overrides the step status; `INFO`
/// does not.
pub fn classify(status: &StepStatus, level: Option<Level>) -> LogClass {
    if level == Some(Level::Error) || *status == StepStatus::Failed {
        return LogClass::Failed;
    }
    if level == Some(Level::Warning) || *status == StepStatus::Warning {
        return LogClass::Warning;
    }
    match status {
        StepStatus::Activated => LogClass::Fallback,
        StepStatus::Success => LogClass::Success,
        StepStatus::InProgress | StepStatus::Running | StepStatus::Unknown => LogClass::Running,
        // Failed and Warning are handled above.
        StepStatus::Failed => LogClass::Failed,
        StepStatus::Warning => LogClass::Warning,
    }
}
