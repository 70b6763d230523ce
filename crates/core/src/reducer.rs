//! The progress reducer: folds channel events into a [`Session`].
//!
//! States: `Idle -> Submitting -> Running -> {Succeeded | Failed}`,
//! with `Idle` reachable from any state via explicit clear (the
//! registry's job). All transitions are applied in arrival order and
//! are idempotent with respect to re-delivered events: the same event
//! applied twice moves nothing twice and logs nothing twice.

use crate::event::ProgressEvent;
use crate::log::LogEntry;
use crate::session::{JobError, JobResult, Session, SessionStatus};

/// Step label shown while the channel is stalled or the job has failed.
pub const STEP_ERROR: &str = "Error";

/// Step label shown once the completion signal arrives.
pub const STEP_COMPLETE: &str = "Download Complete";

/// Apply a non-terminal progress event.
///
/// Transitions the session to `Running` (if not already), raises the
/// displayed percentage to `max(current, event.progress)` without ever
/// lowering it, updates `current_step` to the most recent label even
/// when the numeric value is stale, and appends a classified log entry.
/// Events arriving after a terminal state are ignored.
pub fn apply_progress(session: &mut Session, event: &ProgressEvent) {
    if session.status.is_terminal() {
        return;
    }

    session.status = SessionStatus::Running;
    if let Some(pct) = event.progress {
        let pct = pct.min(100);
        if pct > session.progress {
            session.progress = pct;
        }
    }
    if !event.step.is_empty() {
        session.current_step = event.step.clone();
    }
    session.logs.push(LogEntry::from_event(event));
}

/// Apply the terminal completion signal.
///
/// Always sets `progress = 100` and `status = Succeeded`, regardless of
/// the last percentage seen. A second completion for an already
/// terminal session is ignored, so the result cannot be recorded twice.
pub fn apply_complete(session: &mut Session, result: JobResult) {
    if session.status.is_terminal() {
        return;
    }

    session.status = SessionStatus::Succeeded;
    session.progress = 100;
    session.current_step = STEP_COMPLETE.into();
    session.result = Some(result);
}

/// Apply the terminal error signal.
///
/// Records the failure and freezes the session: no further events are
/// applied or logged after this point.
pub fn apply_error(session: &mut Session, error: JobError) {
    if session.status.is_terminal() {
        return;
    }

    session.status = SessionStatus::Failed;
    session.current_step = STEP_ERROR.into();
    session.error = Some(error);
}

/// Record a transport-level disconnect before any terminal signal.
///
/// This is not a terminal condition: the session stays `Running`, the
/// accumulated logs are preserved, and a warning-class entry plus the
/// `"Error"` display step surface the stall to observers. No retry is
/// attempted at this layer.
pub fn apply_channel_stalled(session: &mut Session, detail: &str) {
    if session.status.is_terminal() || session.status == SessionStatus::Idle {
        return;
    }

    session.current_step = STEP_ERROR.into();
    session.logs.push(LogEntry::from_event(&ProgressEvent {
        step: "Connection".into(),
        status: crate::event::StepStatus::Warning,
        progress: None,
        message: detail.into(),
        level: Some(crate::event::Level::Warning),
        details: None,
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Level, LogClass, StepStatus};
    use crate::session::VideoInfo;

    fn progress_event(step: &str, status: StepStatus, pct: Option<u8>, msg: &str) -> ProgressEvent {
        ProgressEvent {
            step: step.into(),
            status,
            progress: pct,
            message: msg.into(),
            level: None,
            details: None,
        }
    }

    fn demo_result() -> JobResult {
        JobResult {
            download_url: "/files/s1.mp4".into(),
            video_info: VideoInfo {
                title: "Demo".into(),
                duration: "3:02".into(),
                thumbnail_url: None,
                media_url: None,
                file_size_bytes: None,
            },
        }
    }

    // -- progress ------------------------------------------------------------

    #[test]
    fn first_progress_event_moves_to_running() {
        let mut s = Session::submitting();
        apply_progress(
            &mut s,
            &progress_event("Fetching", StepStatus::Running, Some(20), "fetching stream"),
        );
        assert_eq!(s.status, SessionStatus::Running);
        assert_eq!(s.progress, 20);
        assert_eq!(s.current_step, "Fetching");
        assert_eq!(s.logs.len(), 1);
    }

    #[test]
    fn non_decreasing_progress_tracks_last_value() {
        let mut s = Session::submitting();
        for pct in [10u8, 35, 35, 80] {
            apply_progress(
                &mut s,
                &progress_event("Step", StepStatus::Running, Some(pct), &format!("at {pct}")),
            );
        }
        assert_eq!(s.progress, 80);
    }

    #[test]
    fn lower_progress_never_regresses_display() {
        let mut s = Session::submitting();
        apply_progress(
            &mut s,
            &progress_event("Fetch", StepStatus::Running, Some(60), "fetching"),
        );
        apply_progress(
            &mut s,
            &progress_event("Transcode", StepStatus::Running, Some(40), "transcoding"),
        );
        // Number holds, but step and logs still advance.
        assert_eq!(s.progress, 60);
        assert_eq!(s.current_step, "Transcode");
        assert_eq!(s.logs.len(), 2);
    }

    #[test]
    fn equal_progress_different_step_updates_step() {
        let mut s = Session::submitting();
        apply_progress(
            &mut s,
            &progress_event("Fetch", StepStatus::Running, Some(50), "a"),
        );
        apply_progress(
            &mut s,
            &progress_event("Mux", StepStatus::Running, Some(50), "b"),
        );
        assert_eq!(s.current_step, "Mux");
        assert_eq!(s.progress, 50);
    }

    #[test]
    fn absent_progress_means_no_change() {
        let mut s = Session::submitting();
        apply_progress(
            &mut s,
            &progress_event("Fetch", StepStatus::Running, Some(30), "a"),
        );
        apply_progress(
            &mut s,
            &progress_event("Fetch", StepStatus::Running, None, "b"),
        );
        assert_eq!(s.progress, 30);
    }

    #[test]
    fn progress_is_clamped_to_100() {
        let mut s = Session::submitting();
        apply_progress(
            &mut s,
            &progress_event("Fetch", StepStatus::Running, Some(250), "overflow"),
        );
        assert_eq!(s.progress, 100);
    }

    #[test]
    fn empty_step_keeps_current_label() {
        let mut s = Session::submitting();
        apply_progress(
            &mut s,
            &progress_event("Fetch", StepStatus::Running, Some(10), "a"),
        );
        apply_progress(&mut s, &progress_event("", StepStatus::Running, Some(20), "b"));
        assert_eq!(s.current_step, "Fetch");
        assert_eq!(s.progress, 20);
    }

    #[test]
    fn identical_event_twice_logs_once_and_moves_nothing_twice() {
        let mut s = Session::submitting();
        let e = progress_event("Fetch", StepStatus::Running, Some(42), "halfway-ish");
        apply_progress(&mut s, &e);
        apply_progress(&mut s, &e);
        assert_eq!(s.progress, 42);
        assert_eq!(s.logs.len(), 1);
        assert_eq!(s.status, SessionStatus::Running);
    }

    #[test]
    fn activated_event_is_fallback_class_and_non_terminal() {
        let mut s = Session::submitting();
        apply_progress(
            &mut s,
            &progress_event("Transcode", StepStatus::Running, Some(10), "start"),
        );
        apply_progress(
            &mut s,
            &progress_event(
                "Transcode",
                StepStatus::Activated,
                None,
                "fallback engine engaged",
            ),
        );
        assert_eq!(s.status, SessionStatus::Running);
        assert_eq!(s.logs.last().unwrap().class, LogClass::Fallback);
    }

    #[test]
    fn failed_class_event_does_not_terminate() {
        // Error-class log events are diagnostics; only the dedicated
        // error signal terminates the session.
        let mut s = Session::submitting();
        let mut e = progress_event("Fetch", StepStatus::Running, None, "retrying segment");
        e.level = Some(Level::Error);
        apply_progress(&mut s, &e);
        assert_eq!(s.status, SessionStatus::Running);
        assert_eq!(s.logs.last().unwrap().class, LogClass::Failed);
    }

    // -- completion ----------------------------------------------------------

    #[test]
    fn completion_sets_100_and_succeeded() {
        let mut s = Session::submitting();
        apply_progress(
            &mut s,
            &progress_event("Fetch", StepStatus::Running, Some(20), "fetching"),
        );
        apply_complete(&mut s, demo_result());
        assert_eq!(s.status, SessionStatus::Succeeded);
        assert_eq!(s.progress, 100);
        assert_eq!(s.current_step, STEP_COMPLETE);
        assert_eq!(s.result.as_ref().unwrap().video_info.title, "Demo");
        assert!(s.error.is_none());
    }

    #[test]
    fn second_completion_is_ignored() {
        let mut s = Session::submitting();
        apply_complete(&mut s, demo_result());
        let mut other = demo_result();
        other.video_info.title = "Other".into();
        apply_complete(&mut s, other);
        assert_eq!(s.result.as_ref().unwrap().video_info.title, "Demo");
    }

    #[test]
    fn events_after_completion_are_ignored() {
        let mut s = Session::submitting();
        apply_complete(&mut s, demo_result());
        let logs_before = s.logs.len();
        apply_progress(
            &mut s,
            &progress_event("Late", StepStatus::Running, Some(10), "late event"),
        );
        assert_eq!(s.status, SessionStatus::Succeeded);
        assert_eq!(s.progress, 100);
        assert_eq!(s.logs.len(), logs_before);
    }

    // -- error ---------------------------------------------------------------

    #[test]
    fn error_signal_yields_exactly_one_failed_state() {
        let mut s = Session::submitting();
        apply_progress(
            &mut s,
            &progress_event("Fetch", StepStatus::Running, Some(55), "fetching"),
        );
        apply_error(
            &mut s,
            JobError {
                message: "source unavailable".into(),
                kind: None,
            },
        );
        assert_eq!(s.status, SessionStatus::Failed);
        assert_eq!(s.current_step, STEP_ERROR);
        assert_eq!(s.error.as_ref().unwrap().message, "source unavailable");
        // Accumulated logs survive the failure.
        assert_eq!(s.logs.len(), 1);
    }

    #[test]
    fn no_log_appends_after_error() {
        let mut s = Session::submitting();
        apply_error(
            &mut s,
            JobError {
                message: "boom".into(),
                kind: None,
            },
        );
        apply_progress(
            &mut s,
            &progress_event("Late", StepStatus::Running, Some(10), "late"),
        );
        assert!(s.logs.is_empty());
    }

    #[test]
    fn completion_after_error_is_ignored() {
        let mut s = Session::submitting();
        apply_error(
            &mut s,
            JobError {
                message: "boom".into(),
                kind: None,
            },
        );
        apply_complete(&mut s, demo_result());
        assert_eq!(s.status, SessionStatus::Failed);
        assert!(s.result.is_none());
    }

    // -- channel stall -------------------------------------------------------

    #[test]
    fn stall_keeps_running_and_preserves_logs() {
        let mut s = Session::submitting();
        apply_progress(
            &mut s,
            &progress_event("Fetch", StepStatus::Running, Some(70), "fetching"),
        );
        apply_channel_stalled(&mut s, "event channel disconnected");
        assert_eq!(s.status, SessionStatus::Running);
        assert_eq!(s.current_step, STEP_ERROR);
        assert_eq!(s.progress, 70);
        assert_eq!(s.logs.len(), 2);
        assert_eq!(s.logs.last().unwrap().class, LogClass::Warning);
    }

    #[test]
    fn stall_after_terminal_is_a_no_op() {
        let mut s = Session::submitting();
        apply_complete(&mut s, demo_result());
        apply_channel_stalled(&mut s, "disconnected");
        assert_eq!(s.status, SessionStatus::Succeeded);
        assert_eq!(s.current_step, STEP_COMPLETE);
        assert!(s.logs.is_empty());
    }
}
