//! Channel message processing loop.
//!
//! Reads raw frames from a channel subscription, parses them into
//! typed [`RunnerMessage`]s, and feeds the core reducer through the
//! registry. Runs as a dedicated task so that handling one event never
//! blocks delivery of the next, and exits when the subscription is
//! cancelled, a terminal signal lands, or the transport drops.

use std::collections::VecDeque;
use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::watch;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use vidwatch_core::reducer;
use vidwatch_core::session::{JobError, JobResult};
use vidwatch_core::types::SessionId;

use crate::messages::{parse_message, RunnerMessage};
use crate::registry::SessionRegistry;

/// Maximum number of events buffered before the session id is bound.
///
/// The channel opens before the start request is acknowledged, so
/// events can arrive before the observer knows its session id. They
/// are held here and reconciled once the id lands; past the cap the
/// oldest are dropped.
pub const PENDING_EVENT_CAP: usize = 64;

/// Whether the loop keeps reading after a dispatched message.
#[derive(PartialEq)]
enum Flow {
    Continue,
    /// A terminal signal was applied; the subscription is closed.
    Stop,
}

/// Process channel messages until the subscription ends.
///
/// `binding_rx` carries the runner-assigned session id once the start
/// request is acknowledged; messages received before that are buffered
/// and reconciled in arrival order. On a transport drop before any
/// terminal signal the session is marked stalled, never failed.
pub async fn process_messages(
    mut ws_stream: tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >,
    registry: Arc<SessionRegistry>,
    mut binding_rx: watch::Receiver<Option<SessionId>>,
    cancel: CancellationToken,
) {
    let mut pending: VecDeque<RunnerMessage> = VecDeque::new();
    let mut bound = binding_rx.borrow().is_some();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!("Channel subscription cancelled");
                return;
            }

            changed = binding_rx.changed(), if !bound => {
                if changed.is_err() {
                    // The submission was abandoned before an id arrived;
                    // cancellation follows shortly.
                    bound = true;
                    pending.clear();
                    continue;
                }
                bound = binding_rx.borrow_and_update().is_some();
                if bound {
                    while let Some(msg) = pending.pop_front() {
                        if dispatch(msg, &registry, &cancel).await == Flow::Stop {
                            return;
                        }
                    }
                }
            }

            frame = ws_stream.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        let msg = match parse_message(&text) {
                            Ok(msg) => msg,
                            Err(e) => {
                                tracing::warn!(
                                    error = %e,
                                    raw_message = %text,
                                    "Discarding malformed channel message",
                                );
                                continue;
                            }
                        };
                        if !bound {
                            if pending.len() == PENDING_EVENT_CAP {
                                tracing::warn!("Pending event buffer full, dropping oldest");
                                pending.pop_front();
                            }
                            pending.push_back(msg);
                        } else if dispatch(msg, &registry, &cancel).await == Flow::Stop {
                            return;
                        }
                    }
                    Some(Ok(Message::Binary(_))) => {
                        tracing::trace!("Ignoring binary frame");
                    }
                    Some(Ok(Message::Ping(_) | Message::Pong(_))) => {
                        // Handled automatically by tungstenite.
                    }
                    Some(Ok(Message::Close(close_frame))) => {
                        tracing::info!(?close_frame, "Runner closed the event channel");
                        mark_stalled(&registry, "event channel closed by the runner").await;
                        return;
                    }
                    Some(Ok(Message::Frame(_))) => {}
                    Some(Err(e)) => {
                        tracing::error!(error = %e, "Event channel receive error");
                        mark_stalled(&registry, "event channel connection lost").await;
                        return;
                    }
                    None => {
                        tracing::info!("Event channel stream ended");
                        mark_stalled(&registry, "event channel connection lost").await;
                        return;
                    }
                }
            }
        }
    }
}

/// Apply one parsed message to the tracked session.
async fn dispatch(
    msg: RunnerMessage,
    registry: &SessionRegistry,
    cancel: &CancellationToken,
) -> Flow {
    match msg {
        RunnerMessage::Progress(payload) => {
            let (scope, event) = payload.into_event();
            let applied = registry
                .update_scoped(scope.as_deref(), |session| {
                    reducer::apply_progress(session, &event)
                })
                .await;
            if !applied {
                tracing::trace!(
                    session_id = scope.as_deref().unwrap_or("<channel>"),
                    "Discarding progress event for untracked session",
                );
            }
            Flow::Continue
        }

        RunnerMessage::Complete(payload) => {
            let result = JobResult {
                download_url: payload.download_url,
                video_info: payload.video_info,
            };
            let applied = registry
                .update_scoped(Some(&payload.session_id), |session| {
                    reducer::apply_complete(session, result)
                })
                .await;
            if applied {
                tracing::info!(session_id = %payload.session_id, "Job completed");
                cancel.cancel();
                Flow::Stop
            } else {
                tracing::trace!(
                    session_id = %payload.session_id,
                    "Discarding completion for untracked session",
                );
                Flow::Continue
            }
        }

        RunnerMessage::Error(payload) => {
            let error = JobError {
                message: payload.message,
                kind: payload.kind,
            };
            let applied = registry
                .update_scoped(Some(&payload.session_id), |session| {
                    reducer::apply_error(session, error)
                })
                .await;
            if applied {
                tracing::warn!(session_id = %payload.session_id, "Job failed");
                cancel.cancel();
                Flow::Stop
            } else {
                tracing::trace!(
                    session_id = %payload.session_id,
                    "Discarding error signal for untracked session",
                );
                Flow::Continue
            }
        }
    }
}

/// Record a pre-terminal transport drop. Not a terminal state: logs
/// are preserved and the session stays `Running`.
async fn mark_stalled(registry: &SessionRegistry, detail: &str) {
    registry
        .update_scoped(None, |session| {
            reducer::apply_channel_stalled(session, detail)
        })
        .await;
}
