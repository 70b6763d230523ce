//! The observer facade: submission orchestration plus state access.
//!
//! [`JobObserver`] owns the session registry and the channel
//! subscription lifecycle. `submit` opens the event channel *before*
//! sending the start request, so the first progress event cannot be
//! missed; the processing task buffers anything that arrives before
//! the session id is bound.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use vidwatch_core::session::Session;
use vidwatch_core::types::SessionId;

use crate::api::{RunnerApi, RunnerApiError};
use crate::channel::RunnerChannel;
use crate::processor::process_messages;
use crate::registry::SessionRegistry;

/// Timeout for a processing task to exit during shutdown.
const SHUTDOWN_TASK_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection endpoints for one job runner.
#[derive(Debug, Clone)]
pub struct ObserverConfig {
    /// Start-job endpoint base URL, e.g. `http://host:5000`.
    pub api_url: String,
    /// Event channel transport address, e.g. `ws://host:5000`.
    pub ws_url: String,
}

/// Errors surfaced by [`JobObserver::submit`]. In every case no
/// session is left in the registry and no subscription is left open.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// The event channel could not be opened.
    #[error("Failed to open event channel: {0}")]
    Channel(String),

    /// The start request could not be delivered or answered sensibly.
    #[error("Job submission failed: {0}")]
    Request(String),

    /// The runner explicitly rejected the submission.
    #[error("Job submission rejected: {0}")]
    Rejected(String),
}

/// Tracks one job at a time from submission to a terminal state.
///
/// Created once and shared via `Arc`; all methods take `&self`.
pub struct JobObserver {
    api: RunnerApi,
    channel: RunnerChannel,
    registry: Arc<SessionRegistry>,
    /// The live submission's binding sender and task handle, if any.
    active: Mutex<Option<ActiveSubscription>>,
}

struct ActiveSubscription {
    /// Keeps the session-id binding channel alive for the processor.
    #[allow(dead_code)]
    binding_tx: watch::Sender<Option<SessionId>>,
    task: JoinHandle<()>,
}

impl JobObserver {
    pub fn new(config: ObserverConfig) -> Self {
        Self {
            api: RunnerApi::new(config.api_url),
            channel: RunnerChannel::new(config.ws_url),
            registry: Arc::new(SessionRegistry::new()),
            active: Mutex::new(None),
        }
    }

    /// Subscribe to session-state snapshots.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.registry.subscribe()
    }

    /// Snapshot of the current session state.
    pub async fn current(&self) -> Session {
        self.registry.current().await
    }

    /// Snapshot of the session with the given id, if tracked.
    pub async fn get(&self, session_id: &str) -> Option<Session> {
        self.registry.get(session_id).await
    }

    /// Submit a job for the given source locator.
    ///
    /// Any prior session is invalidated first (its subscription is
    /// torn down, its registry entry cleared). The channel opens before
    /// the start request goes out; on any failure the partially-open
    /// subscription is closed and no session is created.
    pub async fn submit(&self, source_url: &str) -> Result<SessionId, SubmitError> {
        let mut active = self.active.lock().await;

        // Starting a new submission invalidates tracking of the prior one.
        if active.take().is_some() {
            self.registry.reset().await;
        }

        let subscription = self
            .channel
            .subscribe()
            .await
            .map_err(|e| SubmitError::Channel(e.to_string()))?;

        let cancel = CancellationToken::new();
        let (binding_tx, binding_rx) = watch::channel(None);

        self.registry.begin(cancel.clone()).await;

        let task = tokio::spawn(process_messages(
            subscription.ws_stream,
            Arc::clone(&self.registry),
            binding_rx,
            cancel.clone(),
        ));

        match self.api.start_job(source_url).await {
            Ok(session_id) => {
                self.registry.bind(session_id.clone()).await;
                binding_tx.send_replace(Some(session_id.clone()));
                *active = Some(ActiveSubscription { binding_tx, task });
                tracing::info!(session_id = %session_id, source_url = %source_url, "Job submitted");
                Ok(session_id)
            }
            Err(e) => {
                // No session on failure; close the channel we opened.
                cancel.cancel();
                self.registry.reset().await;
                let err = match e {
                    RunnerApiError::Rejected(msg) => SubmitError::Rejected(msg),
                    other => SubmitError::Request(other.to_string()),
                };
                tracing::warn!(error = %err, "Job submission failed");
                Err(err)
            }
        }
    }

    /// Clear the current session, returning the observer to `Idle`.
    ///
    /// Unsubscribes the channel as a side effect; events still in
    /// flight for the cleared session are discarded as unmatched.
    pub async fn clear(&self) {
        let mut active = self.active.lock().await;
        active.take();
        self.registry.reset().await;
        tracing::debug!("Session cleared");
    }

    /// Clear and wait for the processing task to exit.
    pub async fn shutdown(&self) {
        let mut active = self.active.lock().await;
        let prev = active.take();
        self.registry.reset().await;
        if let Some(prev) = prev {
            if tokio::time::timeout(SHUTDOWN_TASK_TIMEOUT, prev.task)
                .await
                .is_err()
            {
                tracing::warn!("Processing task did not exit before timeout");
            }
        }
    }
}
