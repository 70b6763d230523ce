//! The observer's session registry.
//!
//! Holds the single current-session slot for one observer. The
//! submission orchestrator and the processing loop are the only
//! writers; everyone else reads snapshots, either directly or through
//! the [`watch`] channel. Clearing a session cancels its channel
//! subscription as a side effect, so callers cannot leak one.

use tokio::sync::{watch, RwLock};
use tokio_util::sync::CancellationToken;
use vidwatch_core::session::{Session, SessionStatus};
use vidwatch_core::types::SessionId;

/// Single current-session slot, shared via `Arc` between the observer
/// facade and its processing task.
pub struct SessionRegistry {
    slot: RwLock<Slot>,
    watch_tx: watch::Sender<Session>,
}

struct Slot {
    session: Session,
    /// Cancellation handle for the channel subscription feeding this
    /// session, if one is open.
    subscription: Option<CancellationToken>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        let (watch_tx, _) = watch::channel(Session::idle());
        Self {
            slot: RwLock::new(Slot {
                session: Session::idle(),
                subscription: None,
            }),
            watch_tx,
        }
    }

    /// Subscribe to session-state snapshots. The receiver always holds
    /// the latest state; intermediate updates may be coalesced.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.watch_tx.subscribe()
    }

    /// Snapshot of the current session state.
    pub async fn current(&self) -> Session {
        self.slot.read().await.session.clone()
    }

    /// Snapshot of the session with the given id, if it is the one
    /// being tracked.
    pub async fn get(&self, session_id: &str) -> Option<Session> {
        let slot = self.slot.read().await;
        slot.session
            .is_tracking(session_id)
            .then(|| slot.session.clone())
    }

    /// Start tracking a fresh submission.
    ///
    /// Cancels any prior subscription, resets the slot to `Submitting`,
    /// and records the new subscription's cancellation handle.
    pub(crate) async fn begin(&self, subscription: CancellationToken) {
        let mut slot = self.slot.write().await;
        if let Some(prev) = slot.subscription.take() {
            prev.cancel();
        }
        slot.session = Session::submitting();
        slot.subscription = Some(subscription);
        self.publish(&slot);
    }

    /// Record the runner-assigned id for the current submission.
    pub(crate) async fn bind(&self, session_id: SessionId) {
        let mut slot = self.slot.write().await;
        slot.session.session_id = Some(session_id);
        self.publish(&slot);
    }

    /// Apply a mutation to the current session if the scope matches.
    ///
    /// `session_id: Some(id)` requires the tracked session to carry
    /// that id; `None` means channel-scoped (any tracked session).
    /// Returns `false` without applying anything for unmatched scopes,
    /// which is how events for cleared or foreign sessions are
    /// discarded.
    pub(crate) async fn update_scoped<F>(&self, session_id: Option<&str>, mutate: F) -> bool
    where
        F: FnOnce(&mut Session),
    {
        let mut slot = self.slot.write().await;
        let matches = match session_id {
            Some(id) => slot.session.is_tracking(id),
            None => slot.session.status != SessionStatus::Idle,
        };
        if !matches {
            return false;
        }
        mutate(&mut slot.session);
        self.publish(&slot);
        true
    }

    /// Clear the session with the given id, returning it to `Idle` and
    /// cancelling its channel subscription. No-op for other ids.
    pub async fn clear(&self, session_id: &str) -> bool {
        let mut slot = self.slot.write().await;
        if !slot.session.is_tracking(session_id) {
            return false;
        }
        Self::reset_slot(&mut slot);
        self.publish(&slot);
        true
    }

    /// Unconditionally clear the slot (explicit observer clear, or a
    /// new submission invalidating the old one).
    pub(crate) async fn reset(&self) {
        let mut slot = self.slot.write().await;
        Self::reset_slot(&mut slot);
        self.publish(&slot);
    }

    fn reset_slot(slot: &mut Slot) {
        if let Some(subscription) = slot.subscription.take() {
            subscription.cancel();
        }
        slot.session = Session::idle();
    }

    fn publish(&self, slot: &Slot) {
        self.watch_tx.send_replace(slot.session.clone());
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
