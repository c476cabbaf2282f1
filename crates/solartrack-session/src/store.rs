//! The session store: the single owned cell holding the latest session.
//!
//! # Ownership
//!
//! Only three components write here: the startup auth probe, the refresh
//! coordinator's success path, and the auth-failure handler. Everyone
//! else reads, either with [`SessionStore::snapshot`] or by subscribing to
//! changes with [`SessionStore::subscribe`].
//!
//! The cell is a `tokio::sync::watch` channel. A watch channel holds one
//! value; receivers always see the most recent one and are woken when it
//! changes. Receivers can't write back, so handing one out gives read-only
//! access.

use tokio::sync::watch;

use crate::{Session, SessionEvent, event::reduce};

/// Holds the current [`Session`] and applies [`SessionEvent`]s to it.
pub struct SessionStore {
    cell: watch::Sender<Session>,
}

impl SessionStore {
    /// Creates a store in the [`Session::starting`] state.
    pub fn new() -> Self {
        Self::with_session(Session::starting())
    }

    /// Creates a store holding `session`.
    pub fn with_session(session: Session) -> Self {
        // The initial receiver is dropped; `send_modify` doesn't need one
        // and subscribers are created on demand.
        let (cell, _) = watch::channel(session);
        Self { cell }
    }

    /// Applies `event` and notifies subscribers.
    pub fn dispatch(&self, event: SessionEvent) {
        let name = event.name();
        let mut was_authenticated = false;
        let mut now_authenticated = false;

        self.cell.send_modify(|state| {
            was_authenticated = state.is_authenticated;
            *state = reduce(state, event);
            now_authenticated = state.is_authenticated;
        });

        match (was_authenticated, now_authenticated) {
            (false, true) => tracing::info!(event = name, "session established"),
            (true, false) => tracing::info!(event = name, "session cleared"),
            _ => tracing::debug!(event = name, "session updated"),
        }
    }

    /// Returns a copy of the current session.
    pub fn snapshot(&self) -> Session {
        self.cell.borrow().clone()
    }

    /// Returns a read-only handle that observes every future change.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.cell.subscribe()
    }

    pub fn is_authenticated(&self) -> bool {
        self.cell.borrow().is_authenticated
    }

    pub fn is_loading(&self) -> bool {
        self.cell.borrow().loading
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
