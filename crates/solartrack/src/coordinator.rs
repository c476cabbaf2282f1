//! Single-flight session refresh.
//!
//! When the access cookie expires, every request in flight sees a 401 at
//! roughly the same time. Only one of them may call the refresh
//! endpoint; the rest wait for that call's outcome and then replay.
//!
//! ```text
//!                 first 401                       refresh settles
//!   ┌──────┐ ─────────────────→ ┌────────────┐ ──────────────────→ ┌──────┐
//!   │ Idle │   caller leads     │ Refreshing │   waiters drained    │ Idle │
//!   └──────┘                    └────────────┘   FIFO, same outcome └──────┘
//!                                  │    ↑
//!                                  └────┘ later 401s queue as waiters
//! ```
//!
//! The coordinator knows nothing about HTTP. The leader hands it the
//! refresh as a future; the coordinator makes sure exactly one such
//! future runs at a time and that every waiter hears how it ended.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use solartrack_session::SessionError;
use tokio::sync::oneshot;

type Outcome = Result<(), SessionError>;

/// Process-wide refresh state. `waiters` is non-empty only while
/// `in_progress` is `true`.
#[derive(Default)]
struct RefreshState {
    in_progress: bool,
    waiters: VecDeque<oneshot::Sender<Outcome>>,
    /// Bumped every time the session is torn down.
    generation: u64,
}

/// Coordinates session refreshes so at most one runs at a time.
#[derive(Default)]
pub struct RefreshCoordinator {
    state: Mutex<RefreshState>,
    refreshes: AtomicU64,
}

enum Role {
    Leader,
    Waiter(oneshot::Receiver<Outcome>),
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for a session refresh to complete.
    ///
    /// If no refresh is running, the caller becomes the leader: `refresh`
    /// is called and awaited, and its outcome is handed to every caller
    /// that queued up in the meantime. If one is already running,
    /// `refresh` is dropped unused and the caller waits for the leader's
    /// outcome.
    ///
    /// Waiters are settled in the order they queued, and the coordinator
    /// is back to idle before any of them is woken.
    ///
    /// # Errors
    /// The refresh's own error, shared with every waiter. Waiters get
    /// [`SessionError::RefreshAborted`] if the leader's future is dropped
    /// before it settles.
    pub async fn await_refresh<F, Fut>(&self, refresh: F) -> Outcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Outcome>,
    {
        let role = {
            let mut state = self.lock();
            if state.in_progress {
                let (tx, rx) = oneshot::channel();
                state.waiters.push_back(tx);
                tracing::debug!(
                    waiters = state.waiters.len(),
                    "queued behind in-flight refresh"
                );
                Role::Waiter(rx)
            } else {
                state.in_progress = true;
                Role::Leader
            }
        };

        match role {
            Role::Waiter(rx) => rx.await.unwrap_or(Err(SessionError::RefreshAborted)),
            Role::Leader => {
                self.refreshes.fetch_add(1, Ordering::SeqCst);
                let mut guard = LeaderGuard {
                    coordinator: self,
                    settled: false,
                };
                let outcome = refresh().await;
                guard.settle(&outcome);
                outcome
            }
        }
    }

    /// Rejects every queued waiter with `error` and starts a new session
    /// generation.
    ///
    /// A running refresh keeps running and stays the only one; callers
    /// that queue after this point get its eventual outcome. Its result
    /// belongs to the old generation, so [`commit_if_current`] refuses it.
    ///
    /// [`commit_if_current`]: Self::commit_if_current
    pub fn fail_pending(&self, error: &SessionError) {
        let waiters = {
            let mut state = self.lock();
            state.generation += 1;
            std::mem::take(&mut state.waiters)
        };
        if !waiters.is_empty() {
            tracing::debug!(waiters = waiters.len(), "rejecting queued requests");
        }
        for waiter in waiters {
            let _ = waiter.send(Err(error.clone()));
        }
    }

    /// The current session generation. A refresh captures it before it
    /// starts and hands it back to [`commit_if_current`](Self::commit_if_current).
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    /// Runs `commit` only if no teardown happened since `generation` was
    /// read. Returns whether it ran.
    ///
    /// The check and `commit` happen under the same lock as
    /// [`fail_pending`](Self::fail_pending), so a teardown either lands
    /// before the commit (which is then skipped) or after it.
    pub fn commit_if_current(&self, generation: u64, commit: impl FnOnce()) -> bool {
        let state = self.lock();
        if state.generation != generation {
            return false;
        }
        commit();
        true
    }

    /// `true` while a refresh is in flight.
    pub fn is_refreshing(&self) -> bool {
        self.lock().in_progress
    }

    /// Number of callers queued behind the current refresh.
    pub fn pending(&self) -> usize {
        self.lock().waiters.len()
    }

    /// Number of refreshes started since creation.
    pub fn refresh_count(&self) -> u64 {
        self.refreshes.load(Ordering::SeqCst)
    }

    fn lock(&self) -> MutexGuard<'_, RefreshState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns to idle and hands `outcome` to every waiter, oldest first.
    fn finish(&self, outcome: &Outcome) {
        let waiters = {
            let mut state = self.lock();
            state.in_progress = false;
            std::mem::take(&mut state.waiters)
        };
        for waiter in waiters {
            // A waiter whose caller went away has nothing to settle.
            let _ = waiter.send(outcome.clone());
        }
    }
}

/// Settles the refresh if the leader's future is dropped mid-flight.
///
/// Without this, a cancelled leader would leave `in_progress` set and
/// every waiter pending forever.
struct LeaderGuard<'a> {
    coordinator: &'a RefreshCoordinator,
    settled: bool,
}

impl LeaderGuard<'_> {
    fn settle(&mut self, outcome: &Outcome) {
        self.settled = true;
        self.coordinator.finish(outcome);
    }
}

impl Drop for LeaderGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            tracing::warn!("refresh dropped before settling");
            self.coordinator.finish(&Err(SessionError::RefreshAborted));
        }
    }
}
