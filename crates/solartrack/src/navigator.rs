//! The hook through which the client drives top-level navigation.
//!
//! The client never renders anything itself. When a session can't be
//! recovered it needs to throw away whatever the embedding application
//! is showing and land on the login surface; the [`Navigator`] trait is
//! how the embedder lets it do that.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Route inspection and forced navigation, implemented by the embedder.
///
/// `Send + Sync + 'static` because one navigator is shared by every
/// request the client issues.
pub trait Navigator: Send + Sync + 'static {
    /// The route currently shown, e.g. `"/dashboard"`.
    fn current_route(&self) -> String;

    /// Leaves the current view with a full navigation to `route`.
    ///
    /// Unlike an in-app route change, this must discard all in-memory
    /// view state.
    fn hard_redirect(&self, route: &str);
}

impl<N: Navigator> Navigator for Arc<N> {
    fn current_route(&self) -> String {
        (**self).current_route()
    }

    fn hard_redirect(&self, route: &str) {
        (**self).hard_redirect(route);
    }
}

/// A [`Navigator`] that keeps the route in memory.
///
/// Used by headless embedders (and tests): it records the route and how
/// many hard redirects were forced.
#[derive(Debug)]
pub struct MemoryNavigator {
    route: Mutex<String>,
    hard_redirects: AtomicUsize,
}

impl MemoryNavigator {
    pub fn new(route: impl Into<String>) -> Self {
        Self {
            route: Mutex::new(route.into()),
            hard_redirects: AtomicUsize::new(0),
        }
    }

    /// An in-app route change; not counted as a redirect.
    pub fn navigate(&self, route: impl Into<String>) {
        *self.route.lock().unwrap_or_else(PoisonError::into_inner) = route.into();
    }

    /// How many times [`Navigator::hard_redirect`] was called.
    pub fn hard_redirects(&self) -> usize {
        self.hard_redirects.load(Ordering::SeqCst)
    }
}

impl Default for MemoryNavigator {
    fn default() -> Self {
        Self::new("/")
    }
}

impl Navigator for MemoryNavigator {
    fn current_route(&self) -> String {
        self.route
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn hard_redirect(&self, route: &str) {
        self.hard_redirects.fetch_add(1, Ordering::SeqCst);
        self.navigate(route);
    }
}
