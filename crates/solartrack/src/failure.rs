//! The one code path that ends a session.
//!
//! Refresh failures and rejected replays both land here, so a forced
//! logout always goes through the same steps in the same order:
//!
//! 1. reject every request still queued behind a refresh
//! 2. reset the session to anonymous
//! 3. tell the server to drop the session (best effort)
//! 4. hard-redirect to the login surface, unless already there

use solartrack_protocol::{RequestSpec, endpoints};
use solartrack_session::{SessionError, SessionStore, session_cleared};
use solartrack_transport::{CredentialStore, Transport};

use crate::Navigator;
use crate::coordinator::RefreshCoordinator;
use crate::middleware::Dispatcher;

/// Tears down the session after an unrecoverable auth failure.
pub struct AuthFailureHandler<N> {
    navigator: N,
    login_route: String,
}

impl<N: Navigator> AuthFailureHandler<N> {
    pub fn new(navigator: N, login_route: impl Into<String>) -> Self {
        Self {
            navigator,
            login_route: login_route.into(),
        }
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    pub fn login_route(&self) -> &str {
        &self.login_route
    }

    /// Runs the teardown for `error`.
    ///
    /// The logout call goes out on the raw path: with credentials already
    /// invalid it is expected to fail, and its 401 must not start another
    /// refresh. Its failure is logged and dropped.
    pub async fn handle<T, C>(
        &self,
        error: &SessionError,
        coordinator: &RefreshCoordinator,
        store: &SessionStore,
        dispatcher: &Dispatcher<T, C>,
    ) where
        T: Transport,
        C: CredentialStore,
    {
        tracing::warn!(error = %error, "session unrecoverable; logging out");

        coordinator.fail_pending(error);
        store.dispatch(session_cleared());

        match dispatcher.dispatch(&RequestSpec::post(endpoints::LOGOUT)).await {
            Ok(response) if response.is_success() => {
                tracing::debug!("server session invalidated");
            }
            Ok(response) => tracing::warn!(
                status = response.status,
                "logout after failed refresh rejected (expected)"
            ),
            Err(e) => tracing::warn!(
                error = %e,
                "logout after failed refresh failed (expected)"
            ),
        }

        let current = self.navigator.current_route();
        if current != self.login_route {
            tracing::warn!(from = %current, to = %self.login_route, "forcing redirect to login");
            self.navigator.hard_redirect(&self.login_route);
        }
    }
}
