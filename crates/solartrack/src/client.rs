//! `SessionClient`: the authenticated HTTP client every API call goes
//! through.
//!
//! It ties the layers together: the middleware chain prepares and
//! classifies each exchange, the coordinator runs the refresh, the
//! failure handler ends the session, and the session store records the
//! result.
//!
//! # Life of a request
//!
//! ```text
//!   send(spec)
//!     │
//!     ├─ dispatch: CSRF header → transport
//!     ├─ classify the response
//!     │    Deliver  → Ok(response)
//!     │    Fail     → Err(Status)
//!     │    Refresh  → await_refresh (lead it or queue) → replay once
//!     │    Expired  → AuthFailureHandler → Err(Expired)
//! ```

use std::fmt::Display;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::de::DeserializeOwned;
use solartrack_protocol::{
    Codec, JsonCodec, RequestSpec, SessionPayload, endpoints,
};
use solartrack_session::{
    SessionError, SessionStore, auth_check_finished, auth_check_started,
    session_established,
};
use solartrack_transport::{CredentialStore, HttpResponse, Transport};

use crate::coordinator::RefreshCoordinator;
use crate::failure::AuthFailureHandler;
use crate::middleware::{Dispatcher, Disposition, classify};
use crate::{ClientConfig, Navigator, SolartrackError};

/// How the startup auth probe ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The server confirmed the session (possibly after a refresh).
    Authenticated,
    /// No usable session.
    Anonymous,
    /// The probe had already run on this client; nothing was sent.
    AlreadyRan,
}

/// Shared client state behind the `Arc`.
struct ClientInner<T, C, N> {
    dispatcher: Dispatcher<T, C>,
    codec: JsonCodec,
    store: SessionStore,
    coordinator: RefreshCoordinator,
    failure: AuthFailureHandler<N>,
    config: ClientConfig,
    probed: AtomicBool,
}

/// An HTTP client that keeps the user's session alive.
///
/// Cloning is cheap and every clone shares the same session store and
/// refresh coordinator, so one refresh serves all of them.
pub struct SessionClient<T, C, N> {
    inner: Arc<ClientInner<T, C, N>>,
}

impl<T, C, N> Clone for SessionClient<T, C, N> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, C, N> SessionClient<T, C, N>
where
    T: Transport,
    C: CredentialStore,
    N: Navigator,
{
    pub(crate) fn new(
        transport: T,
        credentials: C,
        navigator: N,
        config: ClientConfig,
    ) -> Self {
        let failure =
            AuthFailureHandler::new(navigator, config.login_route.clone());
        Self {
            inner: Arc::new(ClientInner {
                dispatcher: Dispatcher::new(transport, credentials),
                codec: JsonCodec,
                store: SessionStore::new(),
                coordinator: RefreshCoordinator::new(),
                failure,
                config,
                probed: AtomicBool::new(false),
            }),
        }
    }

    /// Sends `spec`, refreshing the session and replaying once if the
    /// server says the access token has expired.
    ///
    /// # Errors
    /// - [`SolartrackError::Transport`] if no response was obtained
    /// - [`SolartrackError::Status`] for an error status the caller
    ///   handles (including any failure on login, register, refresh)
    /// - [`SolartrackError::Session`] when the session couldn't be
    ///   recovered; by then the user has been logged out. A replay the
    ///   server still rejects comes back as [`SessionError::Expired`]
    ///   holding that 401's status and body.
    pub async fn send(
        &self,
        spec: RequestSpec,
    ) -> Result<HttpResponse, SolartrackError> {
        let mut spec = spec;
        loop {
            let response = self.inner.dispatcher.dispatch(&spec).await?;

            match classify(&spec, &response) {
                Disposition::Deliver => return Ok(response),
                Disposition::Fail => {
                    tracing::debug!(
                        path = %spec.path,
                        status = response.status,
                        "passing failure to caller"
                    );
                    return Err(SolartrackError::status(&spec.path, response));
                }
                Disposition::Refresh => {
                    tracing::debug!(path = %spec.path, "access expired; awaiting refresh");
                    self.inner
                        .coordinator
                        .await_refresh(|| self.refresh_session())
                        .await?;
                    tracing::debug!(path = %spec.path, "replaying after refresh");
                    spec = spec.into_replay();
                }
                Disposition::Expired => {
                    let error = SessionError::Expired {
                        path: spec.path.clone(),
                        status: response.status,
                        body: response.text(),
                    };
                    self.end_session(&error).await;
                    return Err(error.into());
                }
            }
        }
    }

    /// [`send`](Self::send), then decodes the success body as JSON.
    ///
    /// # Errors
    /// Everything `send` returns, plus [`SolartrackError::Protocol`] if
    /// the body doesn't decode as `R`.
    pub async fn send_json<R: DeserializeOwned>(
        &self,
        spec: RequestSpec,
    ) -> Result<R, SolartrackError> {
        let response = self.send(spec).await?;
        Ok(self.inner.codec.decode(&response.body)?)
    }

    /// Sends `spec` with the anti-forgery header but without looking at
    /// the response: no refresh, no replay, no logout on 401.
    ///
    /// # Errors
    /// Only [`SolartrackError::Transport`]; error statuses come back as
    /// ordinary responses.
    pub async fn dispatch(
        &self,
        spec: &RequestSpec,
    ) -> Result<HttpResponse, SolartrackError> {
        Ok(self.inner.dispatcher.dispatch(spec).await?)
    }

    /// Runs the startup auth probe, at most once per client.
    ///
    /// The session starts out loading. The probe asks the server who the
    /// user is; a 401 goes through the normal refresh protocol, which
    /// ends the session itself if it can't be recovered. Whatever
    /// happens, the session stops loading when the probe returns.
    pub async fn check_auth(&self) -> ProbeOutcome {
        if self.inner.probed.swap(true, Ordering::SeqCst) {
            tracing::debug!("auth probe already ran");
            return ProbeOutcome::AlreadyRan;
        }

        let store = &self.inner.store;
        store.dispatch(auth_check_started());
        let mut probe = ProbeGuard {
            store,
            probed: &self.inner.probed,
            completed: false,
        };

        let outcome = match self
            .send_json::<SessionPayload>(RequestSpec::get(endpoints::ME))
            .await
        {
            Ok(payload) => {
                store.dispatch(session_established(payload));
                ProbeOutcome::Authenticated
            }
            Err(e) => {
                tracing::info!(error = %e, "no active session");
                ProbeOutcome::Anonymous
            }
        };

        probe.completed = true;
        outcome
    }

    /// The leader's side of a refresh. On failure the session is torn
    /// down before the outcome is shared with the waiters, unless another
    /// request already tore it down while the refresh ran.
    async fn refresh_session(&self) -> Result<(), SessionError> {
        let coordinator = &self.inner.coordinator;
        let generation = coordinator.generation();
        let outcome = self.exchange_refresh_token(generation).await;
        if let Err(error) = &outcome {
            if coordinator.generation() == generation {
                self.end_session(error).await;
            } else {
                tracing::debug!(error = %error, "session already ended; skipping teardown");
            }
        }
        outcome
    }

    async fn exchange_refresh_token(
        &self,
        generation: u64,
    ) -> Result<(), SessionError> {
        tracing::info!("refreshing session");

        // Raw calls: the re-probe must not queue behind the refresh that
        // issued it.
        let refreshed = self
            .inner
            .dispatcher
            .dispatch(&RequestSpec::post(endpoints::REFRESH))
            .await
            .map_err(refresh_failed)?;
        if !refreshed.is_success() {
            return Err(refresh_failed(format!(
                "refresh returned status {}",
                refreshed.status
            )));
        }

        let payload = self.fetch_identity().await.map_err(refresh_failed)?;
        let store = &self.inner.store;
        let current = self
            .inner
            .coordinator
            .commit_if_current(generation, || {
                store.dispatch(session_established(payload));
            });
        if !current {
            tracing::warn!("session ended during refresh; discarding identity");
            return Err(SessionError::RefreshAborted);
        }
        tracing::info!("session refreshed");
        Ok(())
    }

    async fn fetch_identity(&self) -> Result<SessionPayload, SolartrackError> {
        let spec = RequestSpec::get(endpoints::ME);
        let response = self.inner.dispatcher.dispatch(&spec).await?;
        if !response.is_success() {
            return Err(SolartrackError::status(&spec.path, response));
        }
        Ok(self.inner.codec.decode(&response.body)?)
    }

    async fn end_session(&self, error: &SessionError) {
        let inner = &self.inner;
        inner
            .failure
            .handle(error, &inner.coordinator, &inner.store, &inner.dispatcher)
            .await;
    }

    /// The session state this client writes to.
    pub fn store(&self) -> &SessionStore {
        &self.inner.store
    }

    pub fn coordinator(&self) -> &RefreshCoordinator {
        &self.inner.coordinator
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn codec(&self) -> &JsonCodec {
        &self.inner.codec
    }

    pub fn navigator(&self) -> &N {
        self.inner.failure.navigator()
    }

    pub fn transport(&self) -> &T {
        self.inner.dispatcher.transport()
    }

    pub fn credentials(&self) -> &C {
        self.inner.dispatcher.credentials()
    }
}

/// Settles the startup probe even if `check_auth` is dropped mid-flight.
///
/// A probe that never completed is re-armed so a later call can run it.
struct ProbeGuard<'a> {
    store: &'a SessionStore,
    probed: &'a AtomicBool,
    completed: bool,
}

impl Drop for ProbeGuard<'_> {
    fn drop(&mut self) {
        if !self.completed {
            tracing::warn!("auth probe dropped before settling");
            self.probed.store(false, Ordering::SeqCst);
        }
        self.store.dispatch(auth_check_finished());
    }
}

fn refresh_failed(reason: impl Display) -> SessionError {
    SessionError::RefreshFailed {
        reason: reason.to_string(),
    }
}
