//! Login, registration and logout flows.
//!
//! These are the only user-initiated writes to the session. Login and
//! registration go to endpoints outside the refresh protocol, so a
//! rejected password comes straight back here and is shown inline.

use serde::Serialize;
use solartrack_protocol::{RequestSpec, SessionPayload, endpoints};
use solartrack_session::{SessionEvent, session_cleared, session_established};
use solartrack_transport::{CredentialStore, Transport};

use crate::{Navigator, SessionClient, SolartrackError};

/// The body of a login request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginCredentials {
    pub username: String,
    pub password: String,
}

impl LoginCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Drives the auth flows through a [`SessionClient`].
pub struct AuthService<T, C, N> {
    client: SessionClient<T, C, N>,
}

impl<T, C, N> AuthService<T, C, N>
where
    T: Transport,
    C: CredentialStore,
    N: Navigator,
{
    pub fn new(client: SessionClient<T, C, N>) -> Self {
        Self { client }
    }

    /// Logs in and loads the session.
    ///
    /// On success the server has set fresh cookies, `/api/auth/me` has
    /// been fetched and the session is established. On failure the
    /// session is anonymous and carries the server's message.
    ///
    /// # Errors
    /// Whatever the login call or the identity fetch returned.
    pub async fn login(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<SessionPayload, SolartrackError> {
        tracing::info!(username = %credentials.username, "logging in");
        self.authenticate(endpoints::LOGIN, credentials).await
    }

    /// Registers a new account (user, system, battery, devices in one
    /// form) and loads the session the server opens for it.
    ///
    /// # Errors
    /// Whatever the registration call or the identity fetch returned.
    pub async fn register<R: Serialize>(
        &self,
        registration: &R,
    ) -> Result<SessionPayload, SolartrackError> {
        tracing::info!("registering");
        self.authenticate(endpoints::REGISTER, registration).await
    }

    /// Logs out. The local session is cleared even if the server can't
    /// be reached.
    pub async fn logout(&self) {
        if let Err(e) = self.client.send(RequestSpec::post(endpoints::LOGOUT)).await {
            tracing::warn!(error = %e, "logout call failed; clearing session anyway");
        }
        self.client.store().dispatch(session_cleared());
    }

    async fn authenticate<B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<SessionPayload, SolartrackError> {
        let store = self.client.store();
        store.dispatch(SessionEvent::ErrorCleared);

        match self.open_session(path, body).await {
            Ok(payload) => {
                store.dispatch(session_established(payload.clone()));
                Ok(payload)
            }
            Err(e) => {
                let message = e.user_message();
                tracing::info!(%path, error = %message, "authentication rejected");
                store.dispatch(SessionEvent::LoginFailed(message));
                Err(e)
            }
        }
    }

    async fn open_session<B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<SessionPayload, SolartrackError> {
        let spec = RequestSpec::post(path).json(self.client.codec(), body)?;
        self.client.send(spec).await?;
        self.client.send_json(RequestSpec::get(endpoints::ME)).await
    }
}
