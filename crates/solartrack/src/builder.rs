//! `SessionClientBuilder`: assembles a [`SessionClient`].

#[cfg(feature = "reqwest")]
use std::sync::Arc;

#[cfg(feature = "reqwest")]
use solartrack_protocol::endpoints;
use solartrack_transport::{CredentialStore, Transport};
#[cfg(feature = "reqwest")]
use solartrack_transport::{
    CookieCredentialStore, ReqwestTransport, TransportTimeouts,
};

use crate::{ClientConfig, Navigator, SessionClient};
#[cfg(feature = "reqwest")]
use crate::SolartrackError;

/// Builder for configuring a [`SessionClient`].
///
/// # Example
///
/// ```rust,no_run
/// use solartrack::prelude::*;
///
/// # fn main() -> Result<(), SolartrackError> {
/// let client = SessionClientBuilder::new()
///     .base_url("https://energy.example.com")
///     .build_reqwest(MemoryNavigator::new("/"))?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct SessionClientBuilder {
    config: ClientConfig,
}

impl SessionClientBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the origin every API path is resolved against.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    /// Sets the route forced logouts redirect to.
    pub fn login_route(mut self, route: impl Into<String>) -> Self {
        self.config.login_route = route.into();
        self
    }

    /// Builds a client over the given transport and credential store.
    pub fn build<T, C, N>(
        self,
        transport: T,
        credentials: C,
        navigator: N,
    ) -> SessionClient<T, C, N>
    where
        T: Transport,
        C: CredentialStore,
        N: Navigator,
    {
        SessionClient::new(transport, credentials, navigator, self.config)
    }

    /// Builds a client that talks HTTPS through `reqwest`.
    ///
    /// The transport and the credential store share one cookie jar, so
    /// the anti-forgery token the server sets is read back from the same
    /// place the transport stores it.
    ///
    /// # Errors
    /// [`SolartrackError::Config`] for an unparsable base URL, or
    /// [`SolartrackError::Transport`] if the HTTP client can't be built.
    #[cfg(feature = "reqwest")]
    pub fn build_reqwest<N: Navigator>(
        self,
        navigator: N,
    ) -> Result<
        SessionClient<ReqwestTransport, CookieCredentialStore, N>,
        SolartrackError,
    > {
        let origin = self.config.origin()?;
        let jar = Arc::new(reqwest::cookie::Jar::default());
        let timeouts = TransportTimeouts {
            request: self.config.request_timeout,
            connect: self.config.connect_timeout,
        };

        let transport =
            ReqwestTransport::new(origin.clone(), Arc::clone(&jar), timeouts)?;
        let credentials =
            CookieCredentialStore::new(jar, origin, endpoints::CSRF_COOKIE);

        tracing::debug!(base_url = %self.config.base_url, "building HTTP session client");
        Ok(self.build(transport, credentials, navigator))
    }
}
