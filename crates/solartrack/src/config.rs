//! Client configuration.

use std::time::Duration;

use url::Url;

use crate::ConfigError;

/// Origin used when `SOLARTRACK_BASE_URL` isn't set.
pub const DEFAULT_BASE_URL: &str = "https://solartrack.local";
/// Route of the login surface that unrecoverable auth failures land on.
pub const DEFAULT_LOGIN_ROUTE: &str = "/login";

/// Settings for a [`SessionClient`](crate::SessionClient).
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// The single origin every API path is resolved against.
    pub base_url: String,
    /// Where the user is sent after a forced logout.
    pub login_route: String,
    /// Whole-request deadline. The refresh call gets no other timeout.
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            login_route: DEFAULT_LOGIN_ROUTE.to_string(),
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl ClientConfig {
    /// Builds a config for `base_url` with every other setting defaulted.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidBaseUrl`] if `base_url` doesn't parse.
    pub fn for_base_url(base_url: &str) -> Result<Self, ConfigError> {
        parse_base_url(base_url)?;
        Ok(Self {
            base_url: base_url.to_string(),
            ..Self::default()
        })
    }

    /// The parsed origin.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidBaseUrl`] if `base_url` doesn't parse.
    pub fn origin(&self) -> Result<Url, ConfigError> {
        parse_base_url(&self.base_url)
    }

    /// Reads the config from `SOLARTRACK_*` environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `SOLARTRACK_BASE_URL` | `https://solartrack.local` |
    /// | `SOLARTRACK_LOGIN_ROUTE` | `/login` |
    /// | `SOLARTRACK_REQUEST_TIMEOUT_SECS` | `30` |
    /// | `SOLARTRACK_CONNECT_TIMEOUT_SECS` | `10` |
    ///
    /// Unset or unparsable timeouts fall back to their defaults.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidBaseUrl`] if `SOLARTRACK_BASE_URL` is
    /// set but isn't a URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let base_url = match lookup("SOLARTRACK_BASE_URL") {
            Some(value) => {
                parse_base_url(&value)?;
                value
            }
            None => defaults.base_url,
        };
        let login_route = lookup("SOLARTRACK_LOGIN_ROUTE")
            .filter(|route| !route.is_empty())
            .unwrap_or(defaults.login_route);
        let request_timeout = secs(&lookup, "SOLARTRACK_REQUEST_TIMEOUT_SECS")
            .unwrap_or(defaults.request_timeout);
        let connect_timeout = secs(&lookup, "SOLARTRACK_CONNECT_TIMEOUT_SECS")
            .unwrap_or(defaults.connect_timeout);

        Ok(Self {
            base_url,
            login_route,
            request_timeout,
            connect_timeout,
        })
    }
}

fn secs(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<Duration> {
    let raw = lookup(key)?;
    match raw.trim().parse::<u64>() {
        Ok(secs) => Some(Duration::from_secs(secs)),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparsable timeout");
            None
        }
    }
}

fn parse_base_url(value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|source| ConfigError::InvalidBaseUrl {
        value: value.to_string(),
        source,
    })
}
