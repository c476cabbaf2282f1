//! Unified error type for the SolarTrack client.

use solartrack_protocol::{ProtocolError, error_message};
use solartrack_session::SessionError;
use solartrack_transport::{HttpResponse, TransportError};

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `solartrack` crate, you deal with this single error
/// type instead of importing errors from each sub-crate. The `#[from]`
/// attribute on each variant auto-generates `From` impls, so the `?`
/// operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum SolartrackError {
    /// No response was obtained (connection refused, timeout, TLS).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A body couldn't be encoded or a response couldn't be decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The session could not be kept alive (refresh failed, replay
    /// rejected) or a refresh was abandoned.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The server answered with a failure status that the client passes
    /// through unchanged.
    #[error("{path} returned status {status}")]
    Status {
        status: u16,
        path: String,
        body: String,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl SolartrackError {
    pub(crate) fn status(path: &str, response: HttpResponse) -> Self {
        Self::Status {
            status: response.status,
            path: path.to_owned(),
            body: response.text(),
        }
    }

    /// The HTTP status, if the server answered at all.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. }
            | Self::Session(SessionError::Expired { status, .. }) => Some(*status),
            _ => None,
        }
    }

    /// Text suitable for showing next to a login or registration form.
    ///
    /// Prefers the message the server put in the error body and falls
    /// back to this error's own description.
    pub fn user_message(&self) -> String {
        match self {
            Self::Status { body, .. }
            | Self::Session(SessionError::Expired { body, .. }) => {
                error_message(body.as_bytes()).unwrap_or_else(|| self.to_string())
            }
            _ => self.to_string(),
        }
    }

    /// `true` if the user has been logged out because of this error.
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::Session(e) if e.is_session_expired())
    }
}

/// Invalid client configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid base URL {value:?}: {source}")]
    InvalidBaseUrl {
        value: String,
        source: url::ParseError,
    },
}
