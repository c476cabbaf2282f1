//! Error types for the session layer.

/// Auth-terminal failures.
///
/// `Clone` because one refresh outcome is handed to every request that
/// was waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The refresh call (or the identity re-probe that follows it) failed.
    /// The session can't be recovered; the user must log in again.
    #[error("failed to refresh token: {reason}")]
    RefreshFailed { reason: String },

    /// A request was replayed after a successful refresh and the server
    /// still answered 401. `status` and `body` are the server's answer to
    /// the replay, as received.
    #[error("session expired: {path} rejected after refresh")]
    Expired {
        path: String,
        status: u16,
        body: String,
    },

    /// The refresh this request was queued behind was dropped before it
    /// settled, or the session was torn down while it ran and its result
    /// was discarded. Nothing was established.
    #[error("token refresh abandoned before it settled")]
    RefreshAborted,
}

impl SessionError {
    /// `true` for failures that end the session (and trigger logout).
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::RefreshFailed { .. } | Self::Expired { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_session_expired_classification() {
        assert!(
            SessionError::RefreshFailed { reason: "401".into() }
                .is_session_expired()
        );
        assert!(
            SessionError::Expired {
                path: "/api/auth/me".into(),
                status: 401,
                body: String::new(),
            }
            .is_session_expired()
        );
        assert!(!SessionError::RefreshAborted.is_session_expired());
    }

    #[test]
    fn test_refresh_failed_display_mentions_refresh() {
        let err = SessionError::RefreshFailed { reason: "status 401".into() };
        assert_eq!(err.to_string(), "failed to refresh token: status 401");
    }
}
