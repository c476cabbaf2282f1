//! Session events and the pure transition function.
//!
//! Every change to the session is described by a [`SessionEvent`] and
//! applied by [`reduce`]. `reduce` never touches its input; it returns the
//! next state, and [`SessionStore`](crate::SessionStore) swaps it in.
//!
//! ```text
//!   starting ──(AuthCheckStarted)──→ loading
//!   loading ──(Established)──→ authenticated, still loading
//!   loading ──(AuthCheckFinished)──→ settled
//!   any ──(Cleared)──→ anonymous, settled
//!   any ──(LoginFailed)──→ anonymous with error, settled
//! ```

use solartrack_protocol::SessionPayload;

use crate::Session;

/// A transition of the session state.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The startup probe began: auth state is unknown again.
    AuthCheckStarted,
    /// The startup probe settled, whatever its outcome.
    AuthCheckFinished,
    /// Identity (and resource snapshots) confirmed by the server.
    Established(SessionPayload),
    /// Logout, or an unrecoverable auth failure.
    Cleared,
    /// Login or registration was rejected; carries the message to show.
    LoginFailed(String),
    /// The user started a new login attempt.
    ErrorCleared,
}

impl SessionEvent {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::AuthCheckStarted => "auth_check_started",
            Self::AuthCheckFinished => "auth_check_finished",
            Self::Established(_) => "session_established",
            Self::Cleared => "session_cleared",
            Self::LoginFailed(_) => "login_failed",
            Self::ErrorCleared => "error_cleared",
        }
    }
}

pub fn session_established(payload: SessionPayload) -> SessionEvent {
    SessionEvent::Established(payload)
}

pub fn session_cleared() -> SessionEvent {
    SessionEvent::Cleared
}

pub fn auth_check_started() -> SessionEvent {
    SessionEvent::AuthCheckStarted
}

pub fn auth_check_finished() -> SessionEvent {
    SessionEvent::AuthCheckFinished
}

/// Computes the state that follows `state` after `event`.
pub fn reduce(state: &Session, event: SessionEvent) -> Session {
    match event {
        SessionEvent::AuthCheckStarted => Session {
            loading: true,
            error: None,
            ..state.clone()
        },
        SessionEvent::AuthCheckFinished => Session {
            loading: false,
            ..state.clone()
        },
        // `loading` is left alone: during startup the probe's own
        // AuthCheckFinished is what settles the session.
        SessionEvent::Established(payload) => Session {
            is_authenticated: true,
            user: payload.user,
            loading: state.loading,
            error: None,
            battery: payload.battery,
            solar_system: payload.solar_system,
            iot_devices: payload.iot_devices,
        },
        SessionEvent::Cleared => Session::anonymous(),
        SessionEvent::LoginFailed(message) => Session {
            error: Some(message),
            ..Session::anonymous()
        },
        SessionEvent::ErrorCleared => Session {
            error: None,
            ..state.clone()
        },
    }
}
