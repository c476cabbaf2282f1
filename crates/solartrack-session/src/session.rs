//! The session record: what the rest of the app knows about the user.
//!
//! A session tracks:
//! - WHETHER the user is authenticated (and WHO they are)
//! - WHETHER that answer is known yet (`loading`)
//! - the last login/registration error to show inline
//! - the battery, solar-system and device snapshots that arrived with the
//!   identity

use serde_json::Value;
use solartrack_protocol::UserProfile;

/// Process-wide authenticated-session state.
///
/// While `loading` is `true`, `is_authenticated` means nothing: the
/// startup probe hasn't answered yet. Consumers go through [`Session::view`]
/// instead of reading the flags directly so they can't render either the
/// authenticated or the anonymous UI too early.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub is_authenticated: bool,
    pub user: Option<UserProfile>,
    pub loading: bool,
    pub error: Option<String>,
    pub battery: Option<Value>,
    pub solar_system: Option<Value>,
    pub iot_devices: Vec<Value>,
}

/// What a consumer is allowed to render for a given [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionView {
    /// Auth state unknown; show the blocking loading view.
    Loading,
    Authenticated,
    Anonymous,
}

impl Session {
    /// The state at process start: nothing known yet.
    pub fn starting() -> Self {
        Self {
            loading: true,
            ..Self::anonymous()
        }
    }

    /// A settled, logged-out session.
    pub fn anonymous() -> Self {
        Self {
            is_authenticated: false,
            user: None,
            loading: false,
            error: None,
            battery: None,
            solar_system: None,
            iot_devices: Vec::new(),
        }
    }

    /// `true` once the auth state is known.
    pub fn is_settled(&self) -> bool {
        !self.loading
    }

    pub fn view(&self) -> SessionView {
        if self.loading {
            SessionView::Loading
        } else if self.is_authenticated {
            SessionView::Authenticated
        } else {
            SessionView::Anonymous
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::starting()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starting_is_loading_and_anonymous() {
        let s = Session::starting();
        assert!(s.loading);
        assert!(!s.is_authenticated);
        assert!(!s.is_settled());
        assert_eq!(Session::default(), s);
    }

    #[test]
    fn test_view_loading_hides_auth_flag() {
        // Even a session that claims to be authenticated renders as
        // loading until the flag clears.
        let s = Session {
            is_authenticated: true,
            ..Session::starting()
        };
        assert_eq!(s.view(), SessionView::Loading);
    }

    #[test]
    fn test_view_settled_sessions() {
        assert_eq!(Session::anonymous().view(), SessionView::Anonymous);

        let s = Session {
            is_authenticated: true,
            ..Session::anonymous()
        };
        assert_eq!(s.view(), SessionView::Authenticated);
    }
}
