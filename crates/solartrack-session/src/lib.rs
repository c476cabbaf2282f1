//! Authenticated-session state for the SolarTrack client.
//!
//! This crate owns the answer to "who is logged in?":
//!
//! 1. **State**: the [`Session`] record and the [`SessionView`] consumers
//!    render from
//! 2. **Transitions**: [`SessionEvent`]s applied by the pure [`reduce`]
//! 3. **Storage**: the [`SessionStore`] cell that holds the latest state
//!    and hands out read-only observers
//!
//! # How it fits in the stack
//!
//! ```text
//! Client layer (above)  ← probes identity, refreshes tokens, clears on failure
//!     ↕
//! Session layer (this crate)  ← holds the authenticated-session state
//!     ↕
//! Protocol layer (below)  ← provides UserProfile, SessionPayload
//! ```

mod error;
mod event;
mod session;
mod store;

pub use error::SessionError;
pub use event::{
    SessionEvent, auth_check_finished, auth_check_started, reduce,
    session_cleared, session_established,
};
pub use session::{Session, SessionView};
pub use store::SessionStore;
