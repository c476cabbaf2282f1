//! Feature-level API calls.
//!
//! Thin typed wrappers over [`SessionClient::send`](crate::SessionClient::send);
//! they inherit the anti-forgery header, the refresh protocol and forced
//! logout from it.

pub mod admin;
pub mod battery;
pub mod devices;
