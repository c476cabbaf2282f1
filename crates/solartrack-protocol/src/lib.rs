//! Wire protocol for the SolarTrack client.
//!
//! This crate defines what the client says to the server and what it
//! expects back:
//!
//! - **Endpoints** ([`endpoints`]): the URL surface, plus which paths are
//!   exempt from anti-forgery headers and from the refresh protocol.
//! - **Types** ([`RequestSpec`], [`SessionPayload`], [`UserProfile`]):
//!   replayable request descriptors and the auth payloads.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how bodies are converted
//!   to/from bytes.
//!
//! # Architecture
//!
//! ```text
//! Transport (HttpRequest/HttpResponse) → Protocol (RequestSpec, payloads) → Session (state)
//! ```

mod codec;
pub mod endpoints;
mod error;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use types::{
    RequestSpec, SessionPayload, UserProfile, error_message, normalize_devices,
};

// Re-exported so callers building a `RequestSpec` don't need a direct
// dependency on the transport crate.
pub use solartrack_transport::Method;
