//! Error types for the protocol layer.

/// Errors that can occur while encoding request bodies or decoding
/// response bodies.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust value into a request body).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning a response body into a Rust value).
    ///
    /// Common causes: the server answered with an HTML error page, a
    /// required field is missing, or a field has the wrong type.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The body decoded, but not into the shape the caller expected
    /// (e.g. a success response without its `battery` field).
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
