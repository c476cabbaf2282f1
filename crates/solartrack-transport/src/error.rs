/// Errors that can occur in the transport layer.
///
/// A response with an error status (401, 500, ...) is NOT a transport
/// error: the exchange succeeded, the server just said no. These variants
/// cover the cases where no response could be obtained at all.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The underlying HTTP client could not be constructed.
    #[error("client build failed: {0}")]
    Build(String),

    /// The request path could not be joined onto the base URL.
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// A header name or value was rejected by the HTTP client.
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// Sending the request failed (connection refused, timeout, TLS...).
    #[error("request failed: {0}")]
    Request(String),

    /// The response body could not be read.
    #[error("body read failed: {0}")]
    Body(String),
}
