//! Transport abstraction layer for the SolarTrack client.
//!
//! Provides the [`Transport`] trait (one HTTP exchange: request in,
//! response out) and the [`CredentialStore`] trait (read-only access to
//! the anti-forgery token the server leaves in a client-readable cookie).
//!
//! Everything above this crate talks in terms of [`HttpRequest`] and
//! [`HttpResponse`]; nothing above it knows which HTTP library is in use.
//!
//! # Feature Flags
//!
//! - `reqwest` (default): [`ReqwestTransport`] and [`CookieCredentialStore`]
//!   backed by a shared `reqwest` cookie jar

mod error;
#[cfg(feature = "reqwest")]
mod http;

pub use error::TransportError;
#[cfg(feature = "reqwest")]
pub use http::{CookieCredentialStore, ReqwestTransport, TransportTimeouts};

use std::fmt;
use std::future::Future;

/// HTTP verbs the client issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    /// Returns `true` for verbs that change server state and therefore
    /// must carry the anti-forgery header.
    pub fn is_state_changing(self) -> bool {
        !matches!(self, Self::Get)
    }

    /// The upper-case verb as it appears on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully prepared outbound request, ready for the wire.
///
/// `path` is relative to the transport's origin (e.g. `/api/auth/me`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// Creates a request with no headers and no body.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Looks up a header value. Header names are case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Sets a header, replacing any existing value under the same name.
    pub fn set_header(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) {
        let name = name.into();
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
    }
}

/// The status and body of a completed exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// `true` for any status below 400.
    pub fn is_success(&self) -> bool {
        self.status < 400
    }

    /// `true` when the server reported the session as unauthenticated.
    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    /// The body as text, replacing invalid UTF-8 sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Executes one HTTP exchange.
///
/// Implementations return `Ok` for every response the server sends back,
/// whatever its status. `Err` means no response was obtained.
///
/// # Trait bounds
///
/// - `Send + Sync + 'static` → one transport is shared by every request
///   task for the lifetime of the client.
/// - The returned future is `Send` so callers can drive requests from
///   spawned tasks.
pub trait Transport: Send + Sync + 'static {
    /// Sends the request and waits for the response.
    fn execute(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send;
}

/// Read-only access to the anti-forgery (CSRF) token.
///
/// The server owns the value and sets it as a client-readable cookie.
/// Callers read it fresh for every request they prepare; implementations
/// must not cache it.
pub trait CredentialStore: Send + Sync + 'static {
    /// Returns the current token, or `None` if the cookie is absent.
    fn csrf_token(&self) -> Option<String>;
}
