//! HTTP transport implementation using `reqwest`.
//!
//! The transport and the credential store share one cookie jar: the
//! server sets its identity, refresh, and anti-forgery cookies on
//! responses, the jar replays them on later requests, and
//! [`CookieCredentialStore`] reads the one client-readable value back out.

use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use url::Url;

use crate::{
    CredentialStore, HttpRequest, HttpResponse, Method, Transport,
    TransportError,
};

/// Timeouts applied to every exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportTimeouts {
    /// Whole-request deadline, from send to last body byte.
    pub request: Duration,
    /// Deadline for establishing the TCP/TLS connection.
    pub connect: Duration,
}

impl Default for TransportTimeouts {
    fn default() -> Self {
        Self {
            request: Duration::from_secs(30),
            connect: Duration::from_secs(10),
        }
    }
}

/// A [`Transport`] that talks to a single origin over HTTPS.
pub struct ReqwestTransport {
    http: reqwest::Client,
    base_url: Url,
}

impl ReqwestTransport {
    /// Builds a transport for `base_url`, storing cookies in `jar`.
    ///
    /// Every request is sent with `Content-Type: application/json`.
    pub fn new(
        base_url: Url,
        jar: Arc<Jar>,
        timeouts: TransportTimeouts,
    ) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .cookie_provider(jar)
            .timeout(timeouts.request)
            .connect_timeout(timeouts.connect)
            .build()
            .map_err(|e| TransportError::Build(e.to_string()))?;

        tracing::debug!(%base_url, "HTTP transport ready");
        Ok(Self { http, base_url })
    }

    /// The origin every request path is resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolves `path` against the base URL.
    ///
    /// Only origin-relative paths are accepted: an absolute or
    /// scheme-relative path would carry the session cookies and the
    /// anti-forgery header to another host.
    fn url_for(&self, path: &str) -> Result<Url, TransportError> {
        if !path.starts_with('/') || path.starts_with("//") {
            return Err(TransportError::InvalidUrl(format!(
                "{path}: not an origin-relative path"
            )));
        }
        let url = self
            .base_url
            .join(path)
            .map_err(|e| TransportError::InvalidUrl(format!("{path}: {e}")))?;
        if url.origin() != self.base_url.origin() {
            return Err(TransportError::InvalidUrl(format!(
                "{path}: resolves outside {}",
                self.base_url
            )));
        }
        Ok(url)
    }
}

impl Transport for ReqwestTransport {
    async fn execute(
        &self,
        request: HttpRequest,
    ) -> Result<HttpResponse, TransportError> {
        let url = self.url_for(&request.path)?;
        let mut builder = self.http.request(to_reqwest(request.method), url);

        for (name, value) in &request.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| TransportError::InvalidHeader(e.to_string()))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| TransportError::InvalidHeader(e.to_string()))?;
            builder = builder.header(name, value);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::Body(e.to_string()))?
            .to_vec();

        tracing::trace!(
            method = %request.method,
            path = %request.path,
            status,
            "exchange complete"
        );
        Ok(HttpResponse { status, body })
    }
}

fn to_reqwest(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

/// Reads the anti-forgery token out of the shared cookie jar.
///
/// The jar is queried on every call, so a cookie rotated by the server
/// is picked up by the very next request.
pub struct CookieCredentialStore {
    jar: Arc<Jar>,
    origin: Url,
    cookie_name: String,
}

impl CookieCredentialStore {
    /// Creates a store reading `cookie_name` for `origin` from `jar`.
    pub fn new(
        jar: Arc<Jar>,
        origin: Url,
        cookie_name: impl Into<String>,
    ) -> Self {
        Self {
            jar,
            origin,
            cookie_name: cookie_name.into(),
        }
    }
}

impl CredentialStore for CookieCredentialStore {
    fn csrf_token(&self) -> Option<String> {
        let header = self.jar.cookies(&self.origin)?;
        let raw = header.to_str().ok()?;
        cookie_value(raw, &self.cookie_name)
    }
}

/// Picks one value out of a `Cookie:` header (`a=1; b=2`).
/// An empty value counts as absent.
fn cookie_value(header: &str, name: &str) -> Option<String> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}
