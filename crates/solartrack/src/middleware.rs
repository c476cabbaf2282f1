//! The request/response chain wrapped around every transport call.
//!
//! ```text
//!   RequestSpec ──→ CsrfLayer::prepare ──→ Transport::execute ──→ classify ──→ Disposition
//!                   (outbound)                                   (inbound)
//! ```
//!
//! Outbound, [`CsrfLayer`] turns a replayable [`RequestSpec`] into a
//! concrete [`HttpRequest`], attaching the anti-forgery header. Inbound,
//! [`classify`] decides what the client does with the response. Neither
//! half has side effects beyond reading the credential store; the
//! refresh protocol lives in the client, which acts on the disposition.

use solartrack_protocol::{RequestSpec, endpoints};
use solartrack_transport::{
    CredentialStore, HttpRequest, HttpResponse, Transport, TransportError,
};

/// Attaches the anti-forgery header to outbound requests.
pub struct CsrfLayer<C> {
    credentials: C,
}

impl<C: CredentialStore> CsrfLayer<C> {
    pub fn new(credentials: C) -> Self {
        Self { credentials }
    }

    pub fn credentials(&self) -> &C {
        &self.credentials
    }

    /// Builds the request for `spec`.
    ///
    /// State-changing methods on paths other than login and refresh get
    /// `X-CSRF-TOKEN` set to the token the credential store holds right
    /// now. No token means no header; the server decides whether that's
    /// acceptable.
    pub fn prepare(&self, spec: &RequestSpec) -> HttpRequest {
        let mut request = HttpRequest::new(spec.method, spec.path.clone());
        request.body = spec.body.clone();

        if spec.method.is_state_changing() && !endpoints::skips_csrf(&spec.path)
        {
            match self.credentials.csrf_token() {
                Some(token) => request.set_header(endpoints::CSRF_HEADER, token),
                None => tracing::debug!(
                    path = %spec.path,
                    "no anti-forgery token available; sending without it"
                ),
            }
        }
        request
    }
}

/// Outbound half of the chain: header injection, then the transport.
///
/// This is the raw path. It never looks at the response status, so calls
/// made through it can't start (or queue behind) a refresh.
pub struct Dispatcher<T, C> {
    transport: T,
    csrf: CsrfLayer<C>,
}

impl<T: Transport, C: CredentialStore> Dispatcher<T, C> {
    pub fn new(transport: T, credentials: C) -> Self {
        Self {
            transport,
            csrf: CsrfLayer::new(credentials),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn credentials(&self) -> &C {
        self.csrf.credentials()
    }

    pub async fn dispatch(
        &self,
        spec: &RequestSpec,
    ) -> Result<HttpResponse, TransportError> {
        let request = self.csrf.prepare(spec);
        let response = self.transport.execute(request).await?;
        tracing::debug!(
            method = %spec.method,
            path = %spec.path,
            status = response.status,
            replay = spec.already_retried,
            "response received"
        );
        Ok(response)
    }
}

/// What the client does with a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Success: hand the response to the caller untouched.
    Deliver,
    /// Failure the caller handles itself (any non-401 error status, or a
    /// 401 from an endpoint outside the refresh protocol).
    Fail,
    /// First 401 on a protected endpoint: refresh, then replay.
    Refresh,
    /// 401 on a replay: the session is gone.
    Expired,
}

/// Inbound half of the chain.
pub fn classify(spec: &RequestSpec, response: &HttpResponse) -> Disposition {
    if response.is_success() {
        Disposition::Deliver
    } else if !response.is_unauthorized() || spec.is_refresh_exempt() {
        Disposition::Fail
    } else if spec.already_retried {
        Disposition::Expired
    } else {
        Disposition::Refresh
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use solartrack_protocol::Method;

    use super::*;

    #[derive(Clone, Default)]
    struct Token(Arc<Mutex<Option<String>>>);

    impl Token {
        fn set(&self, value: Option<&str>) {
            *self.0.lock().unwrap() = value.map(str::to_owned);
        }
    }

    impl CredentialStore for Token {
        fn csrf_token(&self) -> Option<String> {
            self.0.lock().unwrap().clone()
        }
    }

    fn layer(token: Option<&str>) -> CsrfLayer<Token> {
        let store = Token::default();
        store.set(token);
        CsrfLayer::new(store)
    }

    fn response(status: u16) -> HttpResponse {
        HttpResponse::new(status, Vec::new())
    }

    // =====================================================================
    // CsrfLayer
    // =====================================================================

    #[test]
    fn test_prepare_state_changing_attaches_token() {
        let csrf = layer(Some("abc"));
        for method in [Method::Post, Method::Put, Method::Patch, Method::Delete] {
            let request =
                csrf.prepare(&RequestSpec::new(method, endpoints::BATTERY_ADD));
            assert_eq!(request.header("x-csrf-token"), Some("abc"), "{method}");
        }
    }

    #[test]
    fn test_prepare_get_never_attaches_token() {
        let request = layer(Some("abc")).prepare(&RequestSpec::get(endpoints::ME));
        assert!(request.header(endpoints::CSRF_HEADER).is_none());
    }

    #[test]
    fn test_prepare_login_and_refresh_skip_token() {
        let csrf = layer(Some("abc"));
        for path in [endpoints::LOGIN, endpoints::REFRESH] {
            let request = csrf.prepare(&RequestSpec::post(path));
            assert!(request.header(endpoints::CSRF_HEADER).is_none(), "{path}");
        }
        // Register isn't on the skip list.
        let request = csrf.prepare(&RequestSpec::post(endpoints::REGISTER));
        assert_eq!(request.header(endpoints::CSRF_HEADER), Some("abc"));
    }

    #[test]
    fn test_prepare_missing_token_sends_without_header() {
        let request =
            layer(None).prepare(&RequestSpec::post(endpoints::IOT_UPDATE_STATE));
        assert!(request.header(endpoints::CSRF_HEADER).is_none());
    }

    #[test]
    fn test_prepare_reads_token_each_time() {
        let store = Token::default();
        let csrf = CsrfLayer::new(store.clone());
        let spec = RequestSpec::post(endpoints::BATTERY_DELETE);

        store.set(Some("old"));
        assert_eq!(csrf.prepare(&spec).header(endpoints::CSRF_HEADER), Some("old"));

        store.set(Some("new"));
        let replay = spec.into_replay();
        assert_eq!(
            csrf.prepare(&replay).header(endpoints::CSRF_HEADER),
            Some("new")
        );
    }

    #[test]
    fn test_prepare_copies_method_path_and_body() {
        let spec = RequestSpec::put(endpoints::ADMIN_UPDATE_APPROVAL)
            .with_body(br#"{"approved":true}"#.to_vec());
        let request = layer(None).prepare(&spec);
        assert_eq!(request.method, Method::Put);
        assert_eq!(request.path, endpoints::ADMIN_UPDATE_APPROVAL);
        assert_eq!(request.body, spec.body);
    }

    // =====================================================================
    // classify
    // =====================================================================

    #[test]
    fn test_classify_success_delivers() {
        let spec = RequestSpec::get(endpoints::ME);
        assert_eq!(classify(&spec, &response(200)), Disposition::Deliver);
        assert_eq!(classify(&spec, &response(302)), Disposition::Deliver);
    }

    #[test]
    fn test_classify_first_401_refreshes() {
        let spec = RequestSpec::get(endpoints::ME);
        assert_eq!(classify(&spec, &response(401)), Disposition::Refresh);
    }

    #[test]
    fn test_classify_replayed_401_expires() {
        let spec = RequestSpec::get(endpoints::ME).into_replay();
        assert_eq!(classify(&spec, &response(401)), Disposition::Expired);
    }

    #[test]
    fn test_classify_exempt_401_fails_directly() {
        for path in [endpoints::LOGIN, endpoints::REGISTER, endpoints::REFRESH] {
            let spec = RequestSpec::post(path);
            assert_eq!(classify(&spec, &response(401)), Disposition::Fail);
            let replay = spec.into_replay();
            assert_eq!(classify(&replay, &response(401)), Disposition::Fail);
        }
    }

    #[test]
    fn test_classify_other_errors_fail() {
        let spec = RequestSpec::post(endpoints::BATTERY_ADD);
        for status in [400, 403, 404, 500, 503] {
            assert_eq!(classify(&spec, &response(status)), Disposition::Fail);
        }
    }
}
