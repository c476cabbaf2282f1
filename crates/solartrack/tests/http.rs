//! End-to-end tests: the reqwest-backed client against a local server
//! that issues real cookies.
//!
//! The server mimics the cookie scheme of the production backend: an
//! HTTP-only access cookie, an HTTP-only refresh cookie, and a
//! client-readable `csrf_access_token` that must be echoed in
//! `X-CSRF-TOKEN` on writes.

#![cfg(feature = "reqwest")]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{AppendHeaders, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use solartrack::api::battery;
use solartrack::prelude::*;

// =========================================================================
// Fake backend
// =========================================================================

#[derive(Default)]
struct Backend {
    /// The access cookie value currently accepted.
    access: Mutex<String>,
    /// The anti-forgery token currently expected.
    csrf: Mutex<String>,
    generation: AtomicUsize,
    refreshes: AtomicUsize,
    logouts: AtomicUsize,
}

impl Backend {
    /// Issues a fresh access/csrf pair and returns the cookies to set.
    fn rotate(&self) -> [(header::HeaderName, String); 2] {
        let n = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let access = format!("access-{n}");
        let csrf = format!("csrf-{n}");
        *self.access.lock().unwrap() = access.clone();
        *self.csrf.lock().unwrap() = csrf.clone();
        [
            (header::SET_COOKIE, format!("access_token_cookie={access}; Path=/; HttpOnly")),
            (header::SET_COOKIE, format!("csrf_access_token={csrf}; Path=/")),
        ]
    }

    /// Simulates the access token timing out server-side.
    fn expire_access(&self) {
        *self.access.lock().unwrap() = "expired".into();
    }

    fn access_ok(&self, headers: &HeaderMap) -> bool {
        cookie(headers, "access_token_cookie").as_deref()
            == Some(self.access.lock().unwrap().as_str())
    }
}

fn cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.to_string())
}

fn expired() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "msg": "Token has expired" })))
        .into_response()
}

async fn login(State(backend): State<Arc<Backend>>, Json(body): Json<Value>) -> Response {
    if body["password"] != "secret" {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Invalid credentials" })))
            .into_response();
    }
    let [access, csrf] = backend.rotate();
    (
        AppendHeaders([
            access,
            csrf,
            (header::SET_COOKIE, "refresh_token_cookie=refresh-1; Path=/; HttpOnly".to_string()),
        ]),
        Json(json!({ "message": "User Logged in successfully" })),
    )
        .into_response()
}

async fn refresh(State(backend): State<Arc<Backend>>, headers: HeaderMap) -> Response {
    if cookie(&headers, "refresh_token_cookie").as_deref() != Some("refresh-1") {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "msg": "Missing cookie" })))
            .into_response();
    }
    backend.refreshes.fetch_add(1, Ordering::SeqCst);
    (AppendHeaders(backend.rotate()), Json(json!({ "refresh": true }))).into_response()
}

async fn me(State(backend): State<Arc<Backend>>, headers: HeaderMap) -> Response {
    if !backend.access_ok(&headers) {
        return expired();
    }
    Json(json!({
        "user": { "id": 1, "username": "mika", "user_type": "regular" },
        "battery": null,
        "solar_system": { "system_id": 4 },
        "iot_devices": [{ "device_id": 10 }],
    }))
    .into_response()
}

async fn add_battery(
    State(backend): State<Arc<Backend>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !backend.access_ok(&headers) {
        return expired();
    }
    let sent = headers.get("x-csrf-token").and_then(|v| v.to_str().ok());
    if sent != Some(backend.csrf.lock().unwrap().as_str()) {
        return (StatusCode::FORBIDDEN, Json(json!({ "msg": "CSRF token mismatch" })))
            .into_response();
    }
    (StatusCode::CREATED, Json(json!({ "battery": body }))).into_response()
}

async fn logout(State(backend): State<Arc<Backend>>) -> Response {
    backend.logouts.fetch_add(1, Ordering::SeqCst);
    Json(json!({ "logout": true })).into_response()
}

/// Starts the fake backend and returns it with its base URL.
async fn start_server() -> (Arc<Backend>, String) {
    let backend = Arc::new(Backend::default());
    let app = Router::new()
        .route(endpoints::LOGIN, post(login))
        .route(endpoints::REFRESH, post(refresh))
        .route(endpoints::ME, get(me))
        .route(endpoints::BATTERY_ADD, post(add_battery))
        .route(endpoints::LOGOUT, post(logout))
        .with_state(Arc::clone(&backend));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("should bind");
    let addr = listener.local_addr().expect("should have addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (backend, format!("http://{addr}"))
}

type HttpClient =
    SessionClient<ReqwestTransport, CookieCredentialStore, Arc<MemoryNavigator>>;

fn client_for(base_url: &str, navigator: &Arc<MemoryNavigator>) -> HttpClient {
    SessionClientBuilder::new()
        .base_url(base_url)
        .build_reqwest(Arc::clone(navigator))
        .expect("client builds")
}

fn sample_battery() -> BatteryData {
    BatteryData {
        model_name: "LFP-10".into(),
        capacity_kwh: 10.0,
        max_charge_rate_kw: 5.0,
        max_discharge_rate_kw: 5.0,
        efficiency: 0.95,
        manufacturer: None,
    }
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_login_then_write_uses_cookie_token() {
    let (_backend, base) = start_server().await;
    let navigator = Arc::new(MemoryNavigator::new("/login"));
    let client = client_for(&base, &navigator);

    AuthService::new(client.clone())
        .login(&LoginCredentials::new("mika", "secret"))
        .await
        .expect("login succeeds");
    assert_eq!(client.credentials().csrf_token().as_deref(), Some("csrf-1"));

    let stored = battery::add(&client, &sample_battery())
        .await
        .expect("write accepted with the cookie token");
    assert_eq!(stored["model_name"], "LFP-10");
}

#[tokio::test]
async fn test_expired_access_refreshes_and_replays_with_new_token() {
    let (backend, base) = start_server().await;
    let navigator = Arc::new(MemoryNavigator::new("/dashboard"));
    let client = client_for(&base, &navigator);
    AuthService::new(client.clone())
        .login(&LoginCredentials::new("mika", "secret"))
        .await
        .expect("login succeeds");

    backend.expire_access();
    let stored = battery::add(&client, &sample_battery())
        .await
        .expect("replay accepted after refresh");

    assert_eq!(stored["capacity_kwh"], 10.0);
    assert_eq!(backend.refreshes.load(Ordering::SeqCst), 1);
    assert_eq!(client.credentials().csrf_token().as_deref(), Some("csrf-2"));
    assert!(client.store().is_authenticated());
    assert_eq!(navigator.hard_redirects(), 0);
}

#[tokio::test]
async fn test_probe_without_cookies_ends_on_login_page() {
    let (backend, base) = start_server().await;
    let navigator = Arc::new(MemoryNavigator::new("/dashboard"));
    let client = client_for(&base, &navigator);

    let outcome = client.check_auth().await;

    assert_eq!(outcome, ProbeOutcome::Anonymous);
    assert_eq!(client.store().snapshot().view(), SessionView::Anonymous);
    assert_eq!(backend.refreshes.load(Ordering::SeqCst), 0);
    assert_eq!(backend.logouts.load(Ordering::SeqCst), 1);
    assert_eq!(navigator.current_route(), "/login");
}

#[tokio::test]
async fn test_bad_password_is_reported_inline() {
    let (_backend, base) = start_server().await;
    let navigator = Arc::new(MemoryNavigator::new("/login"));
    let client = client_for(&base, &navigator);

    let err = AuthService::new(client.clone())
        .login(&LoginCredentials::new("mika", "wrong"))
        .await
        .unwrap_err();

    assert_eq!(err.http_status(), Some(401));
    assert_eq!(
        client.store().snapshot().error.as_deref(),
        Some("Invalid credentials")
    );
    assert_eq!(navigator.hard_redirects(), 0);
}
