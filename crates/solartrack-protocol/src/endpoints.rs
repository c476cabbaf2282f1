//! The server's URL surface and the per-endpoint rules the client applies.
//!
//! Two rule sets key off the request path:
//!
//! - **Anti-forgery exemption** ([`skips_csrf`]): login and refresh never
//!   carry `X-CSRF-TOKEN`.
//! - **Refresh exemption** ([`is_refresh_exempt`]): failures on login,
//!   register, and refresh go straight back to the caller and never start
//!   a refresh.

/// Identity probe: returns the user plus battery/system/device snapshots.
pub const ME: &str = "/api/auth/me";
pub const LOGIN: &str = "/api/auth/login";
pub const REGISTER: &str = "/api/auth/register";
/// Exchanges the refresh cookie for a new access cookie.
pub const REFRESH: &str = "/api/auth/refresh";
/// Server-side session invalidation.
pub const LOGOUT: &str = "/api/auth/logout";

pub const IOT_UPDATE_STATE: &str = "/api/iot/update-state";
pub const IOT_UPDATE_PRIORITY: &str = "/api/iot/update-priority";
pub const BATTERY_ADD: &str = "/api/battery/add";
pub const BATTERY_DELETE: &str = "/api/battery/delete";
pub const ADMIN_USERS: &str = "/api/auth/admin_getUsers";
pub const ADMIN_UPDATE_APPROVAL: &str = "/api/auth/admin_updateApproval";

/// Header the server expects the anti-forgery token echoed in.
pub const CSRF_HEADER: &str = "X-CSRF-TOKEN";
/// Client-readable cookie the server stores the anti-forgery token in.
pub const CSRF_COOKIE: &str = "csrf_access_token";

/// Strips any query string so `/api/auth/login?next=/` matches `LOGIN`.
fn route(path: &str) -> &str {
    path.split_once('?').map_or(path, |(route, _)| route)
}

/// `true` if requests to `path` never carry the anti-forgery header.
pub fn skips_csrf(path: &str) -> bool {
    matches!(route(path), LOGIN | REFRESH)
}

/// `true` if failures on `path` bypass the refresh protocol entirely.
pub fn is_refresh_exempt(path: &str) -> bool {
    matches!(route(path), LOGIN | REGISTER | REFRESH)
}
