//! Request descriptors and the payloads the auth endpoints return.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use solartrack_transport::Method;

use crate::{Codec, ProtocolError, endpoints};

// ---------------------------------------------------------------------------
// RequestSpec
// ---------------------------------------------------------------------------

/// A replayable description of one API call.
///
/// This is what callers hand to the session client. It holds everything
/// needed to issue the call again after a session refresh: the method,
/// path and body are reused verbatim, and `already_retried` records that
/// the one allowed replay has been spent.
///
/// Headers are not part of the descriptor: the anti-forgery header is
/// attached at dispatch time, so a replay carries whatever token is
/// current when it is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSpec {
    pub method: Method,
    pub path: String,
    pub body: Option<Vec<u8>>,
    pub already_retried: bool,
}

impl RequestSpec {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            already_retried: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::Patch, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    /// Attaches an already-encoded body.
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Encodes `value` with `codec` and attaches it as the body.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if `value` can't be serialized.
    pub fn json<C: Codec, T: Serialize>(
        self,
        codec: &C,
        value: &T,
    ) -> Result<Self, ProtocolError> {
        let body = codec.encode(value)?;
        Ok(self.with_body(body))
    }

    /// The same call, marked as having used up its one replay.
    pub fn into_replay(mut self) -> Self {
        self.already_retried = true;
        self
    }

    /// See [`endpoints::is_refresh_exempt`].
    pub fn is_refresh_exempt(&self) -> bool {
        endpoints::is_refresh_exempt(&self.path)
    }
}

// ---------------------------------------------------------------------------
// Identity and session payloads
// ---------------------------------------------------------------------------

/// The authenticated user as reported by `/api/auth/me`.
///
/// Only `id` is guaranteed; the server fills the rest from its cache or
/// database and may leave any of them `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: u64,
    pub username: Option<String>,
    pub email: Option<String>,
    /// `"regular"` or `"admin"`.
    pub user_type: Option<String>,
    pub house_size_sqm: Option<f64>,
    pub num_household_members: Option<u32>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub registration_date: Option<String>,
}

impl UserProfile {
    /// `true` if the user may open the admin approval screens.
    pub fn is_admin(&self) -> bool {
        self.user_type.as_deref() == Some("admin")
    }
}

/// Everything `/api/auth/me` returns: identity plus resource snapshots.
///
/// `battery` and `solar_system` are opaque to the auth core and kept as
/// raw JSON. `iot_devices` arrives either as a bare list or wrapped as
/// `{ "devices": [...] }`, depending on which server path produced it;
/// both shapes normalize to a plain list, and anything else to an empty
/// one.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SessionPayload {
    #[serde(default)]
    pub user: Option<UserProfile>,
    #[serde(default)]
    pub battery: Option<Value>,
    #[serde(default)]
    pub solar_system: Option<Value>,
    #[serde(default, deserialize_with = "deserialize_devices")]
    pub iot_devices: Vec<Value>,
}

fn deserialize_devices<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(normalize_devices(raw))
}

/// Flattens the two device-list shapes the server emits into one list.
pub fn normalize_devices(raw: Value) -> Vec<Value> {
    match raw {
        Value::Array(devices) => devices,
        Value::Object(mut wrapper) => match wrapper.remove("devices") {
            Some(Value::Array(devices)) => devices,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// Pulls a human-readable message out of a JSON error body.
///
/// The server is not consistent about the field name: application errors
/// use `error` or `message`, token errors use `msg`. Returns `None` if
/// the body isn't JSON or carries none of them.
pub fn error_message(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    ["message", "error", "msg"]
        .iter()
        .find_map(|key| value.get(key).and_then(Value::as_str))
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::JsonCodec;

    fn decode_payload(value: Value) -> SessionPayload {
        serde_json::from_value(value).expect("payload should decode")
    }

    // =====================================================================
    // RequestSpec
    // =====================================================================

    #[test]
    fn test_request_spec_starts_unretried() {
        let spec = RequestSpec::get(endpoints::ME);
        assert_eq!(spec.method, Method::Get);
        assert!(!spec.already_retried);
        assert!(spec.body.is_none());
    }

    #[test]
    fn test_into_replay_keeps_call_and_marks_retried() {
        let spec = RequestSpec::post(endpoints::BATTERY_DELETE)
            .with_body(br#"{"battery_id":1}"#.to_vec());

        let replay = spec.clone().into_replay();

        assert!(replay.already_retried);
        assert_eq!(replay.method, spec.method);
        assert_eq!(replay.path, spec.path);
        assert_eq!(replay.body, spec.body);
    }

    #[test]
    fn test_json_encodes_body() {
        let spec = RequestSpec::post(endpoints::IOT_UPDATE_STATE)
            .json(&JsonCodec, &json!({ "device_id": 3, "is_active": true }))
            .expect("should encode");

        let body: Value = serde_json::from_slice(spec.body.as_deref().unwrap())
            .expect("body is json");
        assert_eq!(body, json!({ "device_id": 3, "is_active": true }));
    }

    // =====================================================================
    // SessionPayload
    // =====================================================================

    #[test]
    fn test_payload_accepts_bare_device_list() {
        let payload = decode_payload(json!({
            "user": { "id": 1 },
            "iot_devices": [{ "device_id": 1 }, { "device_id": 2 }],
        }));
        assert_eq!(payload.iot_devices.len(), 2);
    }

    #[test]
    fn test_payload_unwraps_devices_wrapper() {
        let payload = decode_payload(json!({
            "user": { "id": 1 },
            "iot_devices": { "devices": [{ "device_id": 9 }] },
        }));
        assert_eq!(payload.iot_devices, vec![json!({ "device_id": 9 })]);
    }

    #[test]
    fn test_payload_defaults_devices_to_empty() {
        for devices in [json!(null), json!("nope"), json!({ "devices": 5 })] {
            let payload = decode_payload(json!({
                "user": { "id": 1 },
                "iot_devices": devices,
            }));
            assert!(payload.iot_devices.is_empty());
        }

        let missing = decode_payload(json!({ "user": { "id": 1 } }));
        assert!(missing.iot_devices.is_empty());
    }

    #[test]
    fn test_payload_null_snapshots_become_none() {
        let payload = decode_payload(json!({
            "user": { "id": 4, "username": "ana", "user_type": "admin" },
            "battery": null,
            "solar_system": { "system_id": 12 },
        }));
        assert!(payload.battery.is_none());
        assert_eq!(payload.solar_system, Some(json!({ "system_id": 12 })));

        let user = payload.user.expect("user present");
        assert_eq!(user.username.as_deref(), Some("ana"));
        assert!(user.is_admin());
        assert!(user.email.is_none());
    }

    // =====================================================================
    // error_message
    // =====================================================================

    #[test]
    fn test_error_message_reads_known_fields() {
        assert_eq!(
            error_message(br#"{"error":"Invalid credentials"}"#),
            Some("Invalid credentials".to_string())
        );
        assert_eq!(
            error_message(br#"{"message":"Missing fields: password"}"#),
            Some("Missing fields: password".to_string())
        );
        assert_eq!(
            error_message(br#"{"msg":"Token has expired"}"#),
            Some("Token has expired".to_string())
        );
    }

    #[test]
    fn test_error_message_non_json_is_none() {
        assert_eq!(error_message(b"Bad Gateway"), None);
        assert_eq!(error_message(br#"{"status":"nope"}"#), None);
    }
}
