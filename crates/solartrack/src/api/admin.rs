//! Admin approval screens.

use serde_json::{Value, json};
use solartrack_protocol::{ProtocolError, RequestSpec, endpoints};
use solartrack_transport::{CredentialStore, Transport};

use crate::{Navigator, SessionClient, SolartrackError};

/// Lists every registered user with their system's approval state.
///
/// # Errors
/// See [`SessionClient::send`]; [`ProtocolError::InvalidMessage`] if the
/// response has no `users` list.
pub async fn fetch_all_users<T, C, N>(
    client: &SessionClient<T, C, N>,
) -> Result<Vec<Value>, SolartrackError>
where
    T: Transport,
    C: CredentialStore,
    N: Navigator,
{
    let mut response: Value =
        client.send_json(RequestSpec::get(endpoints::ADMIN_USERS)).await?;
    match response.get_mut("users").map(Value::take) {
        Some(Value::Array(users)) => Ok(users),
        _ => Err(ProtocolError::InvalidMessage("users missing from response".into()).into()),
    }
}

/// Approves or revokes a solar system.
///
/// # Errors
/// See [`SessionClient::send`].
pub async fn update_approval<T, C, N>(
    client: &SessionClient<T, C, N>,
    system_id: u64,
    approved: bool,
) -> Result<Value, SolartrackError>
where
    T: Transport,
    C: CredentialStore,
    N: Navigator,
{
    let spec = RequestSpec::put(endpoints::ADMIN_UPDATE_APPROVAL).json(
        client.codec(),
        &json!({ "system_id": system_id, "approved": approved }),
    )?;
    client.send_json(spec).await
}
