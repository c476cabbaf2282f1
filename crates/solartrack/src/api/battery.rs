//! Home battery management.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use solartrack_protocol::{ProtocolError, RequestSpec, endpoints};
use solartrack_transport::{CredentialStore, Transport};

use crate::{Navigator, SessionClient, SolartrackError};

/// A battery as entered in the add-battery form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatteryData {
    pub model_name: String,
    pub capacity_kwh: f64,
    pub max_charge_rate_kw: f64,
    pub max_discharge_rate_kw: f64,
    /// Round-trip efficiency, `0.0..=1.0`.
    pub efficiency: f64,
    pub manufacturer: Option<String>,
}

/// Adds a battery to the user's system and returns it as stored.
///
/// # Errors
/// See [`SessionClient::send`]; [`ProtocolError::InvalidMessage`] if the
/// response has no `battery` field.
pub async fn add<T, C, N>(
    client: &SessionClient<T, C, N>,
    battery: &BatteryData,
) -> Result<Value, SolartrackError>
where
    T: Transport,
    C: CredentialStore,
    N: Navigator,
{
    let spec = RequestSpec::post(endpoints::BATTERY_ADD).json(client.codec(), battery)?;
    let mut response: Value = client.send_json(spec).await?;
    match response.get_mut("battery").map(Value::take) {
        Some(battery) => Ok(battery),
        None => Err(ProtocolError::InvalidMessage(
            "battery missing from add response".into(),
        )
        .into()),
    }
}

/// Removes a battery from a solar system.
///
/// # Errors
/// See [`SessionClient::send`].
pub async fn delete<T, C, N>(
    client: &SessionClient<T, C, N>,
    battery_id: u64,
    solar_system_id: u64,
) -> Result<Value, SolartrackError>
where
    T: Transport,
    C: CredentialStore,
    N: Navigator,
{
    let spec = RequestSpec::post(endpoints::BATTERY_DELETE).json(
        client.codec(),
        &json!({ "battery_id": battery_id, "solar_system_id": solar_system_id }),
    )?;
    client.send_json(spec).await
}
