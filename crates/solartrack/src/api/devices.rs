//! Smart-plug control.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use solartrack_protocol::{RequestSpec, endpoints};
use solartrack_transport::{CredentialStore, Transport};

use crate::{Navigator, SessionClient, SolartrackError};

/// Shedding priority of a device: under a grid outage, lower priorities
/// are switched off first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DevicePriority {
    Critical,
    Medium,
    Low,
    NonEssential,
}

/// Switches a device on or off.
///
/// # Errors
/// See [`SessionClient::send`].
pub async fn update_state<T, C, N>(
    client: &SessionClient<T, C, N>,
    device_id: u64,
    is_active: bool,
) -> Result<Value, SolartrackError>
where
    T: Transport,
    C: CredentialStore,
    N: Navigator,
{
    let spec = RequestSpec::post(endpoints::IOT_UPDATE_STATE).json(
        client.codec(),
        &json!({ "device_id": device_id, "is_active": is_active }),
    )?;
    client.send_json(spec).await
}

/// Changes a device's shedding priority.
///
/// # Errors
/// See [`SessionClient::send`].
pub async fn update_priority<T, C, N>(
    client: &SessionClient<T, C, N>,
    device_id: u64,
    priority: DevicePriority,
) -> Result<Value, SolartrackError>
where
    T: Transport,
    C: CredentialStore,
    N: Navigator,
{
    let spec = RequestSpec::post(endpoints::IOT_UPDATE_PRIORITY).json(
        client.codec(),
        &json!({ "device_id": device_id, "new_priority": priority }),
    )?;
    client.send_json(spec).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_wire_names() {
        let names: Vec<Value> = [
            DevicePriority::Critical,
            DevicePriority::Medium,
            DevicePriority::Low,
            DevicePriority::NonEssential,
        ]
        .iter()
        .map(|p| serde_json::to_value(p).unwrap())
        .collect();
        assert_eq!(
            names,
            vec![json!("critical"), json!("medium"), json!("low"), json!("non_essential")]
        );
    }
}
