//! Runs the startup auth probe against a live SolarTrack server and
//! prints the resulting session.
//!
//! ```text
//! SOLARTRACK_BASE_URL=http://127.0.0.1:5000 \
//! SOLARTRACK_USERNAME=mika SOLARTRACK_PASSWORD=... \
//! RUST_LOG=solartrack=debug cargo run -p session-probe
//! ```
//!
//! With no cookies yet the probe ends anonymous; if credentials are
//! given in the environment the demo then logs in.

use std::sync::Arc;

use solartrack::prelude::*;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let config = ClientConfig::from_env()?;
    tracing::info!(base_url = %config.base_url, "probing session");

    let navigator = Arc::new(MemoryNavigator::new("/"));
    let client = SessionClientBuilder::new()
        .config(config)
        .build_reqwest(Arc::clone(&navigator))?;

    let outcome = client.check_auth().await;
    tracing::info!(?outcome, "startup probe settled");

    if outcome != ProbeOutcome::Authenticated {
        if let (Ok(username), Ok(password)) = (
            std::env::var("SOLARTRACK_USERNAME"),
            std::env::var("SOLARTRACK_PASSWORD"),
        ) {
            let auth = AuthService::new(client.clone());
            if let Err(e) = auth.login(&LoginCredentials::new(username, password)).await {
                tracing::warn!(error = %e.user_message(), "login failed");
            }
        }
    }

    print_session(&client.store().snapshot());
    if navigator.hard_redirects() > 0 {
        println!("redirected to {}", navigator.current_route());
    }
    Ok(())
}

fn print_session(session: &Session) {
    match session.view() {
        SessionView::Loading => println!("session: still loading"),
        SessionView::Anonymous => match &session.error {
            Some(error) => println!("session: anonymous ({error})"),
            None => println!("session: anonymous"),
        },
        SessionView::Authenticated => {
            let name = session
                .user
                .as_ref()
                .and_then(|u| u.username.as_deref())
                .unwrap_or("<unnamed>");
            println!("session: authenticated as {name}");
            println!("  devices: {}", session.iot_devices.len());
            println!("  battery: {}", session.battery.is_some());
            println!("  solar system: {}", session.solar_system.is_some());
        }
    }
}
