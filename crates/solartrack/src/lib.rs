//! # SolarTrack
//!
//! Authenticated-session HTTP client for the SolarTrack home-energy
//! service.
//!
//! Every API call goes through a [`SessionClient`], which attaches the
//! anti-forgery header, notices when the access token has expired,
//! refreshes it once no matter how many requests noticed, and replays
//! the requests that were waiting. When the session can't be saved it
//! logs the user out and sends them to the login page.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use solartrack::prelude::*;
//!
//! # async fn run() -> Result<(), SolartrackError> {
//! let client = SessionClientBuilder::new()
//!     .config(ClientConfig::from_env()?)
//!     .build_reqwest(MemoryNavigator::new("/"))?;
//!
//! if client.check_auth().await == ProbeOutcome::Authenticated {
//!     let users = solartrack::api::admin::fetch_all_users(&client).await?;
//!     println!("{} users", users.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
mod auth;
mod builder;
mod client;
mod config;
mod coordinator;
mod error;
mod failure;
pub mod middleware;
mod navigator;

pub use auth::{AuthService, LoginCredentials};
pub use builder::SessionClientBuilder;
pub use client::{ProbeOutcome, SessionClient};
pub use config::{ClientConfig, DEFAULT_BASE_URL, DEFAULT_LOGIN_ROUTE};
pub use coordinator::RefreshCoordinator;
pub use error::{ConfigError, SolartrackError};
pub use failure::AuthFailureHandler;
pub use navigator::{MemoryNavigator, Navigator};

/// Re-exports everything an embedder needs.
pub mod prelude {
    pub use crate::api::battery::BatteryData;
    pub use crate::api::devices::DevicePriority;
    pub use crate::{
        AuthService, ClientConfig, ConfigError, LoginCredentials,
        MemoryNavigator, Navigator, ProbeOutcome, RefreshCoordinator,
        SessionClient, SessionClientBuilder, SolartrackError,
    };

    pub use solartrack_protocol::{
        Codec, JsonCodec, Method, ProtocolError, RequestSpec, SessionPayload,
        UserProfile, endpoints,
    };
    pub use solartrack_session::{
        Session, SessionError, SessionEvent, SessionStore, SessionView,
    };
    pub use solartrack_transport::{
        CredentialStore, HttpRequest, HttpResponse, Transport, TransportError,
    };
    #[cfg(feature = "reqwest")]
    pub use solartrack_transport::{
        CookieCredentialStore, ReqwestTransport, TransportTimeouts,
    };
}
