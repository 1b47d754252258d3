// boardstack-api: Async Rust client for the boardstack REST API

pub mod auth;
pub mod boards;
pub mod client;
pub mod error;
pub mod integrated;
pub mod openstack;
pub mod session;
pub mod transport;
pub mod types;

pub use client::{ApiClient, DEFAULT_BASE_URL};
pub use error::Error;
pub use session::{
    AUTH_TOKEN_KEY, CredentialStore, DEFAULT_LOGIN_PATH, LoginRedirect, MemoryCredentialStore,
    Redirect, RedirectSignal,
};
pub use transport::{DEFAULT_TIMEOUT, TransportConfig};
pub use types::*;
