//! Client-side data layer between `boardstack-api` and the CLI.
//!
//! - **[`QueryCache`]**: keyed cache of server resources. Reads coalesce
//!   into one in-flight fetch per [`QueryKey`], stale entries refetch in
//!   the background, failures keep the last good value, and writes go
//!   through [`QueryCache::mutate`] which invalidates key families by
//!   prefix once the server has confirmed them.
//!
//! - **[`NotificationStore`]**: ordered list of transient messages, each
//!   removed after a fixed TTL by a cancelable timer.
//!
//! - **[`Session`]**: facade tying an [`ApiClient`](boardstack_api::ApiClient)
//!   to a cache and a notification store. Mutations report success or
//!   failure as notifications; a 401 surfaces as a redirect on
//!   [`Session::redirects`].
//!
//! - **[`spawn_dashboard`]**: periodic refresh of deployments and system
//!   status, stopped through a `CancellationToken`.

pub mod config;
pub mod error;
pub mod notify;
pub mod poll;
pub mod query;
pub mod session;
pub mod validate;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::ClientConfig;
pub use error::CoreError;
pub use notify::{Notification, NotificationId, NotificationKind, NotificationStore};
pub use poll::{DashboardHandle, DashboardUpdate, DeploymentStats, spawn_dashboard};
pub use query::{
    BOARDS, DEPLOYMENTS, QueryCache, QueryKey, QueryOptions, QueryState, QueryStatus, QueryWatch,
};
pub use session::Session;

// Resource types pass through unchanged.
pub use boardstack_api::{
    AuthSession, Board, BoardCreateRequest, BoardUpdateRequest, CredentialStore, DeployRequest,
    Deployment, DeploymentMap, DeploymentStatus, MemoryCredentialStore, Redirect, SystemStatus,
    VmRequest,
};
