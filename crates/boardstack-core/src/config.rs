// ── Runtime client configuration ──
//
// These types describe *how* to talk to the backend and how long cached
// data stays fresh. They never touch disk; the CLI builds a `ClientConfig`
// (via boardstack-config) and hands it in.

use std::time::Duration;

use url::Url;

use crate::query::QueryOptions;

/// Lists are fresh for five minutes after a successful fetch.
pub const LIST_STALE_AFTER: Duration = Duration::from_secs(5 * 60);

/// Detail reads always refetch (coalesced while in flight).
pub const DETAIL_STALE_AFTER: Duration = Duration::ZERO;

/// Notifications disappear after five seconds unless dismissed earlier.
pub const NOTIFICATION_TTL: Duration = Duration::from_secs(5);

/// The deployment dashboard refreshes every thirty seconds.
pub const DASHBOARD_REFRESH: Duration = Duration::from_secs(30);

/// Configuration for a single backend session.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL (e.g., `http://localhost:8080/api`).
    pub base_url: Url,
    /// Request timeout.
    pub timeout: Duration,
    /// Login boundary a 401 redirects to.
    pub login_path: String,
    pub list_stale_after: Duration,
    pub detail_stale_after: Duration,
    pub notification_ttl: Duration,
    pub dashboard_refresh: Duration,
}

impl ClientConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            ..Self::default()
        }
    }

    pub fn list_options(&self) -> QueryOptions {
        QueryOptions::stale_after(self.list_stale_after)
    }

    pub fn detail_options(&self) -> QueryOptions {
        QueryOptions::stale_after(self.detail_stale_after)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: boardstack_api::DEFAULT_BASE_URL
                .parse()
                .expect("default base URL is valid"),
            timeout: boardstack_api::DEFAULT_TIMEOUT,
            login_path: boardstack_api::DEFAULT_LOGIN_PATH.into(),
            list_stale_after: LIST_STALE_AFTER,
            detail_stale_after: DETAIL_STALE_AFTER,
            notification_ttl: NOTIFICATION_TTL,
            dashboard_refresh: DASHBOARD_REFRESH,
        }
    }
}
