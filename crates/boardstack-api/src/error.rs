use thiserror::Error;

/// Top-level error type for the `boardstack-api` crate.
///
/// Covers every failure mode of the HTTP adapter: transport, timeout,
/// non-2xx statuses, the globally handled 401, and body decoding.
/// `boardstack-core` maps these into user-facing errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// No response was received (connection refused, DNS failure, reset).
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// Request did not complete within the configured timeout.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── HTTP status ─────────────────────────────────────────────────
    /// The backend answered with a non-2xx status other than 401.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The backend answered 401. The stored credential has already been
    /// cleared and a redirect to the login boundary issued.
    #[error("Session expired -- login required")]
    AuthExpired,

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    // ── Credentials ─────────────────────────────────────────────────
    /// The credential store could not be read or written.
    #[error("Credential storage error: {0}")]
    Credential(String),
}

impl Error {
    /// Returns `true` if the session has expired and a login is required.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::AuthExpired)
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout { .. } => true,
            Self::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Http { status: 404, .. })
    }

    /// HTTP status code, if the backend produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::AuthExpired => Some(401),
            _ => None,
        }
    }
}
