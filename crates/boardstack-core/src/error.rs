// ── Core error types ──
//
// User-facing errors from boardstack-core. Consumers never see reqwest
// errors or raw JSON failures; the `From<boardstack_api::Error>` impl
// translates transport-layer errors into this taxonomy.
//
// `CoreError` is `Clone` so a single fetch failure can be shared by every
// caller coalesced onto that fetch and kept in the cache entry.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    // ── Transport ────────────────────────────────────────────────────
    #[error("Cannot reach the backend at {url}: {reason}")]
    Network { url: String, reason: String },

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── HTTP ─────────────────────────────────────────────────────────
    #[error("Server responded with HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Session expired -- login required")]
    AuthExpired,

    #[error("Invalid response from backend: {message}")]
    InvalidResponse { message: String },

    // ── Client-side ──────────────────────────────────────────────────
    #[error("Invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("Credential storage error: {message}")]
    Credential { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::AuthExpired)
    }

    /// HTTP status associated with the failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::AuthExpired => Some(401),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub(crate) fn validation(field: &str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<boardstack_api::Error> for CoreError {
    fn from(err: boardstack_api::Error) -> Self {
        match err {
            boardstack_api::Error::Network(e) => CoreError::Network {
                url: e
                    .url()
                    .map_or_else(|| "<unknown>".into(), ToString::to_string),
                reason: e.to_string(),
            },
            boardstack_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            boardstack_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            boardstack_api::Error::Http { status, message } => CoreError::Http { status, message },
            boardstack_api::Error::AuthExpired => CoreError::AuthExpired,
            boardstack_api::Error::Deserialization { message, body: _ } => {
                CoreError::InvalidResponse { message }
            }
            boardstack_api::Error::Credential(message) => CoreError::Credential { message },
        }
    }
}
