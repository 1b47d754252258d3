// ── Credential storage and the login boundary ──
//
// The adapter reads the bearer token from a `CredentialStore` on every
// request and, on a 401, clears it and asks the `LoginRedirect` hook to
// navigate to the login boundary.

use std::sync::RwLock;

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use tokio::sync::watch;

use crate::Error;

/// Fixed storage key the bearer token is persisted under.
pub const AUTH_TOKEN_KEY: &str = "authToken";

/// Default login boundary a 401 redirects to.
pub const DEFAULT_LOGIN_PATH: &str = "/login";

/// Persisted bearer-token storage.
pub trait CredentialStore: Send + Sync {
    /// The stored token, if any.
    fn token(&self) -> Option<SecretString>;

    /// Persist a new token, replacing any previous one.
    fn store(&self, token: SecretString) -> Result<(), Error>;

    /// Remove the stored token. Clearing an empty store succeeds.
    fn clear(&self) -> Result<(), Error>;
}

/// Receives the "hard navigation" to the login boundary after a 401.
pub trait LoginRedirect: Send + Sync {
    fn redirect(&self, location: &str);
}

// ── In-memory credential store ───────────────────────────────────────

/// Process-local credential store. Used by tests and as the fallback
/// when no persistent store is configured.
#[derive(Default)]
pub struct MemoryCredentialStore {
    token: RwLock<Option<SecretString>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(SecretString::from(token.into()))),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn token(&self) -> Option<SecretString> {
        self.token.read().ok().and_then(|t| t.clone())
    }

    fn store(&self, token: SecretString) -> Result<(), Error> {
        let mut slot = self
            .token
            .write()
            .map_err(|_| Error::Credential("credential lock poisoned".into()))?;
        *slot = Some(token);
        Ok(())
    }

    fn clear(&self) -> Result<(), Error> {
        let mut slot = self
            .token
            .write()
            .map_err(|_| Error::Credential("credential lock poisoned".into()))?;
        *slot = None;
        Ok(())
    }
}

// ── Redirect signal ──────────────────────────────────────────────────

/// A single redirect request issued by the adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub location: String,
    /// Monotonic counter, starting at 1 for the first redirect.
    pub sequence: u64,
    pub issued_at: DateTime<Utc>,
}

/// `LoginRedirect` backed by a `watch` channel.
///
/// Front ends subscribe and react to the latest redirect; tests inspect
/// [`RedirectSignal::last`].
pub struct RedirectSignal {
    tx: watch::Sender<Option<Redirect>>,
}

impl RedirectSignal {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Redirect>> {
        self.tx.subscribe()
    }

    pub fn last(&self) -> Option<Redirect> {
        self.tx.borrow().clone()
    }
}

impl Default for RedirectSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl LoginRedirect for RedirectSignal {
    fn redirect(&self, location: &str) {
        // `send_modify` updates unconditionally, even with zero receivers.
        self.tx.send_modify(|slot| {
            let sequence = slot.as_ref().map_or(1, |r| r.sequence + 1);
            *slot = Some(Redirect {
                location: location.to_owned(),
                sequence,
                issued_at: Utc::now(),
            });
        });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn memory_store_round_trips_and_clears() {
        let store = MemoryCredentialStore::new();
        assert!(store.token().is_none());

        store.store(SecretString::from("abc".to_string())).unwrap();
        assert_eq!(store.token().unwrap().expose_secret(), "abc");

        store.clear().unwrap();
        assert!(store.token().is_none());
        // clearing twice is fine
        store.clear().unwrap();
    }

    #[test]
    fn redirect_signal_counts_redirects() {
        let signal = RedirectSignal::new();
        assert!(signal.last().is_none());

        signal.redirect("/login");
        signal.redirect("/login");

        let last = signal.last().unwrap();
        assert_eq!(last.location, "/login");
        assert_eq!(last.sequence, 2);
    }
}
