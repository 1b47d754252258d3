// ── Cache entry state ──
//
// `EntryState` is the type-erased record stored per key and broadcast
// through the entry's `watch` channel. `QueryState<V>` is the typed view
// handed to consumers.

use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;
use tracing::warn;

use super::key::QueryKey;
use crate::error::CoreError;

pub(crate) type CachedValue = Arc<dyn Any + Send + Sync>;

/// Lifecycle of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum QueryStatus {
    /// No fetch has completed yet.
    Pending,
    /// The last fetch succeeded.
    Success,
    /// The last fetch failed; any earlier value is retained.
    Error,
}

/// Per-read options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    /// How long a successful fetch stays fresh. `Duration::ZERO` means
    /// every read refetches.
    pub stale_after: Duration,
}

impl QueryOptions {
    pub const fn stale_after(stale_after: Duration) -> Self {
        Self { stale_after }
    }
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self::stale_after(crate::config::LIST_STALE_AFTER)
    }
}

#[derive(Clone)]
pub(crate) struct EntryState {
    pub value: Option<CachedValue>,
    pub status: QueryStatus,
    pub error: Option<CoreError>,
    pub fetched_at: Option<Instant>,
    pub stale_after: Duration,
    pub invalidated: bool,
    pub is_fetching: bool,
}

impl EntryState {
    pub fn new(stale_after: Duration) -> Self {
        Self {
            value: None,
            status: QueryStatus::Pending,
            error: None,
            fetched_at: None,
            stale_after,
            invalidated: false,
            is_fetching: false,
        }
    }

    /// Absent, invalidated, or older than `stale_after`.
    pub fn is_stale(&self) -> bool {
        if self.invalidated {
            return true;
        }
        self.fetched_at
            .is_none_or(|at| at.elapsed() >= self.stale_after)
    }

    pub fn typed<V: Send + Sync + 'static>(&self, key: &QueryKey) -> QueryState<V> {
        let value = self.value.clone().and_then(|v| match v.downcast::<V>() {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(%key, "cached value has an unexpected type, ignoring");
                None
            }
        });

        QueryState {
            value,
            status: self.status,
            error: self.error.clone(),
            fetched_at: self.fetched_at,
            is_fetching: self.is_fetching,
            is_stale: self.is_stale(),
        }
    }
}

/// What a view observes for one key.
#[derive(Debug, Clone)]
pub struct QueryState<V> {
    pub value: Option<Arc<V>>,
    pub status: QueryStatus,
    pub error: Option<CoreError>,
    pub fetched_at: Option<Instant>,
    /// A fetch for this key is in flight.
    pub is_fetching: bool,
    /// The next read will refetch.
    pub is_stale: bool,
}

impl<V> QueryState<V> {
    /// No fetch has completed yet.
    pub fn is_pending(&self) -> bool {
        self.status == QueryStatus::Pending
    }

    pub fn is_success(&self) -> bool {
        self.status == QueryStatus::Success
    }

    pub fn is_error(&self) -> bool {
        self.status == QueryStatus::Error
    }
}

// ── Per-key subscription ─────────────────────────────────────────────

/// Subscription to a single cache key.
///
/// Mirrors the store streams: `current()` for the latest state,
/// `changed()` to wait for the next transition.
pub struct QueryWatch<V> {
    key: QueryKey,
    receiver: watch::Receiver<EntryState>,
    _marker: PhantomData<fn() -> V>,
}

impl<V: Send + Sync + 'static> QueryWatch<V> {
    pub(crate) fn new(key: QueryKey, receiver: watch::Receiver<EntryState>) -> Self {
        Self {
            key,
            receiver,
            _marker: PhantomData,
        }
    }

    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    pub fn current(&self) -> QueryState<V> {
        self.receiver.borrow().typed(&self.key)
    }

    /// Wait for the next state transition.
    /// Returns `None` once the entry has been removed from the cache.
    pub async fn changed(&mut self) -> Option<QueryState<V>> {
        self.receiver.changed().await.ok()?;
        let state = self.receiver.borrow_and_update().typed(&self.key);
        Some(state)
    }
}
