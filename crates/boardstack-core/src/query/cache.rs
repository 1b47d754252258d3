// ── Keyed query cache ──
//
// Concurrent map of cache entries. Each entry owns a `watch` channel for
// per-key observers and at most one shared in-flight fetch. A cache-wide
// `broadcast` channel announces every key whose state changed.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use dashmap::DashMap;
use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use tokio::sync::{broadcast, watch};
use tokio::time::Instant;
use tracing::{debug, warn};

use super::key::QueryKey;
use super::state::{CachedValue, EntryState, QueryOptions, QueryState, QueryStatus, QueryWatch};
use crate::error::CoreError;

type FetchResult = Result<CachedValue, CoreError>;
type SharedFetch = Shared<BoxFuture<'static, FetchResult>>;

const CHANGE_CHANNEL_CAPACITY: usize = 256;

struct Slot {
    state: watch::Sender<EntryState>,
    in_flight: Option<SharedFetch>,
    /// Unique per slot; a slot recreated after `remove`/`clear` never
    /// shares an epoch with the one it replaced.
    epoch: u64,
    /// Bumped by every invalidation; a fetch that started under an older
    /// generation leaves the entry stale when it lands.
    generation: u64,
}

impl Slot {
    fn new(epoch: u64, options: &QueryOptions) -> Self {
        let (state, _) = watch::channel(EntryState::new(options.stale_after));
        Self {
            state,
            in_flight: None,
            epoch,
            generation: 0,
        }
    }
}

struct Inner {
    slots: DashMap<QueryKey, Slot>,
    changes: broadcast::Sender<QueryKey>,
    next_epoch: AtomicU64,
}

impl Inner {
    fn new_slot(&self, options: &QueryOptions) -> Slot {
        Slot::new(self.next_epoch.fetch_add(1, Ordering::Relaxed), options)
    }
}

/// Client-side cache of server resources.
///
/// Cheap to clone; all clones share the same entries. Reads coalesce per
/// key, writes go through [`QueryCache::mutate`] and invalidate by prefix.
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<Inner>,
}

impl QueryCache {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                slots: DashMap::new(),
                changes,
                next_epoch: AtomicU64::new(0),
            }),
        }
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Current state for `key`, starting `fetcher` in the background when
    /// the entry is absent or stale and no fetch is already in flight.
    pub fn read<V, F, Fut>(&self, key: QueryKey, options: QueryOptions, fetcher: F) -> QueryState<V>
    where
        V: Send + Sync + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, CoreError>> + Send + 'static,
    {
        self.begin(&key, options, fetcher);
        self.state(&key)
            .unwrap_or_else(|| EntryState::new(options.stale_after).typed(&key))
    }

    /// Awaiting form of [`QueryCache::read`]: a fresh cached value is
    /// returned without a request, otherwise the caller joins the single
    /// in-flight fetch for `key`.
    pub async fn fetch<V, F, Fut>(
        &self,
        key: QueryKey,
        options: QueryOptions,
        fetcher: F,
    ) -> Result<Arc<V>, CoreError>
    where
        V: Send + Sync + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, CoreError>> + Send + 'static,
    {
        let value = match self.begin(&key, options, fetcher) {
            Some(in_flight) => in_flight.await?,
            None => self
                .inner
                .slots
                .get(&key)
                .and_then(|slot| slot.state.borrow().value.clone())
                .ok_or_else(|| CoreError::Internal(format!("no cached value for {key}")))?,
        };

        value
            .downcast::<V>()
            .map_err(|_| CoreError::Internal(format!("cached value for {key} has an unexpected type")))
    }

    /// Typed snapshot of an entry, without triggering a fetch.
    pub fn state<V: Send + Sync + 'static>(&self, key: &QueryKey) -> Option<QueryState<V>> {
        let slot = self.inner.slots.get(key)?;
        let state = slot.state.borrow().typed(key);
        Some(state)
    }

    /// Ensure a fetch is running when the entry needs one.
    ///
    /// Returns the in-flight fetch (existing or newly started), or `None`
    /// when the cached value is fresh.
    fn begin<V, F, Fut>(&self, key: &QueryKey, options: QueryOptions, fetcher: F) -> Option<SharedFetch>
    where
        V: Send + Sync + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, CoreError>> + Send + 'static,
    {
        let mut slot = self
            .inner
            .slots
            .entry(key.clone())
            .or_insert_with(|| self.inner.new_slot(&options));

        if let Some(in_flight) = &slot.in_flight {
            debug!(%key, "joining in-flight fetch");
            return Some(in_flight.clone());
        }

        slot.state.send_if_modified(|s| {
            let changed = s.stale_after != options.stale_after;
            s.stale_after = options.stale_after;
            changed
        });

        if !slot.state.borrow().is_stale() {
            return None;
        }

        let origin = FetchOrigin {
            epoch: slot.epoch,
            generation: slot.generation,
        };
        let fetch = run_fetch(Arc::downgrade(&self.inner), key.clone(), origin, fetcher)
            .boxed()
            .shared();
        slot.in_flight = Some(fetch.clone());
        slot.state.send_modify(|s| s.is_fetching = true);
        drop(slot);

        debug!(%key, "fetch started");
        self.announce(key);

        // A driver task owns progress so the fetch completes even if every
        // awaiting caller goes away.
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(fetch.clone().map(drop));
            }
            Err(_) => warn!(%key, "no tokio runtime; fetch only progresses while awaited"),
        }

        Some(fetch)
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Run a write. On success every prefix returned by `invalidates` is
    /// invalidated; on failure nothing is touched and the error returned.
    /// Cached values are never edited locally.
    pub async fn mutate<T, Fut, I>(&self, operation: Fut, invalidates: I) -> Result<T, CoreError>
    where
        Fut: Future<Output = Result<T, CoreError>>,
        I: FnOnce(&T) -> Vec<QueryKey>,
    {
        let value = operation.await?;
        for prefix in invalidates(&value) {
            self.invalidate(&prefix);
        }
        Ok(value)
    }

    /// Mark every entry matching `prefix` stale, keeping its value.
    /// Returns the number of entries matched.
    pub fn invalidate(&self, prefix: &QueryKey) -> usize {
        let mut touched = Vec::new();
        for mut slot in self.inner.slots.iter_mut() {
            if !slot.key().matches(prefix) {
                continue;
            }
            let key = slot.key().clone();
            let slot = slot.value_mut();
            slot.generation += 1;
            slot.state.send_modify(|s| s.invalidated = true);
            touched.push(key);
        }

        debug!(%prefix, count = touched.len(), "invalidated");
        for key in &touched {
            self.announce(key);
        }
        touched.len()
    }

    /// Drop every entry matching `prefix`. Observers of removed entries
    /// see their subscription end.
    pub fn remove(&self, prefix: &QueryKey) -> usize {
        let keys: Vec<QueryKey> = self
            .inner
            .slots
            .iter()
            .filter(|slot| slot.key().matches(prefix))
            .map(|slot| slot.key().clone())
            .collect();
        for key in &keys {
            self.inner.slots.remove(key);
            self.announce(key);
        }
        keys.len()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        let keys: Vec<QueryKey> = self.inner.slots.iter().map(|s| s.key().clone()).collect();
        self.inner.slots.clear();
        for key in &keys {
            self.announce(key);
        }
    }

    // ── Observation ──────────────────────────────────────────────────

    /// Observe one key. Creates an empty entry if none exists yet.
    pub fn subscribe<V: Send + Sync + 'static>(&self, key: QueryKey) -> QueryWatch<V> {
        let receiver = self
            .inner
            .slots
            .entry(key.clone())
            .or_insert_with(|| {
                self.inner
                    .new_slot(&QueryOptions::stale_after(std::time::Duration::ZERO))
            })
            .state
            .subscribe();
        QueryWatch::new(key, receiver)
    }

    /// Observe every state transition in the cache, as the changed key.
    pub fn subscribe_changes(&self) -> broadcast::Receiver<QueryKey> {
        self.inner.changes.subscribe()
    }

    pub fn len(&self) -> usize {
        self.inner.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.slots.is_empty()
    }

    pub fn keys(&self) -> Vec<QueryKey> {
        self.inner.slots.iter().map(|s| s.key().clone()).collect()
    }

    fn announce(&self, key: &QueryKey) {
        // No receivers is fine.
        let _ = self.inner.changes.send(key.clone());
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

/// The slot a fetch was started for, and its generation at that time.
#[derive(Debug, Clone, Copy)]
struct FetchOrigin {
    epoch: u64,
    generation: u64,
}

/// Run `fetcher` and record its outcome in the entry it was started for.
///
/// Holds only a weak reference: if the cache is gone, or the entry was
/// removed (even if the key has been read again since), the result is
/// returned to any awaiting caller and otherwise discarded.
async fn run_fetch<V, F, Fut>(
    inner: Weak<Inner>,
    key: QueryKey,
    origin: FetchOrigin,
    fetcher: F,
) -> FetchResult
where
    V: Send + Sync + 'static,
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<V, CoreError>> + Send + 'static,
{
    let result: FetchResult = fetcher().await.map(|v| Arc::new(v) as CachedValue);

    let Some(inner) = inner.upgrade() else {
        debug!(%key, "cache dropped, discarding fetch result");
        return result;
    };

    let slot = inner
        .slots
        .get_mut(&key)
        .filter(|slot| slot.epoch == origin.epoch);
    if let Some(mut slot) = slot {
        slot.in_flight = None;
        let invalidated_meanwhile = slot.generation != origin.generation;
        slot.state.send_modify(|s| {
            s.is_fetching = false;
            match &result {
                Ok(value) => {
                    s.value = Some(Arc::clone(value));
                    s.error = None;
                    s.status = QueryStatus::Success;
                    s.fetched_at = Some(Instant::now());
                    s.invalidated = invalidated_meanwhile;
                }
                Err(err) => {
                    // Stale-while-error: the previous value stays.
                    s.status = QueryStatus::Error;
                    s.error = Some(err.clone());
                }
            }
        });
    } else {
        debug!(%key, "entry removed while fetching, discarding result");
    }

    match &result {
        Ok(_) => debug!(%key, "fetch succeeded"),
        Err(e) => warn!(%key, error = %e, "fetch failed"),
    }
    let _ = inner.changes.send(key);
    result
}
