// ── Notification store ──
//
// Process-scoped list of transient user-facing messages. Each entry owns a
// cancelable expiry timer; removing an entry (or dropping the store)
// aborts the timer.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::AbortHandle;
use tracing::{debug, warn};

use crate::config::NOTIFICATION_TTL;

/// Severity of a notification.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
    Warning,
    Info,
}

/// Unique notification id (uuid v4).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(String);

impl NotificationId {
    fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub kind: NotificationKind,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

struct Entry {
    notification: Notification,
    expiry: Option<AbortHandle>,
}

struct Inner {
    entries: Mutex<IndexMap<NotificationId, Entry>>,
    snapshot: watch::Sender<Arc<Vec<Notification>>>,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, IndexMap<NotificationId, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publish the current list. Must be called with the lock held so
    /// snapshots are sent in mutation order.
    fn publish(&self, entries: &IndexMap<NotificationId, Entry>) {
        let list: Vec<Notification> = entries.values().map(|e| e.notification.clone()).collect();
        self.snapshot.send_replace(Arc::new(list));
    }

    fn remove(&self, id: &NotificationId) -> bool {
        let mut entries = self.lock();
        let Some(entry) = entries.shift_remove(id) else {
            return false;
        };
        if let Some(timer) = entry.expiry {
            timer.abort();
        }
        self.publish(&entries);
        true
    }
}

/// Store of transient notifications.
///
/// Clones share the same list. Dropping the last clone aborts every
/// pending expiry timer.
#[derive(Clone)]
pub struct NotificationStore {
    inner: Arc<Inner>,
    ttl: Duration,
}

impl NotificationStore {
    pub fn new() -> Self {
        Self::with_ttl(NOTIFICATION_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            inner: Arc::new(Inner {
                entries: Mutex::new(IndexMap::new()),
                snapshot,
            }),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Append a notification and schedule its removal after the TTL.
    pub fn add(&self, kind: NotificationKind, message: impl Into<String>) {
        let notification = Notification {
            id: NotificationId::generate(),
            kind,
            message: message.into(),
            created_at: Utc::now(),
        };
        debug!(id = %notification.id, %kind, "notification added");

        let mut entries = self.inner.lock();
        let expiry = self.schedule_expiry(notification.id.clone());
        entries.insert(
            notification.id.clone(),
            Entry {
                notification,
                expiry,
            },
        );
        self.inner.publish(&entries);
    }

    pub fn success(&self, message: impl Into<String>) {
        self.add(NotificationKind::Success, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.add(NotificationKind::Error, message);
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.add(NotificationKind::Warning, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.add(NotificationKind::Info, message);
    }

    /// Remove one notification. Unknown ids are a no-op.
    pub fn remove(&self, id: &NotificationId) -> bool {
        self.inner.remove(id)
    }

    /// Remove everything and cancel every pending timer.
    pub fn clear(&self) {
        let mut entries = self.inner.lock();
        for (_, entry) in entries.drain(..) {
            if let Some(timer) = entry.expiry {
                timer.abort();
            }
        }
        self.inner.publish(&entries);
    }

    pub fn snapshot(&self) -> Arc<Vec<Notification>> {
        self.inner.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<Vec<Notification>>> {
        self.inner.snapshot.subscribe()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn schedule_expiry(&self, id: NotificationId) -> Option<AbortHandle> {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!(%id, "no tokio runtime; notification will not auto-expire");
            return None;
        };

        let inner: Weak<Inner> = Arc::downgrade(&self.inner);
        let ttl = self.ttl;
        let task = handle.spawn(async move {
            tokio::time::sleep(ttl).await;
            if let Some(inner) = inner.upgrade() {
                if inner.remove(&id) {
                    debug!(%id, "notification expired");
                }
            }
        });
        Some(task.abort_handle())
    }
}

impl Default for NotificationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let entries = self.entries.get_mut().unwrap_or_else(PoisonError::into_inner);
        for entry in entries.values() {
            if let Some(timer) = &entry.expiry {
                timer.abort();
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn messages(store: &NotificationStore) -> Vec<String> {
        store.snapshot().iter().map(|n| n.message.clone()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn notification_expires_after_ttl() {
        let store = NotificationStore::new();
        store.success("Post created");
        assert_eq!(store.len(), 1);

        tokio::time::sleep(Duration::from_millis(4_900)).await;
        assert_eq!(store.len(), 1);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn ids_are_unique_and_order_is_preserved() {
        let store = NotificationStore::new();
        store.info("A");
        store.info("A");
        store.error("B");

        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 3);
        assert_ne!(snapshot[0].id, snapshot[1].id);
        assert_eq!(messages(&store), vec!["A", "A", "B"]);
        assert_eq!(snapshot[2].kind, NotificationKind::Error);
    }

    #[tokio::test(start_paused = true)]
    async fn remove_is_idempotent_and_cancels_timer() {
        let store = NotificationStore::new();
        store.warning("careful");
        let id = store.snapshot()[0].id.clone();

        assert!(store.remove(&id));
        assert!(!store.remove(&id));

        store.info("later");
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn staggered_adds_expire_independently() {
        let store = NotificationStore::new();
        store.info("first");
        tokio::time::sleep(Duration::from_secs(3)).await;
        store.info("second");

        tokio::time::sleep(Duration::from_millis(2_100)).await;
        assert_eq!(messages(&store), vec!["second"]);

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn clear_removes_everything() {
        let store = NotificationStore::new();
        store.info("one");
        store.info("two");
        store.clear();
        assert!(store.is_empty());

        // nothing left to fire
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn subscribers_see_every_change() {
        let store = NotificationStore::with_ttl(Duration::from_secs(1));
        let mut rx = store.subscribe();

        store.error("Failed to create post: boom");
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().len(), 1);

        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_empty());
    }

    #[test]
    fn add_outside_runtime_still_records() {
        let store = NotificationStore::new();
        store.info("no runtime");
        assert_eq!(messages(&store), vec!["no runtime"]);
    }

    #[test]
    fn kind_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&NotificationKind::Warning).unwrap(),
            "\"warning\""
        );
        assert_eq!(NotificationKind::Success.to_string(), "success");
    }
}
