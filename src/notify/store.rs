//! In-memory notification store with broadcast observation

use super::types::{Notification, NotificationKind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tracing::debug;

/// Default broadcast channel capacity
const DEFAULT_CAPACITY: usize = 256;

/// Change events broadcast to observers (e.g. a render layer)
#[derive(Debug, Clone)]
pub enum StoreEvent {
    Added(Notification),
    Removed(u64),
}

/// Ordered queue of transient user-facing messages
///
/// Insertion order is preserved. Cloning shares the same underlying list
/// and broadcast channel. Observation is fire-and-forget: with no
/// subscribers, events are silently dropped.
#[derive(Clone)]
pub struct NotificationStore {
    entries: Arc<Mutex<Vec<Notification>>>,
    next_id: Arc<AtomicU64>,
    sender: broadcast::Sender<StoreEvent>,
}

impl NotificationStore {
    /// Create a new store with the given broadcast capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
            next_id: Arc::new(AtomicU64::new(1)),
            sender,
        }
    }

    /// Add a notification; always succeeds and returns the assigned id
    pub fn add(
        &self,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let notification = Notification::new(id, kind, title, message);
        debug!(id, kind = ?notification.kind, title = %notification.title, "notification added");
        self.entries
            .lock()
            .expect("notification list lock poisoned")
            .push(notification.clone());
        self.emit(StoreEvent::Added(notification));
        id
    }

    /// Add a success notification
    pub fn success(&self, title: impl Into<String>, message: impl Into<String>) -> u64 {
        self.add(NotificationKind::Success, title, message)
    }

    /// Add an error notification
    pub fn error(&self, title: impl Into<String>, message: impl Into<String>) -> u64 {
        self.add(NotificationKind::Error, title, message)
    }

    /// Add a warning notification
    pub fn warning(&self, title: impl Into<String>, message: impl Into<String>) -> u64 {
        self.add(NotificationKind::Warning, title, message)
    }

    /// Add an info notification
    pub fn info(&self, title: impl Into<String>, message: impl Into<String>) -> u64 {
        self.add(NotificationKind::Info, title, message)
    }

    /// Remove a notification by id. Idempotent: unknown ids are a no-op.
    ///
    /// Returns true when an entry was actually removed.
    pub fn remove(&self, id: u64) -> bool {
        let removed = {
            let mut entries = self
                .entries
                .lock()
                .expect("notification list lock poisoned");
            let before = entries.len();
            entries.retain(|n| n.id != id);
            entries.len() < before
        };
        if removed {
            debug!(id, "notification removed");
            self.emit(StoreEvent::Removed(id));
        }
        removed
    }

    /// Snapshot of the current list, in insertion order
    pub fn snapshot(&self) -> Vec<Notification> {
        self.entries
            .lock()
            .expect("notification list lock poisoned")
            .clone()
    }

    /// Number of live notifications
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .expect("notification list lock poisoned")
            .len()
    }

    /// True when no notifications are live
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Subscribe to store changes (for a render layer)
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.sender.subscribe()
    }

    /// Number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    fn emit(&self, event: StoreEvent) {
        // No subscribers is expected and fine
        let _ = self.sender.send(event);
    }
}

impl Default for NotificationStore {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
