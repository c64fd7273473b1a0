//! Cache change notifications.
//!
//! Every state change of an entry is broadcast so that observers can re-read
//! or refetch the queries they watch.

use std::sync::atomic::{AtomicU64, Ordering};

use time::OffsetDateTime;
use tokio::sync::broadcast;
use tracing::trace;
use uuid::Uuid;

use super::keys::QueryKey;

/// Monotonic epoch for ordering events within this process.
pub type Epoch = u64;

#[derive(Debug, Clone)]
pub struct CacheEvent {
    /// Unique identifier (UUIDv4).
    pub id: Uuid,
    pub epoch: Epoch,
    pub kind: EventKind,
    pub timestamp: OffsetDateTime,
}

impl CacheEvent {
    pub fn new(kind: EventKind, epoch: Epoch) -> Self {
        Self {
            id: Uuid::new_v4(),
            epoch,
            kind,
            timestamp: OffsetDateTime::now_utc(),
        }
    }

    /// Whether this event concerns `key`.
    pub fn affects(&self, key: &QueryKey) -> bool {
        match &self.kind {
            EventKind::Updated { key: changed }
            | EventKind::Invalidated { key: changed }
            | EventKind::Removed { key: changed } => changed == key,
            EventKind::Cleared => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// A value was written (read-through or `update` effect).
    Updated { key: QueryKey },
    /// An entry was marked stale.
    Invalidated { key: QueryKey },
    /// An entry was deleted, explicitly or by eviction.
    Removed { key: QueryKey },
    /// The whole cache was torn down.
    Cleared,
}

/// Broadcast fan-out of cache events.
pub struct CacheNotifier {
    sender: broadcast::Sender<CacheEvent>,
    epoch_counter: AtomicU64,
}

impl CacheNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            epoch_counter: AtomicU64::new(0),
        }
    }

    pub fn next_epoch(&self) -> Epoch {
        self.epoch_counter.fetch_add(1, Ordering::SeqCst)
    }

    /// Publish an event. Having no subscribers is not an error.
    pub fn publish(&self, kind: EventKind) {
        let event = CacheEvent::new(kind, self.next_epoch());
        trace!(
            event_id = %event.id,
            event_epoch = event.epoch,
            event_kind = ?event.kind,
            "Cache event published"
        );
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::keys::KeyPath;
    use crate::params::Params;

    fn key(id: &str) -> QueryKey {
        QueryKey::new(KeyPath::root().id(Some(id)), Params::new())
    }

    #[test]
    fn epoch_monotonicity() {
        let notifier = CacheNotifier::new(4);
        let e1 = notifier.next_epoch();
        let e2 = notifier.next_epoch();
        assert!(e1 < e2);
    }

    #[test]
    fn publish_without_subscribers_is_no_op() {
        let notifier = CacheNotifier::new(4);
        notifier.publish(EventKind::Cleared);
        assert_eq!(notifier.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn subscribers_receive_events_in_order() {
        let notifier = CacheNotifier::new(4);
        let mut receiver = notifier.subscribe();

        notifier.publish(EventKind::Updated { key: key("a") });
        notifier.publish(EventKind::Removed { key: key("a") });

        let first = receiver.recv().await.expect("first event");
        let second = receiver.recv().await.expect("second event");
        assert!(matches!(first.kind, EventKind::Updated { .. }));
        assert!(matches!(second.kind, EventKind::Removed { .. }));
        assert!(first.epoch < second.epoch);
    }

    #[test]
    fn affects_matches_exact_key_or_clear() {
        let event = CacheEvent::new(EventKind::Invalidated { key: key("a") }, 0);
        assert!(event.affects(&key("a")));
        assert!(!event.affects(&key("b")));
        assert!(CacheEvent::new(EventKind::Cleared, 1).affects(&key("b")));
    }
}
