//! Query cache storage.
//!
//! Holds the last value returned for each [`QueryKey`] plus its staleness.
//! Uses LRU eviction with a configurable limit. All multi-entry changes go
//! through a [`CacheWriter`], which holds the write lock for its whole life.

use std::sync::RwLock;

use lru::LruCache;
use metrics::counter;
use serde_json::Value;
use time::OffsetDateTime;
use tokio::sync::broadcast;
use tracing::debug;

use super::config::CacheConfig;
use super::effects::{KeyMatch, Updater};
use super::events::{CacheEvent, CacheNotifier, EventKind};
use super::keys::QueryKey;
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::store";

const METRIC_CACHE_HIT: &str = "storefront_cache_hit_total";
const METRIC_CACHE_MISS: &str = "storefront_cache_miss_total";
const METRIC_CACHE_EVICT: &str = "storefront_cache_evict_total";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Fresh,
    /// Served until the next read refetches it.
    Stale,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub value: Value,
    pub state: EntryState,
    pub updated_at: OffsetDateTime,
}

impl CacheEntry {
    fn fresh(value: Value) -> Self {
        Self {
            value,
            state: EntryState::Fresh,
            updated_at: OffsetDateTime::now_utc(),
        }
    }

    pub fn is_fresh(&self) -> bool {
        self.state == EntryState::Fresh
    }
}

/// Process-local query cache.
pub struct QueryCache {
    entries: RwLock<LruCache<QueryKey, CacheEntry>>,
    notifier: CacheNotifier,
}

impl QueryCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: RwLock::new(LruCache::new(config.max_entries_non_zero())),
            notifier: CacheNotifier::new(config.event_capacity_non_zero()),
        }
    }

    /// Look up an entry, marking it most recently used.
    pub fn get(&self, key: &QueryKey) -> Option<CacheEntry> {
        let entry = rw_write(&self.entries, SOURCE, "get").get(key).cloned();
        match entry {
            Some(_) => counter!(METRIC_CACHE_HIT).increment(1),
            None => counter!(METRIC_CACHE_MISS).increment(1),
        }
        entry
    }

    /// Look up an entry without touching recency or metrics.
    pub fn peek(&self, key: &QueryKey) -> Option<CacheEntry> {
        rw_read(&self.entries, SOURCE, "peek").peek(key).cloned()
    }

    /// Store a fresh value.
    pub fn set(&self, key: QueryKey, value: Value) {
        let mut writer = self.write();
        writer.update(key, &Updater::replace(value));
        writer.commit();
    }

    pub fn invalidate(&self, target: &KeyMatch) -> usize {
        let mut writer = self.write();
        let count = writer.invalidate(target);
        writer.commit();
        count
    }

    pub fn remove(&self, target: &KeyMatch) -> usize {
        let mut writer = self.write();
        let count = writer.remove(target);
        writer.commit();
        count
    }

    /// Drop every entry.
    pub fn clear(&self) {
        rw_write(&self.entries, SOURCE, "clear").clear();
        self.notifier.publish(EventKind::Cleared);
    }

    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of all keys, most recently used first.
    pub fn keys(&self) -> Vec<QueryKey> {
        rw_read(&self.entries, SOURCE, "keys")
            .iter()
            .map(|(key, _)| key.clone())
            .collect()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.notifier.subscribe()
    }

    /// Take the write lock for a batch of changes.
    pub fn write(&self) -> CacheWriter<'_> {
        CacheWriter {
            entries: rw_write(&self.entries, SOURCE, "write"),
            notifier: &self.notifier,
            pending: Vec::new(),
        }
    }
}

/// Exclusive access to the cache for a batch of changes.
///
/// Events are buffered and published by [`CacheWriter::commit`] after the
/// lock is released. Dropping a writer without committing keeps the changes
/// but publishes nothing.
pub struct CacheWriter<'a> {
    entries: std::sync::RwLockWriteGuard<'a, LruCache<QueryKey, CacheEntry>>,
    notifier: &'a CacheNotifier,
    pending: Vec<EventKind>,
}

impl CacheWriter<'_> {
    /// Apply `updater` to `key`. Returns false when the updater declined.
    pub fn update(&mut self, key: QueryKey, updater: &Updater) -> bool {
        let Some(value) = updater.apply(self.entries.peek(&key).map(|entry| &entry.value)) else {
            debug!(key = %key, "Cache update skipped: updater declined");
            return false;
        };

        if key.path().has_missing_id() {
            debug!(key = %key, "Caching key with a missing identifier");
        }
        let displaced = self.entries.push(key.clone(), CacheEntry::fresh(value));
        if let Some((evicted, _)) = displaced.filter(|(displaced, _)| *displaced != key) {
            counter!(METRIC_CACHE_EVICT).increment(1);
            debug!(key = %evicted, "Cache entry evicted");
            self.pending.push(EventKind::Removed { key: evicted });
        }
        self.pending.push(EventKind::Updated { key });
        true
    }

    /// Mark matching entries stale. Absent entries are never created.
    pub fn invalidate(&mut self, target: &KeyMatch) -> usize {
        let mut count = 0;
        for (key, entry) in self.entries.iter_mut() {
            if target.matches(key) {
                entry.state = EntryState::Stale;
                self.pending.push(EventKind::Invalidated { key: key.clone() });
                count += 1;
            }
        }
        count
    }

    /// Delete matching entries.
    pub fn remove(&mut self, target: &KeyMatch) -> usize {
        let doomed: Vec<QueryKey> = self
            .entries
            .iter()
            .filter(|(key, _)| target.matches(key))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &doomed {
            self.entries.pop(key);
        }
        let count = doomed.len();
        self.pending
            .extend(doomed.into_iter().map(|key| EventKind::Removed { key }));
        count
    }

    /// Release the lock, then publish buffered events.
    pub fn commit(self) {
        let CacheWriter {
            entries,
            notifier,
            pending,
        } = self;
        drop(entries);
        for kind in pending {
            notifier.publish(kind);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use serde_json::json;

    use super::*;
    use crate::cache::keys::KeyPath;
    use crate::params::Params;

    fn basket_path(id: &str) -> KeyPath {
        KeyPath::root().literal("/baskets/").id(Some(id))
    }

    fn key(path: KeyPath, locale: &str) -> QueryKey {
        QueryKey::new(path, Params::new().with("locale", locale))
    }

    #[test]
    fn set_then_get_returns_fresh_entry() {
        let cache = QueryCache::new(&CacheConfig::default());
        let key = key(basket_path("B1"), "en-US");

        assert!(cache.get(&key).is_none());
        cache.set(key.clone(), json!({"basketId": "B1"}));

        let entry = cache.get(&key).expect("cached entry");
        assert!(entry.is_fresh());
        assert_eq!(entry.value, json!({"basketId": "B1"}));
    }

    #[test]
    fn invalidate_marks_stale_without_creating() {
        let cache = QueryCache::new(&CacheConfig::default());
        let cached = key(basket_path("B1"), "en-US");
        let absent = key(basket_path("B2"), "en-US");
        cache.set(cached.clone(), json!({}));

        assert_eq!(cache.invalidate(&KeyMatch::Exact(cached.clone())), 1);
        assert_eq!(cache.invalidate(&KeyMatch::Exact(absent.clone())), 0);

        assert_eq!(cache.peek(&cached).map(|e| e.state), Some(EntryState::Stale));
        assert!(cache.peek(&absent).is_none());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn prefix_remove_purges_subtree_only() {
        let cache = QueryCache::new(&CacheConfig::default());
        let b1 = basket_path("B1");
        cache.set(key(b1.clone(), "en-US"), json!(1));
        cache.set(key(b1.clone(), "fr-FR"), json!(2));
        cache.set(key(b1.clone().literal("/taxes"), "en-US"), json!(3));
        cache.set(key(basket_path("B2"), "en-US"), json!(4));

        assert_eq!(cache.remove(&KeyMatch::Prefix(b1)), 3);
        assert_eq!(cache.len(), 1);
        assert!(cache.peek(&key(basket_path("B2"), "en-US")).is_some());
    }

    #[test]
    fn lru_eviction_drops_oldest() {
        let cache = QueryCache::new(&CacheConfig {
            max_entries: 2,
            ..Default::default()
        });
        let k1 = key(basket_path("B1"), "en-US");
        let k2 = key(basket_path("B2"), "en-US");
        let k3 = key(basket_path("B3"), "en-US");

        cache.set(k1.clone(), json!(1));
        cache.set(k2.clone(), json!(2));
        cache.set(k3.clone(), json!(3));

        assert!(cache.peek(&k1).is_none());
        assert!(cache.peek(&k2).is_some());
        assert!(cache.peek(&k3).is_some());
    }

    #[tokio::test]
    async fn commit_publishes_after_release() {
        let cache = QueryCache::new(&CacheConfig::default());
        let mut events = cache.subscribe();
        let key = key(basket_path("B1"), "en-US");

        let mut writer = cache.write();
        writer.update(key.clone(), &Updater::replace(json!(1)));
        writer.invalidate(&KeyMatch::Exact(key.clone()));
        writer.commit();

        let first = events.recv().await.expect("update event");
        let second = events.recv().await.expect("invalidate event");
        assert_eq!(first.kind, EventKind::Updated { key: key.clone() });
        assert_eq!(second.kind, EventKind::Invalidated { key });
    }

    #[test]
    fn clear_empties_cache() {
        let cache = QueryCache::new(&CacheConfig::default());
        cache.set(key(basket_path("B1"), "en-US"), json!(1));
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn store_recovers_from_poisoned_lock() {
        let cache = QueryCache::new(&CacheConfig::default());

        let _ = catch_unwind(AssertUnwindSafe(|| {
            let _guard = cache.entries.write().expect("entries lock should be acquired");
            panic!("poison entries lock");
        }));

        cache.set(key(basket_path("B1"), "en-US"), json!(1));
        assert_eq!(cache.len(), 1);
    }
}
