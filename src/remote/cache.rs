//! Keyed cache of fetched pages with prefix invalidation

use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

/// Concurrent map of cache keys to serialized payloads
///
/// Keys follow the form `<collection>:<canonical filters>:page=<n>:per=<m>`.
/// Invalidation works on the collection prefix so one mutation can clear
/// every cached page of a collection at once.
#[derive(Debug, Clone, Default)]
pub struct PageCache {
    entries: Arc<DashMap<String, serde_json::Value>>,
}

impl PageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a cached payload
    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    /// Store a payload under a key, replacing any previous value
    pub fn insert(&self, key: impl Into<String>, value: serde_json::Value) {
        self.entries.insert(key.into(), value);
    }

    /// Remove a single entry
    pub fn remove(&self, key: &str) {
        self.entries.remove(key);
    }

    /// Drop every entry whose key is `prefix` or starts with `prefix:`
    ///
    /// Returns the number of entries removed. The next read of any removed
    /// key refetches instead of reusing stored data.
    pub fn invalidate_prefix(&self, prefix: &str) -> usize {
        let qualified = format!("{prefix}:");
        // Counted inside retain: the map is shared across clones, so a
        // before/after length diff could race with concurrent inserts
        let mut removed = 0;
        self.entries.retain(|key, _| {
            let keep = key != prefix && !key.starts_with(&qualified);
            if !keep {
                removed += 1;
            }
            keep
        });
        if removed > 0 {
            debug!(prefix = %prefix, removed, "cache entries invalidated");
        }
        removed
    }

    /// Drop everything
    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_insert_and_get() {
        let cache = PageCache::new();
        cache.insert("agents:page=1", json!({"items": []}));
        assert_eq!(cache.get("agents:page=1"), Some(json!({"items": []})));
        assert!(cache.get("agents:page=2").is_none());
    }

    #[test]
    fn test_invalidate_prefix_only_hits_that_collection() {
        let cache = PageCache::new();
        cache.insert("agents:status=active:page=1", json!(1));
        cache.insert("agents:status=active:page=2", json!(2));
        cache.insert("properties:page=1", json!(3));

        let removed = cache.invalidate_prefix("agents");
        assert_eq!(removed, 2);
        assert!(cache.get("agents:status=active:page=1").is_none());
        assert_eq!(cache.get("properties:page=1"), Some(json!(3)));
    }

    #[test]
    fn test_invalidate_prefix_does_not_match_partial_names() {
        let cache = PageCache::new();
        cache.insert("agents:page=1", json!(1));
        cache.insert("agents_archive:page=1", json!(2));

        let removed = cache.invalidate_prefix("agents");
        assert_eq!(removed, 1);
        assert!(cache.get("agents_archive:page=1").is_some());
    }

    #[test]
    fn test_invalidate_exact_key_prefix() {
        let cache = PageCache::new();
        cache.insert("agents", json!(1));
        assert_eq!(cache.invalidate_prefix("agents"), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_invalidate_count_is_matches_removed_not_length_delta() {
        let cache = PageCache::new();
        let writer = cache.clone();
        cache.insert("agents:page=1", json!(1));
        cache.insert("agents:page=2", json!(2));
        // Unrelated writes through a clone must not distort the count
        writer.insert("properties:page=1", json!(3));
        writer.insert("buyers:page=1", json!(4));

        assert_eq!(cache.invalidate_prefix("agents"), 2);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.invalidate_prefix("agents"), 0);
    }

    #[test]
    fn test_clone_shares_entries() {
        let cache = PageCache::new();
        let clone = cache.clone();
        cache.insert("k", json!(true));
        assert_eq!(clone.len(), 1);
    }
}
