//! Size-bounded eviction
//!
//! Runs after every write to a named cache. Metadata for every key is read in
//! one pass, keys are stable-sorted by `cached_at` ascending and the oldest
//! `count - max_entries` are deleted. Unstamped entries sort first, so they go
//! before anything with a timestamp. Ties keep enumeration order.

use chrono::{DateTime, Utc};
use tidepool_domain::StoreError;
use tracing::{debug, warn};

use super::store::NamedCacheStore;

/// Keys to delete so that at most `max_entries` remain, oldest first
pub fn plan_eviction(
    mut entries: Vec<(String, Option<DateTime<Utc>>)>,
    max_entries: usize,
) -> Vec<String> {
    if entries.len() <= max_entries {
        return Vec::new();
    }

    let excess = entries.len() - max_entries;
    entries.sort_by_key(|(_, cached_at)| *cached_at);
    entries.into_iter().take(excess).map(|(key, _)| key).collect()
}

#[derive(Debug, Clone)]
pub struct EvictionManager {
    store: NamedCacheStore,
}

impl EvictionManager {
    pub fn new(store: NamedCacheStore) -> Self {
        Self { store }
    }

    /// Enforce `max_entries` on `cache`; returns how many entries were removed
    ///
    /// Keys that vanish between listing and reading are skipped. A key whose
    /// metadata cannot be read counts as unstamped, so it is evicted first.
    ///
    /// # Errors
    ///
    /// Returns the store error if the cache cannot be listed.
    /// Individual read and delete failures are logged and skipped.
    pub async fn enforce(&self, cache: &str, max_entries: usize) -> Result<usize, StoreError> {
        let keys = self.store.keys(cache).await?;
        if keys.len() <= max_entries {
            return Ok(0);
        }

        let mut entries = Vec::with_capacity(keys.len());
        for key in keys {
            match self.store.read_metadata(cache, &key).await {
                Ok(Some(metadata)) => entries.push((key, metadata.cached_at)),
                Ok(None) => {}
                Err(err) => {
                    warn!(cache, key = %key, error = %err, "Eviction metadata read failed");
                    entries.push((key, None));
                }
            }
        }

        let mut removed = 0;
        for key in plan_eviction(entries, max_entries) {
            match self.store.delete(cache, &key).await {
                Ok(true) => {
                    debug!(cache, key = %key, "Evicted entry");
                    removed += 1;
                }
                Ok(false) => {}
                Err(err) => warn!(cache, key = %key, error = %err, "Eviction delete failed"),
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for cache::eviction.
    use chrono::TimeZone;

    use super::*;

    fn at(secs: i64) -> Option<DateTime<Utc>> {
        Some(Utc.timestamp_opt(secs, 0).unwrap())
    }

    /// Validates oldest-first planning.
    ///
    /// Assertions:
    /// - Ensures entries stamped 10 and 20 are evicted when 30 and 40 fit.
    #[test]
    fn test_plan_removes_oldest() {
        let entries = vec![
            ("c".to_string(), at(30)),
            ("a".to_string(), at(10)),
            ("d".to_string(), at(40)),
            ("b".to_string(), at(20)),
        ];
        assert_eq!(plan_eviction(entries, 2), ["a", "b"]);
    }

    #[test]
    fn test_plan_within_bound_is_empty() {
        let entries = vec![("a".to_string(), at(10)), ("b".to_string(), at(20))];
        assert!(plan_eviction(entries, 2).is_empty());
        assert!(plan_eviction(Vec::new(), 1).is_empty());
    }

    #[test]
    fn test_plan_evicts_unstamped_first() {
        let entries =
            vec![("old".to_string(), at(10)), ("raw".to_string(), None), ("new".to_string(), at(20))];
        assert_eq!(plan_eviction(entries, 2), ["raw"]);
    }

    #[test]
    fn test_plan_ties_keep_enumeration_order() {
        let entries = vec![
            ("x".to_string(), at(10)),
            ("y".to_string(), at(10)),
            ("z".to_string(), at(10)),
        ];
        assert_eq!(plan_eviction(entries, 1), ["x", "y"]);
    }
}
