//! Process-local blob store

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use tidepool_core::BlobStore;
use tidepool_domain::StoreError;

/// In-memory `BlobStore`; contents vanish with the process.
///
/// Keys list in sorted order.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    caches: RwLock<HashMap<String, BTreeMap<String, Vec<u8>>>>,
    outage: AtomicBool,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// While set, every operation fails with [`StoreError::Unavailable`]
    pub fn simulate_outage(&self, down: bool) {
        self.outage.store(down, Ordering::SeqCst);
    }

    /// Drop `key` without going through the engine, like the host reclaiming
    /// storage would
    pub fn evict_externally(&self, cache: &str, key: &str) -> bool {
        self.caches.write().get_mut(cache).is_some_and(|entries| entries.remove(key).is_some())
    }

    /// Number of keys currently held for `cache`
    pub fn entry_count(&self, cache: &str) -> usize {
        self.caches.read().get(cache).map_or(0, BTreeMap::len)
    }

    fn ensure_available(&self) -> Result<(), StoreError> {
        if self.outage.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store outage".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn get(&self, cache: &str, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.ensure_available()?;
        Ok(self.caches.read().get(cache).and_then(|entries| entries.get(key).cloned()))
    }

    async fn put(&self, cache: &str, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        self.ensure_available()?;
        self.caches.write().entry(cache.to_string()).or_default().insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, cache: &str, key: &str) -> Result<bool, StoreError> {
        self.ensure_available()?;
        Ok(self.evict_externally(cache, key))
    }

    async fn list(&self, cache: &str) -> Result<Vec<String>, StoreError> {
        self.ensure_available()?;
        Ok(self
            .caches
            .read()
            .get(cache)
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn clear(&self, cache: &str) -> Result<usize, StoreError> {
        self.ensure_available()?;
        Ok(self.caches.write().remove(cache).map_or(0, |entries| entries.len()))
    }
}
