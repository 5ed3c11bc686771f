use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use parking_lot::Mutex;
use tidepool_core::cache::codec;
use tidepool_core::BlobStore;
use tidepool_domain::{EntryMetadata, StoreError};

/// In-memory `BlobStore` that counts every access.
///
/// Keys enumerate in sorted order. `set_unavailable(true)` makes every call
/// fail with `StoreError::Unavailable`; `fail_reads_of` breaks `get` for a
/// single key.
#[derive(Default)]
pub struct CountingStore {
    data: Mutex<BTreeMap<String, BTreeMap<String, Vec<u8>>>>,
    gets: AtomicUsize,
    puts: AtomicUsize,
    deletes: AtomicUsize,
    lists: AtomicUsize,
    unavailable: AtomicBool,
    unreadable: Mutex<BTreeSet<(String, String)>>,
}

impl CountingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Make every `get` of `key` in `cache` fail with `StoreError::Io`
    pub fn fail_reads_of(&self, cache: &str, key: &str) {
        self.unreadable.lock().insert((cache.to_string(), key.to_string()));
    }

    /// Total calls of any kind
    pub fn accesses(&self) -> usize {
        self.gets() + self.puts() + self.deletes() + self.lists.load(Ordering::SeqCst)
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn deletes(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    /// Seed a stamped entry without going through the engine
    pub fn seed(&self, cache: &str, key: &str, payload: &[u8], cached_at: i64, version: &str) {
        let stamp = Utc.timestamp_opt(cached_at, 0).unwrap();
        self.seed_with(cache, key, payload, EntryMetadata::stamped(stamp, version));
    }

    pub fn seed_with(&self, cache: &str, key: &str, payload: &[u8], metadata: EntryMetadata) {
        let bytes = codec::encode(key, &metadata, payload).unwrap();
        self.seed_raw(cache, key, bytes);
    }

    pub fn seed_raw(&self, cache: &str, key: &str, bytes: Vec<u8>) {
        self.data.lock().entry(cache.to_string()).or_default().insert(key.to_string(), bytes);
    }

    /// Drop a key behind the engine's back, like host storage pressure would
    pub fn evict_externally(&self, cache: &str, key: &str) {
        if let Some(entries) = self.data.lock().get_mut(cache) {
            entries.remove(key);
        }
    }

    pub fn keys_of(&self, cache: &str) -> Vec<String> {
        self.data.lock().get(cache).map(|e| e.keys().cloned().collect()).unwrap_or_default()
    }

    pub fn contains(&self, cache: &str, key: &str) -> bool {
        self.data.lock().get(cache).is_some_and(|e| e.contains_key(key))
    }

    /// Decoded metadata and payload of a stored entry
    pub fn entry(&self, cache: &str, key: &str) -> Option<(EntryMetadata, Vec<u8>)> {
        let bytes = self.data.lock().get(cache)?.get(key)?.clone();
        codec::decode(key, &bytes).ok()
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("simulated outage".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl BlobStore for CountingStore {
    async fn get(&self, cache: &str, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        if self.unreadable.lock().contains(&(cache.to_string(), key.to_string())) {
            return Err(StoreError::Io(format!("unreadable entry '{key}'")));
        }
        Ok(self.data.lock().get(cache).and_then(|e| e.get(key).cloned()))
    }

    async fn put(&self, cache: &str, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.seed_raw(cache, key, value);
        Ok(())
    }

    async fn delete(&self, cache: &str, key: &str) -> Result<bool, StoreError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.data.lock().get_mut(cache).is_some_and(|e| e.remove(key).is_some()))
    }

    async fn list(&self, cache: &str) -> Result<Vec<String>, StoreError> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.keys_of(cache))
    }
}
