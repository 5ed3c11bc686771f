//! Port interfaces for the caching engine
//!
//! These traits define the boundaries between the engine and the outside
//! world: a byte-oriented blob store, the network, and the source of a user's
//! recent working set.

use async_trait::async_trait;
use tidepool_domain::{FetchError, ResourceIdentity, StoreError, WarmItem};

/// Byte store partitioned by named cache
///
/// Implementations may lose entries at any time (host storage pressure). The
/// engine treats absence as a normal miss, so `get` returns `Ok(None)` rather
/// than an error for missing keys.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Read the raw bytes stored under `key`
    async fn get(&self, cache: &str, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Store `value` under `key`, replacing any previous value
    async fn put(&self, cache: &str, key: &str, value: Vec<u8>) -> Result<(), StoreError>;

    /// Remove `key`; returns whether something was removed
    async fn delete(&self, cache: &str, key: &str) -> Result<bool, StoreError>;

    /// Enumerate the keys of a named cache
    async fn list(&self, cache: &str) -> Result<Vec<String>, StoreError>;

    /// Remove every key of a named cache; returns how many were removed
    async fn clear(&self, cache: &str) -> Result<usize, StoreError> {
        let mut removed = 0;
        for key in self.list(cache).await? {
            if self.delete(cache, &key).await? {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

/// Network transport
///
/// May be slow or never settle; the engine bounds every call with the named
/// cache's `network_timeout_seconds`.
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    /// Fetch the current payload of `identity`
    async fn fetch(&self, identity: &ResourceIdentity) -> Result<Vec<u8>, FetchError>;
}

/// Source of the resources a user touched most recently
#[async_trait]
pub trait WorkingSetSource: Send + Sync {
    /// Up to `limit` recent items for `scope_id`, most recent first
    async fn recent(&self, scope_id: &str, limit: usize) -> Result<Vec<WarmItem>, FetchError>;
}
