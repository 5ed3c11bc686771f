//! Codec-aware view over the blob store
//!
//! Reads never fail: a store error or a corrupt envelope is logged and
//! reported as a miss. Writes return the store error so callers decide
//! whether to swallow it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tidepool_domain::{CacheEntry, EntryMetadata, ResourceIdentity, StoreError};
use tracing::{debug, warn};

use super::codec;
use super::ports::BlobStore;

#[derive(Clone)]
pub struct NamedCacheStore {
    blobs: Arc<dyn BlobStore>,
}

impl NamedCacheStore {
    pub fn new(blobs: Arc<dyn BlobStore>) -> Self {
        Self { blobs }
    }

    /// Read and decode an entry; any failure is a miss
    pub async fn read(&self, cache: &str, identity: &ResourceIdentity) -> Option<CacheEntry> {
        let bytes = match self.blobs.get(cache, identity.as_str()).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(err) => {
                warn!(cache, key = %identity, error = %err, "Store read failed; treating as miss");
                return None;
            }
        };

        match codec::decode(identity.as_str(), &bytes) {
            Ok((metadata, payload)) => Some(CacheEntry::new(identity.clone(), payload, metadata)),
            Err(err) => {
                warn!(cache, key = %identity, error = %err, "Undecodable entry; treating as miss");
                None
            }
        }
    }

    /// Stamp and write a payload
    ///
    /// # Errors
    ///
    /// Returns the store error if encoding or the write fails.
    pub async fn write(
        &self,
        cache: &str,
        identity: &ResourceIdentity,
        payload: &[u8],
        cached_at: DateTime<Utc>,
        version: &str,
    ) -> Result<(), StoreError> {
        let metadata = EntryMetadata::stamped(cached_at, version);
        let bytes = codec::encode(identity.as_str(), &metadata, payload)?;
        self.blobs.put(cache, identity.as_str(), bytes).await?;
        debug!(cache, key = %identity, version, "Entry written");
        Ok(())
    }

    /// Read only the metadata of `key`
    ///
    /// `Ok(None)` when the key vanished; a corrupt envelope yields empty
    /// metadata so it is treated as unstamped.
    pub async fn read_metadata(
        &self,
        cache: &str,
        key: &str,
    ) -> Result<Option<EntryMetadata>, StoreError> {
        let Some(bytes) = self.blobs.get(cache, key).await? else {
            return Ok(None);
        };
        Ok(Some(codec::decode_metadata(key, &bytes).unwrap_or_default()))
    }

    /// Read the raw stored size of `key`
    pub async fn stored_len(&self, cache: &str, key: &str) -> Result<Option<u64>, StoreError> {
        Ok(self.blobs.get(cache, key).await?.map(|bytes| bytes.len() as u64))
    }

    pub async fn keys(&self, cache: &str) -> Result<Vec<String>, StoreError> {
        self.blobs.list(cache).await
    }

    pub async fn delete(&self, cache: &str, key: &str) -> Result<bool, StoreError> {
        self.blobs.delete(cache, key).await
    }

    pub async fn clear(&self, cache: &str) -> Result<usize, StoreError> {
        self.blobs.clear(cache).await
    }
}

impl std::fmt::Debug for NamedCacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamedCacheStore").finish_non_exhaustive()
    }
}
