//! Strategy executors
//!
//! Each strategy answers one retrieval request by composing the store view,
//! the freshness evaluator and a deadline-bounded network fetch. Successful
//! network results are written back (stamp, write, evict) except under
//! `NetworkOnly`.
//!
//! There is no per-key single-flight: concurrent requests for the same key
//! may each hit the network, and the last write wins.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tidepool_common::time::{race_deadline, DeadlineOutcome};
use tidepool_domain::{
    CacheConfig, CacheEntry, CacheError, CachedResponse, ResourceIdentity, ResponseSource,
};
use tracing::{debug, warn};

use super::engine::CacheEngine;

impl CacheEngine {
    /// Serve a fresh cached copy without touching the network; otherwise
    /// fetch, falling back to any cached copy if the network fails
    pub(crate) async fn cache_first(
        &self,
        cache: &str,
        config: &CacheConfig,
        identity: &ResourceIdentity,
    ) -> Result<CachedResponse, CacheError> {
        let cached = self.inner.store.read(cache, identity).await;

        if let Some(entry) = &cached {
            if self.inner.freshness.is_fresh(entry, config.max_age()) {
                self.inner.metrics.record_hit();
                debug!(cache, key = %identity, "Fresh cache hit");
                return Ok(CachedResponse::from_entry(entry.clone(), ResponseSource::Cache));
            }
        }
        self.inner.metrics.record_miss();

        match self.fetch_network(identity, config.network_timeout()).await {
            Ok(payload) => Ok(self.respond_from_network(cache, config, identity, payload).await),
            Err(err) => self.stale_fallback(cache, identity, cached, err),
        }
    }

    /// Always try the network first; fall back to any cached copy
    pub(crate) async fn network_first(
        &self,
        cache: &str,
        config: &CacheConfig,
        identity: &ResourceIdentity,
    ) -> Result<CachedResponse, CacheError> {
        match self.fetch_network(identity, config.network_timeout()).await {
            Ok(payload) => Ok(self.respond_from_network(cache, config, identity, payload).await),
            Err(err) => {
                let cached = self.inner.store.read(cache, identity).await;
                self.stale_fallback(cache, identity, cached, err)
            }
        }
    }

    /// Return any cached copy immediately and refresh it in the background
    ///
    /// Only waits on the network when nothing is cached.
    pub(crate) async fn stale_while_revalidate(
        &self,
        cache: &str,
        config: &CacheConfig,
        identity: &ResourceIdentity,
    ) -> Result<CachedResponse, CacheError> {
        if let Some(entry) = self.inner.store.read(cache, identity).await {
            let source = if self.inner.freshness.is_fresh(&entry, config.max_age()) {
                self.inner.metrics.record_hit();
                ResponseSource::Cache
            } else {
                self.inner.metrics.record_miss();
                ResponseSource::StaleCache
            };

            self.spawn_revalidation(cache, config, identity);
            return Ok(CachedResponse::from_entry(entry, source));
        }

        self.inner.metrics.record_miss();
        let payload = self.fetch_network(identity, config.network_timeout()).await?;
        Ok(self.respond_from_network(cache, config, identity, payload).await)
    }

    /// Fetch without reading or writing the cache; errors surface verbatim
    pub(crate) async fn network_only(
        &self,
        config: &CacheConfig,
        identity: &ResourceIdentity,
    ) -> Result<CachedResponse, CacheError> {
        let payload = self.fetch_network(identity, config.network_timeout()).await?;
        Ok(CachedResponse::network(payload, None))
    }

    /// Serve whatever is cached, fresh or not, without any network attempt
    pub(crate) async fn cache_only(
        &self,
        cache: &str,
        config: &CacheConfig,
        identity: &ResourceIdentity,
    ) -> Result<CachedResponse, CacheError> {
        let Some(entry) = self.inner.store.read(cache, identity).await else {
            self.inner.metrics.record_miss();
            return Err(CacheError::CacheMiss {
                cache: cache.to_string(),
                key: identity.to_string(),
            });
        };

        self.inner.metrics.record_hit();
        let source = if self.inner.freshness.is_fresh(&entry, config.max_age()) {
            ResponseSource::Cache
        } else {
            ResponseSource::StaleCache
        };
        Ok(CachedResponse::from_entry(entry, source))
    }

    /// Race the fetcher against `limit`
    ///
    /// A fetch that loses the race is dropped; whether the transport stops
    /// work at that point is up to the transport.
    pub(crate) async fn fetch_network(
        &self,
        identity: &ResourceIdentity,
        limit: Duration,
    ) -> Result<Vec<u8>, CacheError> {
        self.inner.metrics.record_network_fetch();

        let result = match race_deadline(self.inner.fetcher.fetch(identity), limit).await {
            DeadlineOutcome::Completed(result) => {
                result.map_err(|err| CacheError::from_fetch(identity.as_str(), err))
            }
            DeadlineOutcome::Elapsed(limit) => Err(CacheError::NetworkTimeout {
                key: identity.to_string(),
                seconds: limit.as_secs(),
            }),
        };

        if let Err(err) = &result {
            self.inner.metrics.record_network_failure();
            debug!(key = %identity, error = %err, "Network fetch failed");
        }
        result
    }

    /// Stamp, write and evict
    ///
    /// Store failures are logged and swallowed; the caller still gets the
    /// payload. Returns the stamp when the write landed.
    pub(crate) async fn write_through(
        &self,
        cache: &str,
        version: &str,
        max_entries: usize,
        identity: &ResourceIdentity,
        payload: &[u8],
    ) -> Option<DateTime<Utc>> {
        let cached_at = self.inner.freshness.now();

        if let Err(err) = self.inner.store.write(cache, identity, payload, cached_at, version).await {
            warn!(cache, key = %identity, error = %err, "Write-through failed; payload not persisted");
            return None;
        }
        self.inner.metrics.record_write();

        match self.inner.eviction.enforce(cache, max_entries).await {
            Ok(0) => {}
            Ok(evicted) => {
                self.inner.metrics.record_evictions(evicted);
                debug!(cache, evicted, max_entries, "Eviction enforced size bound");
            }
            Err(err) => warn!(cache, error = %err, "Eviction failed"),
        }

        Some(cached_at)
    }

    async fn respond_from_network(
        &self,
        cache: &str,
        config: &CacheConfig,
        identity: &ResourceIdentity,
        payload: Vec<u8>,
    ) -> CachedResponse {
        let cached_at = self
            .write_through(cache, &config.version, config.max_entries, identity, &payload)
            .await;
        CachedResponse::network(payload, cached_at)
    }

    fn stale_fallback(
        &self,
        cache: &str,
        identity: &ResourceIdentity,
        cached: Option<CacheEntry>,
        err: CacheError,
    ) -> Result<CachedResponse, CacheError> {
        match cached {
            Some(entry) => {
                self.inner.metrics.record_stale_fallback();
                warn!(cache, key = %identity, error = %err, "Network failed; serving cached copy");
                Ok(CachedResponse::from_entry(entry, ResponseSource::StaleCache))
            }
            None => Err(err),
        }
    }

    fn spawn_revalidation(&self, cache: &str, config: &CacheConfig, identity: &ResourceIdentity) {
        let engine = self.clone();
        let cache = cache.to_string();
        let config = config.clone();
        let identity = identity.clone();

        self.inner.background.spawn(async move {
            match engine.fetch_network(&identity, config.network_timeout()).await {
                Ok(payload) => {
                    engine
                        .write_through(&cache, &config.version, config.max_entries, &identity, &payload)
                        .await;
                    engine.inner.metrics.record_revalidation(true);
                    debug!(cache = %cache, key = %identity, "Background revalidation stored");
                }
                Err(err) => {
                    engine.inner.metrics.record_revalidation(false);
                    warn!(
                        cache = %cache,
                        key = %identity,
                        error = %err,
                        "Background revalidation failed; cached entry kept"
                    );
                }
            }
        });
    }
}
