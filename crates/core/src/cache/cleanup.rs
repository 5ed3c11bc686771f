//! Cleanup sweeps
//!
//! Two independent, idempotent sweeps over every registered named cache:
//!
//! - **Version sweep**: removes entries whose `version` differs from the
//!   cache's live version (unstamped entries included). A cache that held
//!   only old-version data ends up empty.
//! - **Expiry sweep**: removes entries that are no longer fresh.
//!
//! Both are safe to run concurrently with reads. Strategies check freshness
//! per entry anyway, so the sweeps only bound storage growth.

use std::sync::Arc;
use std::time::Instant;

use tidepool_domain::{CacheError, CleanupReport};
use tracing::{debug, info, instrument};

use super::freshness::FreshnessEvaluator;
use super::registry::NamedCacheRegistry;
use super::store::NamedCacheStore;

#[derive(Debug, Clone)]
pub struct CleanupSweeper {
    store: NamedCacheStore,
    registry: Arc<NamedCacheRegistry>,
    freshness: FreshnessEvaluator,
}

impl CleanupSweeper {
    pub fn new(
        store: NamedCacheStore,
        registry: Arc<NamedCacheRegistry>,
        freshness: FreshnessEvaluator,
    ) -> Self {
        Self { store, registry, freshness }
    }

    /// Remove every entry not written under its cache's live version
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::StoreUnavailable`] if the store fails.
    #[instrument(skip(self))]
    pub async fn version_sweep(&self) -> Result<CleanupReport, CacheError> {
        let mut report = CleanupReport::default();

        for (cache, config) in self.registry.iter() {
            let mut purged = 0;
            for key in self.store.keys(cache).await? {
                let Some(metadata) = self.store.read_metadata(cache, &key).await? else {
                    continue;
                };
                if !metadata.matches_version(&config.version) && self.store.delete(cache, &key).await?
                {
                    purged += 1;
                }
            }

            if purged > 0 {
                info!(cache, version = %config.version, purged, "Purged old-version entries");
                report.purged_caches.push(cache.to_string());
                report.version_purged += purged;
            }
        }

        Ok(report)
    }

    /// Remove every entry older than its cache's max age
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::StoreUnavailable`] if the store fails.
    #[instrument(skip(self))]
    pub async fn expiry_sweep(&self) -> Result<CleanupReport, CacheError> {
        let mut report = CleanupReport::default();

        for (cache, config) in self.registry.iter() {
            for key in self.store.keys(cache).await? {
                let Some(metadata) = self.store.read_metadata(cache, &key).await? else {
                    continue;
                };
                if !self.freshness.is_metadata_fresh(&metadata, config.max_age())
                    && self.store.delete(cache, &key).await?
                {
                    debug!(cache, key = %key, "Expired entry removed");
                    report.expired += 1;
                }
            }
        }

        Ok(report)
    }

    /// Run the version sweep then the expiry sweep
    ///
    /// # Errors
    ///
    /// Returns the first sweep error.
    #[instrument(skip(self))]
    pub async fn cleanup_once(&self) -> Result<CleanupReport, CacheError> {
        let start = Instant::now();

        let report = self.version_sweep().await?.merge(self.expiry_sweep().await?);

        info!(
            purged_caches = report.purged_caches.len(),
            version_purged = report.version_purged,
            expired = report.expired,
            duration_secs = start.elapsed().as_secs_f64(),
            "Cleanup completed"
        );

        Ok(report)
    }
}
