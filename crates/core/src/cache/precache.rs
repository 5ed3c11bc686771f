//! Precache and warm loading
//!
//! Both paths are best-effort: a failing item is logged and skipped, the rest
//! still load. Loaded entries go through the ordinary write path, so they
//! take part in eviction and freshness like any other entry.

use tidepool_common::time::race_deadline;
use tidepool_domain::constants::DEFAULT_WARM_LIMIT;
use tidepool_domain::{CacheError, PrecacheAsset, PrecacheReport};
use tracing::{debug, info, instrument, warn};

use super::engine::CacheEngine;

impl CacheEngine {
    /// Fetch every asset and store it tagged with its expected version
    #[instrument(skip(self, assets), fields(assets = assets.len()))]
    pub async fn precache(&self, assets: &[PrecacheAsset]) -> PrecacheReport {
        let mut report = PrecacheReport::default();

        for asset in assets {
            let config = match self.inner.registry.get(&asset.cache) {
                Ok(config) => config,
                Err(err) => {
                    warn!(key = %asset.identity, error = %err, "Precache skipped asset");
                    report.failed.push(asset.identity.clone());
                    continue;
                }
            };

            let payload = match self.fetch_network(&asset.identity, config.network_timeout()).await {
                Ok(payload) => payload,
                Err(err) => {
                    warn!(
                        cache = %asset.cache,
                        key = %asset.identity,
                        error = %err,
                        "Precache fetch failed"
                    );
                    report.failed.push(asset.identity.clone());
                    continue;
                }
            };

            let stored = self
                .write_through(
                    &asset.cache,
                    &asset.expected_version,
                    config.max_entries,
                    &asset.identity,
                    &payload,
                )
                .await;

            if stored.is_some() {
                report.succeeded += 1;
            } else {
                report.failed.push(asset.identity.clone());
            }
        }

        info!(succeeded = report.succeeded, failed = report.failed.len(), "Precache completed");
        report
    }

    /// Load the recent working set of `scope_id`
    ///
    /// Returns how many entries were written. Without a configured
    /// working-set source this is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::NetworkFailure`] or [`CacheError::NetworkTimeout`]
    /// if the working set itself cannot be listed. Listing is bounded by the
    /// longest network timeout of any named cache.
    pub async fn warm(&self, scope_id: &str) -> Result<usize, CacheError> {
        self.warm_with_limit(scope_id, DEFAULT_WARM_LIMIT).await
    }

    /// Like [`warm`](Self::warm) with an explicit bound on the working set
    ///
    /// # Errors
    ///
    /// See [`warm`](Self::warm).
    #[instrument(skip(self))]
    pub async fn warm_with_limit(&self, scope_id: &str, limit: usize) -> Result<usize, CacheError> {
        let Some(source) = &self.inner.working_set else {
            debug!("No working-set source configured; nothing to warm");
            return Ok(0);
        };

        let deadline = self.inner.registry.longest_network_timeout();
        let items = race_deadline(source.recent(scope_id, limit), deadline)
            .await
            .into_result(|elapsed| CacheError::NetworkTimeout {
                key: scope_id.to_string(),
                seconds: elapsed.as_secs(),
            })?
            .map_err(|err| CacheError::from_fetch(scope_id, err))?;

        let mut written = 0;
        for item in items.into_iter().take(limit) {
            let config = match self.inner.registry.get(&item.cache) {
                Ok(config) => config,
                Err(err) => {
                    warn!(key = %item.identity, error = %err, "Warm skipped item");
                    continue;
                }
            };

            match self.fetch_network(&item.identity, config.network_timeout()).await {
                Ok(payload) => {
                    let stored = self
                        .write_through(
                            &item.cache,
                            &config.version,
                            config.max_entries,
                            &item.identity,
                            &payload,
                        )
                        .await;
                    if stored.is_some() {
                        written += 1;
                    }
                }
                Err(err) => {
                    warn!(cache = %item.cache, key = %item.identity, error = %err, "Warm fetch failed");
                }
            }
        }

        info!(written, "Warm completed");
        Ok(written)
    }
}
