//! Cache engine facade
//!
//! [`CacheEngine`] is an explicitly constructed instance holding the named
//! cache registry and the collaborators. Cloning is cheap (shared inner), so
//! detached background revalidations own their handle on the engine.
//!
//! # Lifecycle
//!
//! ```rust,ignore
//! let engine = CacheEngine::builder()
//!     .store(store)
//!     .fetcher(fetcher)
//!     .config(EngineConfig::default())
//!     .build()?;
//!
//! engine.init().await?;        // startup sweeps + periodic scheduler
//! let response = engine
//!     .fetch(&"/api/patients/42".into(), "clinical", Strategy::StaleWhileRevalidate)
//!     .await?;
//! engine.shutdown().await?;    // stop scheduler, drain revalidations
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tidepool_common::error::{CommonError, CommonResult};
use tidepool_common::time::{Clock, SystemClock};
use tidepool_domain::constants::BACKGROUND_DRAIN_TIMEOUT_SECS;
use tidepool_domain::{
    CacheError, CachedResponse, CleanupReport, CleanupSettings, EngineConfig, EngineStats,
    NamedCacheStats, ResourceIdentity, Strategy,
};
use tokio::sync::Mutex;
use tokio_util::task::TaskTracker;
use tracing::{info, instrument, warn};

use super::cleanup::CleanupSweeper;
use super::eviction::EvictionManager;
use super::freshness::FreshnessEvaluator;
use super::invalidation::{invalidate_matching, InvalidationMatcher};
use super::metrics::EngineMetrics;
use super::ports::{BlobStore, ResourceFetcher, WorkingSetSource};
use super::registry::NamedCacheRegistry;
use super::scheduler::{CleanupScheduler, SchedulerConfig};
use super::store::NamedCacheStore;

/// Strategy used by `fetch_default` when a cache names none
const FALLBACK_STRATEGY: Strategy = Strategy::NetworkFirst;

pub(crate) struct EngineInner {
    pub(crate) registry: Arc<NamedCacheRegistry>,
    pub(crate) store: NamedCacheStore,
    pub(crate) fetcher: Arc<dyn ResourceFetcher>,
    pub(crate) working_set: Option<Arc<dyn WorkingSetSource>>,
    pub(crate) freshness: FreshnessEvaluator,
    pub(crate) eviction: EvictionManager,
    pub(crate) sweeper: Arc<CleanupSweeper>,
    pub(crate) metrics: EngineMetrics,
    pub(crate) background: TaskTracker,
    cleanup: CleanupSettings,
    scheduler: Mutex<Option<CleanupScheduler>>,
    initialized: AtomicBool,
}

/// Multi-strategy resource cache
#[derive(Clone)]
pub struct CacheEngine {
    pub(crate) inner: Arc<EngineInner>,
}

impl CacheEngine {
    pub fn builder() -> CacheEngineBuilder {
        CacheEngineBuilder::default()
    }

    /// Retrieve `identity` from the named cache `cache` using `strategy`
    ///
    /// # Errors
    ///
    /// - [`CacheError::UnknownCache`] if `cache` is not registered
    /// - [`CacheError::NetworkTimeout`] / [`CacheError::NetworkFailure`] when
    ///   the network fails and the strategy has nothing to fall back to
    /// - [`CacheError::CacheMiss`] for `CacheOnly` with nothing cached
    pub async fn fetch(
        &self,
        identity: &ResourceIdentity,
        cache: &str,
        strategy: Strategy,
    ) -> Result<CachedResponse, CacheError> {
        let config = self.inner.registry.get(cache)?;

        match strategy {
            Strategy::CacheFirst => self.cache_first(cache, config, identity).await,
            Strategy::NetworkFirst => self.network_first(cache, config, identity).await,
            Strategy::StaleWhileRevalidate => {
                self.stale_while_revalidate(cache, config, identity).await
            }
            Strategy::NetworkOnly => self.network_only(config, identity).await,
            Strategy::CacheOnly => self.cache_only(cache, config, identity).await,
        }
    }

    /// Retrieve using the cache's configured default strategy
    ///
    /// Caches without a default use `NetworkFirst`.
    ///
    /// # Errors
    ///
    /// See [`fetch`](Self::fetch).
    pub async fn fetch_default(
        &self,
        identity: &ResourceIdentity,
        cache: &str,
    ) -> Result<CachedResponse, CacheError> {
        let strategy = self.inner.registry.get(cache)?.default_strategy.unwrap_or(FALLBACK_STRATEGY);
        self.fetch(identity, cache, strategy).await
    }

    /// Delete every entry matching `matcher` across all named caches
    ///
    /// Returns the number of entries removed; repeating the call is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::StoreUnavailable`] if the store fails.
    pub async fn invalidate(&self, matcher: &InvalidationMatcher) -> Result<usize, CacheError> {
        let removed = invalidate_matching(&self.inner.store, &self.inner.registry, matcher).await?;
        self.inner.metrics.record_invalidations(removed);
        Ok(removed)
    }

    /// Delete everything cached for `entity_id`
    ///
    /// Called by record stores when their own data for the entity changes.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::StoreUnavailable`] if the store fails.
    pub async fn invalidate_for_entity(&self, entity_id: &str) -> Result<usize, CacheError> {
        self.invalidate(&InvalidationMatcher::for_entity(entity_id)).await
    }

    /// Drop the whole content of one named cache
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::UnknownCache`] or [`CacheError::StoreUnavailable`].
    pub async fn invalidate_cache(&self, cache: &str) -> Result<usize, CacheError> {
        self.inner.registry.get(cache)?;
        let removed = self.inner.store.clear(cache).await?;
        self.inner.metrics.record_invalidations(removed);
        info!(cache, removed, "Named cache cleared");
        Ok(removed)
    }

    /// # Errors
    ///
    /// Returns [`CacheError::StoreUnavailable`] if the store fails.
    pub async fn run_version_sweep(&self) -> Result<CleanupReport, CacheError> {
        self.inner.sweeper.version_sweep().await
    }

    /// # Errors
    ///
    /// Returns [`CacheError::StoreUnavailable`] if the store fails.
    pub async fn run_expiry_sweep(&self) -> Result<CleanupReport, CacheError> {
        self.inner.sweeper.expiry_sweep().await
    }

    /// Run the version sweep, then the expiry sweep
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::StoreUnavailable`] if the store fails.
    pub async fn run_cleanup(&self) -> Result<CleanupReport, CacheError> {
        self.inner.sweeper.cleanup_once().await
    }

    /// Per-cache entry count and stored bytes, plus engine counters
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::StoreUnavailable`] if the store fails.
    pub async fn get_stats(&self) -> Result<EngineStats, CacheError> {
        let mut stats = EngineStats { metrics: self.inner.metrics.snapshot(), ..Default::default() };

        for cache in self.inner.registry.names() {
            let mut footprint = NamedCacheStats::default();
            for key in self.inner.store.keys(cache).await? {
                if let Some(len) = self.inner.store.stored_len(cache, &key).await? {
                    footprint.count += 1;
                    footprint.total_bytes += len;
                }
            }
            stats.caches.insert(cache.to_string(), footprint);
        }

        Ok(stats)
    }

    /// Run the startup sweeps and start the periodic scheduler
    ///
    /// A failing startup sweep is logged, not fatal.
    ///
    /// # Errors
    ///
    /// Returns error if the engine is already initialized or the scheduler
    /// cannot start.
    #[instrument(skip(self))]
    pub async fn init(&self) -> CommonResult<()> {
        if self.inner.initialized.swap(true, Ordering::SeqCst) {
            return Err(CommonError::config("Cache engine already initialized"));
        }

        if self.inner.cleanup.run_on_startup {
            match self.run_cleanup().await {
                Ok(report) => info!(removed = report.total_removed(), "Startup cleanup completed"),
                Err(err) => warn!(error = %err, "Startup cleanup failed"),
            }
        }

        if let Some(secs) = self.inner.cleanup.interval_seconds {
            let config = SchedulerConfig::new(Duration::from_secs(secs))
                .with_jitter(self.inner.cleanup.jitter);
            let mut scheduler = CleanupScheduler::new(Arc::clone(&self.inner.sweeper), config);
            if let Err(err) = scheduler.start().await {
                self.inner.initialized.store(false, Ordering::SeqCst);
                return Err(err);
            }
            *self.inner.scheduler.lock().await = Some(scheduler);
        }

        info!(caches = self.inner.registry.len(), "Cache engine initialized");
        Ok(())
    }

    /// Stop the scheduler and wait (bounded) for background revalidations
    ///
    /// Safe to call without `init`; then it only drains background work.
    ///
    /// # Errors
    ///
    /// Returns error if the scheduler fails to stop or background work does
    /// not finish within the drain timeout.
    #[instrument(skip(self))]
    pub async fn shutdown(&self) -> CommonResult<()> {
        let scheduler = self.inner.scheduler.lock().await.take();
        if let Some(mut scheduler) = scheduler {
            if scheduler.is_running().await {
                scheduler.stop().await?;
            }
        }
        self.inner.initialized.store(false, Ordering::SeqCst);

        let limit = Duration::from_secs(BACKGROUND_DRAIN_TIMEOUT_SECS);
        self.inner.background.close();
        let drained = tokio::time::timeout(limit, self.inner.background.wait()).await;
        self.inner.background.reopen();

        if drained.is_err() {
            warn!(pending = self.inner.background.len(), "Background revalidations still running");
            return Err(CommonError::timeout("background_revalidation", limit));
        }

        info!("Cache engine shut down");
        Ok(())
    }

    /// Whether the periodic scheduler is running
    pub async fn is_scheduler_running(&self) -> bool {
        match self.inner.scheduler.lock().await.as_ref() {
            Some(scheduler) => scheduler.is_running().await,
            None => false,
        }
    }

    /// Background revalidations currently in flight
    pub fn pending_background_tasks(&self) -> usize {
        self.inner.background.len()
    }

    pub fn metrics(&self) -> &EngineMetrics {
        &self.inner.metrics
    }

    pub fn registry(&self) -> &NamedCacheRegistry {
        &self.inner.registry
    }
}

impl std::fmt::Debug for CacheEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheEngine")
            .field("caches", &self.inner.registry.names().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// Builder for [`CacheEngine`]
#[derive(Default)]
pub struct CacheEngineBuilder {
    store: Option<Arc<dyn BlobStore>>,
    fetcher: Option<Arc<dyn ResourceFetcher>>,
    clock: Option<Arc<dyn Clock>>,
    working_set: Option<Arc<dyn WorkingSetSource>>,
    config: Option<EngineConfig>,
}

impl CacheEngineBuilder {
    pub fn store(mut self, store: Arc<dyn BlobStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn fetcher(mut self, fetcher: Arc<dyn ResourceFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Wall clock for freshness stamps; defaults to the system clock
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn working_set(mut self, source: Arc<dyn WorkingSetSource>) -> Self {
        self.working_set = Some(source);
        self
    }

    /// Engine configuration; defaults to the built-in named caches
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// # Errors
    ///
    /// Returns [`CacheError::Config`] if the store or fetcher is missing or
    /// the configuration is invalid.
    pub fn build(self) -> Result<CacheEngine, CacheError> {
        let blobs = self.store.ok_or_else(|| CacheError::config("engine", "blob store not set"))?;
        let fetcher =
            self.fetcher.ok_or_else(|| CacheError::config("engine", "resource fetcher not set"))?;
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let config = self.config.unwrap_or_default();

        let registry = Arc::new(NamedCacheRegistry::from_config(&config)?);
        let store = NamedCacheStore::new(blobs);
        let freshness = FreshnessEvaluator::new(clock);
        let sweeper =
            Arc::new(CleanupSweeper::new(store.clone(), Arc::clone(&registry), freshness.clone()));

        Ok(CacheEngine {
            inner: Arc::new(EngineInner {
                eviction: EvictionManager::new(store.clone()),
                registry,
                store,
                fetcher,
                working_set: self.working_set,
                freshness,
                sweeper,
                metrics: EngineMetrics::new(),
                background: TaskTracker::new(),
                cleanup: config.cleanup,
                scheduler: Mutex::new(None),
                initialized: AtomicBool::new(false),
            }),
        })
    }
}
