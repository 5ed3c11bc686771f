//! Integration tests for cleanup sweeps, the scheduler and engine lifecycle

mod support;

use std::sync::Arc;
use std::time::Duration;

use support::{harness, single_cache, CountingStore};
use tidepool_common::assert_eventually_async;
use tidepool_common::time::MockClock;
use tidepool_core::cache::{
    CleanupScheduler, CleanupSweeper, FreshnessEvaluator, NamedCacheRegistry, NamedCacheStore,
    SchedulerConfig,
};
use tidepool_domain::{CacheConfig, CacheError, CleanupSettings, EngineConfig, EntryMetadata};

fn two_caches() -> EngineConfig {
    single_cache("api", CacheConfig::new("v2", 900, 50, 10))
        .with_cache("static", CacheConfig::new("v1", 86_400, 50, 10))
}

fn sweeper_over(store: Arc<CountingStore>, clock: Arc<MockClock>) -> Arc<CleanupSweeper> {
    let registry = Arc::new(NamedCacheRegistry::from_config(&two_caches()).unwrap());
    Arc::new(CleanupSweeper::new(
        NamedCacheStore::new(store),
        registry,
        FreshnessEvaluator::new(clock),
    ))
}

// ============================================================================
// Sweeps
// ============================================================================

/// Validates the version sweep after a version bump.
///
/// Assertions:
/// - Ensures old-version and unversioned entries are removed.
/// - Ensures live-version entries are untouched.
/// - Ensures caches already on their live version are not reported.
#[tokio::test]
async fn version_sweep_purges_old_versions_only() {
    let h = harness(two_caches());
    h.store.seed("api", "/old", b"x", 0, "v1");
    h.store.seed("api", "/new", b"x", 0, "v2");
    h.store.seed_with("api", "/bare", b"x", EntryMetadata::default());
    h.store.seed("static", "/app.js", b"x", 0, "v1");

    let report = h.engine.run_version_sweep().await.unwrap();

    assert_eq!(report.version_purged, 2);
    assert_eq!(report.purged_caches, ["api"]);
    assert_eq!(h.store.keys_of("api"), ["/new"]);
    assert_eq!(h.store.keys_of("static"), ["/app.js"]);
}

#[tokio::test]
async fn version_sweep_empties_a_cache_of_old_data() {
    let h = harness(two_caches());
    h.store.seed("api", "/a", b"x", 0, "v1");
    h.store.seed("api", "/b", b"x", 0, "v1");

    h.engine.run_version_sweep().await.unwrap();

    assert!(h.store.keys_of("api").is_empty());
    assert_eq!(h.engine.run_version_sweep().await.unwrap().version_purged, 0);
}

#[tokio::test]
async fn expiry_sweep_removes_only_expired_entries() {
    let h = harness(two_caches());
    h.store.seed("api", "/expired", b"x", 0, "v2");
    h.store.seed("api", "/fresh", b"x", 1_000, "v2");
    h.store.seed("static", "/app.js", b"x", 0, "v1");
    h.clock.set_unix_seconds(1_500);

    let report = h.engine.run_expiry_sweep().await.unwrap();

    assert_eq!(report.expired, 1);
    assert_eq!(h.store.keys_of("api"), ["/fresh"]);
    assert_eq!(h.store.keys_of("static"), ["/app.js"]);
}

#[tokio::test]
async fn corrupt_envelopes_are_swept_as_unstamped() {
    let h = harness(two_caches());
    h.store.seed_raw("api", "/garbage", vec![0xff, 0xff]);

    let report = h.engine.run_cleanup().await.unwrap();

    assert_eq!(report.total_removed(), 1);
    assert!(h.store.keys_of("api").is_empty());
}

#[tokio::test]
async fn sweeps_surface_store_outage() {
    let h = harness(two_caches());
    h.store.set_unavailable(true);

    let err = h.engine.run_cleanup().await.unwrap_err();

    assert!(matches!(err, CacheError::StoreUnavailable(_)));
}

// ============================================================================
// Scheduler
// ============================================================================

#[tokio::test(start_paused = true)]
async fn scheduler_lifecycle() {
    let sweeper = sweeper_over(Arc::new(CountingStore::new()), Arc::new(MockClock::new()));
    let mut scheduler = CleanupScheduler::new(sweeper, SchedulerConfig::new(Duration::from_secs(60)));

    assert!(!scheduler.is_running().await);
    assert!(scheduler.stop().await.is_err());

    scheduler.start().await.unwrap();
    assert!(scheduler.is_running().await);
    assert!(scheduler.start().await.is_err());

    scheduler.stop().await.unwrap();
    assert!(!scheduler.is_running().await);

    // Restartable after stop
    scheduler.start().await.unwrap();
    assert!(scheduler.is_running().await);
    scheduler.stop().await.unwrap();
}

/// Validates that the scheduler sweeps on its period and not before.
///
/// Assertions:
/// - Ensures nothing is removed before the first period elapses.
/// - Ensures the expired entry is gone after the first period.
#[tokio::test(start_paused = true)]
async fn scheduler_sweeps_every_period() {
    let store = Arc::new(CountingStore::new());
    let clock = Arc::new(MockClock::at_unix_seconds(10_000));
    store.seed("api", "/expired", b"x", 0, "v2");
    store.seed("api", "/fresh", b"x", 9_990, "v2");

    let sweeper = sweeper_over(Arc::clone(&store), clock);
    let mut scheduler = CleanupScheduler::new(sweeper, SchedulerConfig::new(Duration::from_secs(60)));
    scheduler.start().await.unwrap();

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert!(store.contains("api", "/expired"));

    assert_eventually_async!(Duration::from_secs(60), async { !store.contains("api", "/expired") });
    assert!(store.contains("api", "/fresh"));

    scheduler.stop().await.unwrap();
}

// ============================================================================
// Engine lifecycle and stats
// ============================================================================

#[tokio::test(start_paused = true)]
async fn init_runs_startup_cleanup_and_starts_scheduler() {
    let config = two_caches().with_cleanup(CleanupSettings {
        interval_seconds: Some(3_600),
        run_on_startup: true,
        jitter: None,
    });
    let h = harness(config);
    h.store.seed("api", "/old", b"x", 0, "v1");

    h.engine.init().await.unwrap();

    assert!(h.store.keys_of("api").is_empty());
    assert!(h.engine.is_scheduler_running().await);
    assert!(h.engine.init().await.is_err());

    h.engine.shutdown().await.unwrap();
    assert!(!h.engine.is_scheduler_running().await);

    // Re-initializable after shutdown
    h.engine.init().await.unwrap();
    h.engine.shutdown().await.unwrap();
}

#[tokio::test]
async fn init_tolerates_failing_startup_cleanup() {
    let config = two_caches().with_cleanup(CleanupSettings {
        interval_seconds: None,
        run_on_startup: true,
        jitter: None,
    });
    let h = harness(config);
    h.store.set_unavailable(true);

    h.engine.init().await.unwrap();

    assert!(!h.engine.is_scheduler_running().await);
}

/// Validates that shutdown gives up on background work that never settles.
///
/// Assertions:
/// - Ensures a hanging revalidation makes shutdown fail with a timeout
///   instead of blocking forever.
#[tokio::test(start_paused = true)]
async fn shutdown_reports_stuck_background_work() {
    use support::{harness_with, Reply, ScriptedFetcher};
    use tidepool_domain::{ResourceIdentity, Strategy};

    // Network timeout well past the drain bound
    let config = single_cache("api", CacheConfig::new("v1", 900, 10, 600));
    let fetcher = Arc::new(ScriptedFetcher::new().with("/a", Reply::Hang));
    let h = harness_with(config, fetcher);
    h.store.seed("api", "/a", b"x", 0, "v1");

    h.engine
        .fetch(&ResourceIdentity::from("/a"), "api", Strategy::StaleWhileRevalidate)
        .await
        .unwrap();

    assert!(h.engine.shutdown().await.is_err());
    assert_eq!(h.engine.pending_background_tasks(), 1);
}

#[tokio::test]
async fn get_stats_reports_every_cache() {
    let h = harness(two_caches());
    h.store.seed("api", "/a", b"12345", 0, "v2");
    h.store.seed("api", "/b", b"1", 0, "v2");

    let stats = h.engine.get_stats().await.unwrap();

    assert_eq!(stats.caches.len(), 2);
    assert_eq!(stats.caches["api"].count, 2);
    assert!(stats.caches["api"].total_bytes > 6);
    assert_eq!(stats.caches["static"].count, 0);
    assert_eq!(stats.caches["static"].total_bytes, 0);
    assert_eq!(stats.total_entries(), 2);
}

#[tokio::test]
async fn get_stats_surfaces_store_outage() {
    let h = harness(two_caches());
    h.store.set_unavailable(true);

    assert!(matches!(h.engine.get_stats().await, Err(CacheError::StoreUnavailable(_))));
}
