//! Shared test helpers for `tidepool-core` integration tests.
//!
//! Lightweight in-memory collaborators with access counters so tests can
//! assert on what the engine did to the store and the network, not just on
//! what it returned.

#![allow(dead_code)]

pub mod fetcher;
pub mod store;

use std::sync::Arc;

use tidepool_common::time::MockClock;
use tidepool_core::CacheEngine;
use tidepool_domain::{CacheConfig, EngineConfig};

pub use fetcher::{HangingWorkingSet, Reply, ScriptedFetcher, StaticWorkingSet};
pub use store::CountingStore;

/// Everything a test needs to drive and inspect an engine
pub struct Harness {
    pub engine: CacheEngine,
    pub store: Arc<CountingStore>,
    pub fetcher: Arc<ScriptedFetcher>,
    pub clock: Arc<MockClock>,
}

/// Engine config with one named cache and no background cleanup
pub fn single_cache(name: &str, config: CacheConfig) -> EngineConfig {
    EngineConfig::empty().with_cache(name, config)
}

/// Build an engine over fresh mocks, clock pinned to UNIX second 0
pub fn harness(config: EngineConfig) -> Harness {
    harness_with(config, Arc::new(ScriptedFetcher::new()))
}

pub fn harness_with(config: EngineConfig, fetcher: Arc<ScriptedFetcher>) -> Harness {
    let store = Arc::new(CountingStore::new());
    let clock = Arc::new(MockClock::at_unix_seconds(0));

    let engine = CacheEngine::builder()
        .store(store.clone())
        .fetcher(fetcher.clone())
        .clock(clock.clone())
        .config(config)
        .build()
        .expect("engine builds");

    Harness { engine, store, fetcher, clock }
}
