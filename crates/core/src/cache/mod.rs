//! Multi-strategy resource cache
//!
//! Leaves first: [`codec`] and [`freshness`] know nothing about stores;
//! [`store`] wraps the blob store port with the codec; [`eviction`],
//! [`invalidation`], [`precache`] and [`cleanup`] build on it; [`strategies`]
//! and [`engine`] tie everything together.

pub mod cleanup;
pub mod codec;
pub mod engine;
pub mod eviction;
pub mod freshness;
pub mod invalidation;
pub mod metrics;
pub mod ports;
pub mod precache;
pub mod registry;
pub mod scheduler;
pub mod store;
pub mod strategies;

pub use cleanup::CleanupSweeper;
pub use engine::{CacheEngine, CacheEngineBuilder};
pub use eviction::EvictionManager;
pub use freshness::FreshnessEvaluator;
pub use invalidation::InvalidationMatcher;
pub use metrics::EngineMetrics;
pub use registry::NamedCacheRegistry;
pub use scheduler::{CleanupScheduler, SchedulerConfig};
pub use store::NamedCacheStore;
