//! Domain types and models

pub mod cache;
pub mod stats;

pub use cache::{
    is_valid_cache_name, CacheConfig, CacheEntry, CachedResponse, EntryMetadata, PrecacheAsset,
    ResourceIdentity, ResponseSource, Strategy, WarmItem,
};
pub use stats::{CleanupReport, EngineStats, MetricsSnapshot, NamedCacheStats, PrecacheReport};
