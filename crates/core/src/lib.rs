//! # Tidepool Core
//!
//! The caching engine - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port interfaces for the blob store, network and working-set source
//! - The strategy executors, eviction, invalidation, precache and cleanup
//! - The [`CacheEngine`] facade and its lifecycle
//!
//! ## Architecture Principles
//! - Only depends on `tidepool-common` and `tidepool-domain`
//! - No filesystem or HTTP code
//! - All external collaborators via traits

pub mod cache;

// Re-export specific items to avoid ambiguity
pub use cache::engine::{CacheEngine, CacheEngineBuilder};
pub use cache::invalidation::InvalidationMatcher;
pub use cache::metrics::EngineMetrics;
pub use cache::ports::{BlobStore, ResourceFetcher, WorkingSetSource};
