//! Statistics and report types
//!
//! This module centralizes the structs returned by engine operations:
//! - Per-cache footprint (`get_stats`)
//! - Engine counters snapshot
//! - Cleanup sweep and precache reports

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::cache::ResourceIdentity;

/* -------------------------------------------------------------------------- */
/* Footprint */
/* -------------------------------------------------------------------------- */

/// Footprint of one named cache
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedCacheStats {
    /// Number of stored entries
    pub count: usize,

    /// Total stored bytes, envelope headers included
    pub total_bytes: u64,
}

/// Counters accumulated since the engine was built
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub network_fetches: u64,
    pub network_failures: u64,
    pub stale_fallbacks: u64,
    pub writes: u64,
    pub evictions: u64,
    pub invalidations: u64,
    pub revalidations_succeeded: u64,
    pub revalidations_failed: u64,
}

impl MetricsSnapshot {
    /// Hit ratio over cache lookups, `0.0` when nothing was looked up
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Result of `get_stats`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineStats {
    pub caches: BTreeMap<String, NamedCacheStats>,
    pub metrics: MetricsSnapshot,
}

impl EngineStats {
    pub fn total_entries(&self) -> usize {
        self.caches.values().map(|s| s.count).sum()
    }
}

/* -------------------------------------------------------------------------- */
/* Reports */
/* -------------------------------------------------------------------------- */

/// Outcome of the cleanup sweeps
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupReport {
    /// Named caches wiped by the version sweep
    pub purged_caches: Vec<String>,

    /// Entries removed by the version sweep
    pub version_purged: usize,

    /// Entries removed by the expiry sweep
    pub expired: usize,
}

impl CleanupReport {
    pub fn merge(mut self, other: CleanupReport) -> Self {
        self.purged_caches.extend(other.purged_caches);
        self.version_purged += other.version_purged;
        self.expired += other.expired;
        self
    }

    pub fn total_removed(&self) -> usize {
        self.version_purged + self.expired
    }
}

/// Outcome of a precache run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrecacheReport {
    pub succeeded: usize,
    pub failed: Vec<ResourceIdentity>,
}

impl PrecacheReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}
