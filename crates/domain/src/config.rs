//! Engine configuration
//!
//! [`EngineConfig`] maps named caches to their [`CacheConfig`] and carries the
//! cleanup schedule. The default registers the four built-in caches.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::errors::CacheError;
use crate::types::{CacheConfig, Strategy};

/// Top-level engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_caches")]
    pub caches: BTreeMap<String, CacheConfig>,

    #[serde(default)]
    pub cleanup: CleanupSettings,
}

/// When the cleanup sweeps run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanupSettings {
    /// Period of the background sweeps; `None` disables the scheduler
    #[serde(default = "default_cleanup_interval")]
    pub interval_seconds: Option<u64>,

    /// Run both sweeps once during `init`
    #[serde(default = "default_true")]
    pub run_on_startup: bool,

    /// Jitter factor (0.0 - 1.0) applied to the period
    #[serde(default)]
    pub jitter: Option<f64>,
}

impl Default for CleanupSettings {
    fn default() -> Self {
        Self { interval_seconds: default_cleanup_interval(), run_on_startup: true, jitter: None }
    }
}

fn default_cleanup_interval() -> Option<u64> {
    Some(DEFAULT_CLEANUP_INTERVAL_SECS)
}

fn default_true() -> bool {
    true
}

/// The built-in named caches
///
/// Higher-risk data gets a shorter max age.
pub fn default_caches() -> BTreeMap<String, CacheConfig> {
    let entry = |max_age, max_entries, strategy| {
        CacheConfig::new(DEFAULT_CACHE_VERSION, max_age, max_entries, DEFAULT_NETWORK_TIMEOUT_SECS)
            .with_default_strategy(strategy)
    };

    BTreeMap::from([
        (
            STATIC_CACHE.to_string(),
            entry(STATIC_MAX_AGE_SECS, STATIC_MAX_ENTRIES, Strategy::CacheFirst),
        ),
        (
            API_CACHE.to_string(),
            entry(API_MAX_AGE_SECS, API_MAX_ENTRIES, Strategy::StaleWhileRevalidate),
        ),
        (
            IMAGES_CACHE.to_string(),
            entry(IMAGES_MAX_AGE_SECS, IMAGES_MAX_ENTRIES, Strategy::CacheFirst),
        ),
        (
            CLINICAL_CACHE.to_string(),
            entry(CLINICAL_MAX_AGE_SECS, CLINICAL_MAX_ENTRIES, Strategy::StaleWhileRevalidate),
        ),
    ])
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { caches: default_caches(), cleanup: CleanupSettings::default() }
    }
}

impl EngineConfig {
    /// Config with no named caches and no background cleanup
    pub fn empty() -> Self {
        Self {
            caches: BTreeMap::new(),
            cleanup: CleanupSettings { interval_seconds: None, run_on_startup: false, jitter: None },
        }
    }

    /// Add or replace a named cache
    pub fn with_cache(mut self, name: impl Into<String>, config: CacheConfig) -> Self {
        self.caches.insert(name.into(), config);
        self
    }

    pub fn with_cleanup(mut self, cleanup: CleanupSettings) -> Self {
        self.cleanup = cleanup;
        self
    }

    /// Validate every named cache and the cleanup schedule
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Config`] naming the first offending cache.
    pub fn validate(&self) -> Result<(), CacheError> {
        for (name, config) in &self.caches {
            config.validate(name)?;
        }

        if self.cleanup.interval_seconds == Some(0) {
            return Err(CacheError::config("cleanup", "interval_seconds must be > 0"));
        }
        if let Some(jitter) = self.cleanup.jitter {
            if !(0.0..=1.0).contains(&jitter) {
                return Err(CacheError::config("cleanup", "jitter must be within 0.0..=1.0"));
            }
        }
        Ok(())
    }
}
