//! Named cache registry
//!
//! Maps a category name to its [`CacheConfig`]. Built once from the engine
//! configuration and never mutated afterwards.

use std::collections::BTreeMap;
use std::time::Duration;

use tidepool_domain::constants::DEFAULT_NETWORK_TIMEOUT_SECS;
use tidepool_domain::{CacheConfig, CacheError, EngineConfig};

#[derive(Debug, Clone, Default)]
pub struct NamedCacheRegistry {
    caches: BTreeMap<String, CacheConfig>,
}

impl NamedCacheRegistry {
    /// Build a registry, validating every named cache
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Config`] for the first invalid cache.
    pub fn new(caches: BTreeMap<String, CacheConfig>) -> Result<Self, CacheError> {
        for (name, config) in &caches {
            config.validate(name)?;
        }
        Ok(Self { caches })
    }

    /// # Errors
    ///
    /// Returns [`CacheError::Config`] if the engine configuration is invalid.
    pub fn from_config(config: &EngineConfig) -> Result<Self, CacheError> {
        config.validate()?;
        Ok(Self { caches: config.caches.clone() })
    }

    /// Look up a named cache
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::UnknownCache`] if `name` was never registered.
    pub fn get(&self, name: &str) -> Result<&CacheConfig, CacheError> {
        self.caches.get(name).ok_or_else(|| CacheError::UnknownCache(name.to_string()))
    }

    /// Largest network timeout of any named cache
    ///
    /// Bounds calls that are not tied to a single cache. Falls back to the
    /// default timeout when nothing is registered.
    pub fn longest_network_timeout(&self) -> Duration {
        self.caches
            .values()
            .map(CacheConfig::network_timeout)
            .max()
            .unwrap_or(Duration::from_secs(DEFAULT_NETWORK_TIMEOUT_SECS))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.caches.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CacheConfig)> {
        self.caches.iter().map(|(name, config)| (name.as_str(), config))
    }

    pub fn len(&self) -> usize {
        self.caches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.caches.is_empty()
    }
}
