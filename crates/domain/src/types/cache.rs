//! Core cache data model
//!
//! A named cache is a logical bucket (for example `clinical`) with its own
//! [`CacheConfig`]. Each stored resource is a [`CacheEntry`]: the payload plus
//! [`EntryMetadata`] stamped when it was written.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::CacheError;
use crate::impl_domain_status_conversions;

/* -------------------------------------------------------------------------- */
/* Resource identity */
/* -------------------------------------------------------------------------- */

/// Key of a resource within a named cache
///
/// Usually a normalized request signature such as `/api/patients/42`. The
/// identity doubles as the blob store key and as the network request target.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceIdentity(String);

impl ResourceIdentity {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceIdentity {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ResourceIdentity {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for ResourceIdentity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/* -------------------------------------------------------------------------- */
/* Strategy */
/* -------------------------------------------------------------------------- */

/// Retrieval strategy for a single request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Serve fresh cache without touching the network
    CacheFirst,
    /// Always try the network, fall back to any cached copy
    NetworkFirst,
    /// Serve any cached copy now, refresh in the background
    StaleWhileRevalidate,
    /// Network only; never reads or writes the cache
    NetworkOnly,
    /// Cache only; never touches the network
    CacheOnly,
}

impl_domain_status_conversions!(Strategy {
    CacheFirst => "cache_first",
    NetworkFirst => "network_first",
    StaleWhileRevalidate => "stale_while_revalidate",
    NetworkOnly => "network_only",
    CacheOnly => "cache_only",
});

/* -------------------------------------------------------------------------- */
/* Cache configuration */
/* -------------------------------------------------------------------------- */

/// Policy of one named cache
///
/// Immutable for the lifetime of an engine. Bumping `version` on a new
/// deployment makes every previously stored entry of that cache dead; the
/// version sweep reaps them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    pub version: String,
    pub max_age_seconds: u64,
    pub max_entries: usize,
    pub network_timeout_seconds: u64,

    /// Strategy used by `fetch_default`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_strategy: Option<Strategy>,
}

/// Whether `name` can name a cache
///
/// Names double as directory names in durable stores, so only ASCII
/// letters, digits, `_` and `-` are allowed.
pub fn is_valid_cache_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

impl CacheConfig {
    pub fn new(
        version: impl Into<String>,
        max_age_seconds: u64,
        max_entries: usize,
        network_timeout_seconds: u64,
    ) -> Self {
        Self {
            version: version.into(),
            max_age_seconds,
            max_entries,
            network_timeout_seconds,
            default_strategy: None,
        }
    }

    pub fn with_default_strategy(mut self, strategy: Strategy) -> Self {
        self.default_strategy = Some(strategy);
        self
    }

    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_seconds)
    }

    pub fn network_timeout(&self) -> Duration {
        Duration::from_secs(self.network_timeout_seconds)
    }

    /// Check the name and limits of the cache named `name`
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Config`] if the name is not a valid cache name,
    /// the version is empty or any limit is zero.
    pub fn validate(&self, name: &str) -> Result<(), CacheError> {
        if !is_valid_cache_name(name) {
            return Err(CacheError::config(
                name,
                "cache name must be non-empty ASCII letters, digits, '_' or '-'",
            ));
        }
        if self.version.trim().is_empty() {
            return Err(CacheError::config(name, "version must not be empty"));
        }
        if self.max_age_seconds == 0 {
            return Err(CacheError::config(name, "max_age_seconds must be > 0"));
        }
        if self.max_entries == 0 {
            return Err(CacheError::config(name, "max_entries must be > 0"));
        }
        if self.network_timeout_seconds == 0 {
            return Err(CacheError::config(name, "network_timeout_seconds must be > 0"));
        }
        Ok(())
    }
}

/* -------------------------------------------------------------------------- */
/* Entries */
/* -------------------------------------------------------------------------- */

/// Stamp written alongside every payload
///
/// Both fields are optional on read: entries written by a layer that forgot
/// to stamp them are never fresh and never match a live version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cached_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl EntryMetadata {
    pub fn stamped(cached_at: DateTime<Utc>, version: impl Into<String>) -> Self {
        Self { cached_at: Some(cached_at), version: Some(version.into()), extra: BTreeMap::new() }
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Whether this entry was written under `version`
    pub fn matches_version(&self, version: &str) -> bool {
        self.version.as_deref() == Some(version)
    }
}

/// A stored resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub key: ResourceIdentity,
    pub payload: Vec<u8>,
    pub metadata: EntryMetadata,
}

impl CacheEntry {
    pub fn new(key: ResourceIdentity, payload: Vec<u8>, metadata: EntryMetadata) -> Self {
        Self { key, payload, metadata }
    }

    pub fn cached_at(&self) -> Option<DateTime<Utc>> {
        self.metadata.cached_at
    }

    pub fn version(&self) -> Option<&str> {
        self.metadata.version.as_deref()
    }
}

/// Payload handed back to a caller, with where it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    pub payload: Vec<u8>,
    pub source: ResponseSource,
    pub cached_at: Option<DateTime<Utc>>,
}

/// Origin of a [`CachedResponse`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    /// Fresh cached copy
    Cache,
    /// Cached copy served past its max age (fallback or stale-while-revalidate)
    StaleCache,
    /// Just fetched from the network
    Network,
}

impl CachedResponse {
    pub fn from_entry(entry: CacheEntry, source: ResponseSource) -> Self {
        Self { cached_at: entry.metadata.cached_at, payload: entry.payload, source }
    }

    pub fn network(payload: Vec<u8>, cached_at: Option<DateTime<Utc>>) -> Self {
        Self { payload, source: ResponseSource::Network, cached_at }
    }

    pub fn is_from_network(&self) -> bool {
        self.source == ResponseSource::Network
    }
}

/* -------------------------------------------------------------------------- */
/* Precache */
/* -------------------------------------------------------------------------- */

/// One asset of a precache manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrecacheAsset {
    pub identity: ResourceIdentity,
    pub cache: String,
    pub expected_version: String,
}

impl PrecacheAsset {
    pub fn new(
        identity: impl Into<ResourceIdentity>,
        cache: impl Into<String>,
        expected_version: impl Into<String>,
    ) -> Self {
        Self {
            identity: identity.into(),
            cache: cache.into(),
            expected_version: expected_version.into(),
        }
    }
}

/// One item of a user's recent working set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarmItem {
    pub identity: ResourceIdentity,
    pub cache: String,
}

impl WarmItem {
    pub fn new(identity: impl Into<ResourceIdentity>, cache: impl Into<String>) -> Self {
        Self { identity: identity.into(), cache: cache.into() }
    }
}
