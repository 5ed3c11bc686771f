//! Pattern-based invalidation
//!
//! An [`InvalidationMatcher`] is evaluated against every key of every named
//! cache; matching entries are deleted. Invalidating keys that are already
//! gone is a no-op.

use std::fmt;

use regex::Regex;
use tidepool_domain::CacheError;
use tracing::{debug, info};

use super::registry::NamedCacheRegistry;
use super::store::NamedCacheStore;

/// Characters that may appear inside an entity id; anything else delimits it
const ENTITY_ID_CHARS: &str = "A-Za-z0-9_.-";

/// What to invalidate
#[derive(Clone)]
pub enum InvalidationMatcher {
    /// Keys containing this substring
    Literal(String),
    /// Keys matching this regular expression anywhere
    Regex(Regex),
}

impl InvalidationMatcher {
    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal(value.into())
    }

    /// Compile a regular expression matcher
    ///
    /// # Errors
    ///
    /// Returns the regex error if `pattern` does not compile.
    pub fn pattern(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(Self::Regex)
    }

    /// Matcher for every key that mentions `entity_id` as a whole segment
    ///
    /// `/api/patients/42` and `/api/patients/42/notes?x=1` match entity `42`;
    /// `/api/patients/420` does not.
    pub fn for_entity(entity_id: &str) -> Self {
        let pattern = format!(
            "(?:^|[^{chars}]){id}(?:$|[^{chars}])",
            chars = ENTITY_ID_CHARS,
            id = regex::escape(entity_id)
        );
        match Regex::new(&pattern) {
            Ok(regex) => Self::Regex(regex),
            // Escaped input always compiles; fall back to a literal all the same
            Err(_) => Self::Literal(entity_id.to_string()),
        }
    }

    pub fn matches(&self, key: &str) -> bool {
        match self {
            Self::Literal(needle) => key.contains(needle.as_str()),
            Self::Regex(regex) => regex.is_match(key),
        }
    }
}

impl fmt::Debug for InvalidationMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Self::Regex(regex) => f.debug_tuple("Regex").field(&regex.as_str()).finish(),
        }
    }
}

impl fmt::Display for InvalidationMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => write!(f, "literal:{value}"),
            Self::Regex(regex) => write!(f, "regex:{}", regex.as_str()),
        }
    }
}

/// Delete every matching key across all registered caches
///
/// Returns the number of entries removed.
///
/// # Errors
///
/// Returns [`CacheError::StoreUnavailable`] if a cache cannot be enumerated
/// or a delete fails.
pub async fn invalidate_matching(
    store: &NamedCacheStore,
    registry: &NamedCacheRegistry,
    matcher: &InvalidationMatcher,
) -> Result<usize, CacheError> {
    let mut removed = 0;
    for cache in registry.names() {
        for key in store.keys(cache).await? {
            if matcher.matches(&key) && store.delete(cache, &key).await? {
                debug!(cache, key = %key, "Invalidated entry");
                removed += 1;
            }
        }
    }

    info!(matcher = %matcher, removed, "Invalidation completed");
    Ok(removed)
}
