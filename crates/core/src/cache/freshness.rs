//! Freshness evaluation
//!
//! An entry is fresh iff `now - cached_at < max_age`. Entries without a
//! `cached_at` stamp are never fresh.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tidepool_common::time::Clock;
use tidepool_domain::{CacheEntry, EntryMetadata};

/// Evaluate freshness of `metadata` at the instant `now`
pub fn is_fresh_at(metadata: &EntryMetadata, max_age: Duration, now: DateTime<Utc>) -> bool {
    let Some(cached_at) = metadata.cached_at else {
        return false;
    };

    match chrono::Duration::from_std(max_age) {
        Ok(max_age) => now.signed_duration_since(cached_at) < max_age,
        // Larger than chrono can represent
        Err(_) => true,
    }
}

/// Freshness evaluator bound to a clock
#[derive(Clone)]
pub struct FreshnessEvaluator {
    clock: Arc<dyn Clock>,
}

impl FreshnessEvaluator {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Current wall-clock time as a UTC timestamp
    pub fn now(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from(self.clock.system_time())
    }

    pub fn is_fresh(&self, entry: &CacheEntry, max_age: Duration) -> bool {
        self.is_metadata_fresh(&entry.metadata, max_age)
    }

    pub fn is_metadata_fresh(&self, metadata: &EntryMetadata, max_age: Duration) -> bool {
        is_fresh_at(metadata, max_age, self.now())
    }
}

impl std::fmt::Debug for FreshnessEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FreshnessEvaluator").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for cache::freshness.
    use chrono::TimeZone;
    use tidepool_common::time::MockClock;
    use tidepool_domain::ResourceIdentity;

    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    /// Validates the age comparison over a grid of ages.
    ///
    /// Assertions:
    /// - Ensures `is_fresh_at` equals `now - cached_at < max_age` for each age.
    #[test]
    fn test_freshness_matches_age_comparison() {
        let max_age = 300u64;
        for age in [0i64, 1, 150, 299, 300, 301, 10_000] {
            let metadata = EntryMetadata::stamped(at(1_000), "v1");
            let now = at(1_000 + age);
            assert_eq!(
                is_fresh_at(&metadata, Duration::from_secs(max_age), now),
                age < max_age as i64,
                "age {age}"
            );
        }
    }

    #[test]
    fn test_unstamped_entry_is_never_fresh() {
        let metadata = EntryMetadata { version: Some("v1".into()), ..Default::default() };
        assert!(!is_fresh_at(&metadata, Duration::from_secs(u64::MAX / 2), at(0)));
    }

    #[test]
    fn test_entry_from_the_future_is_fresh() {
        let metadata = EntryMetadata::stamped(at(2_000), "v1");
        assert!(is_fresh_at(&metadata, Duration::from_secs(10), at(1_000)));
    }

    #[test]
    fn test_evaluator_reads_clock() {
        let clock = Arc::new(MockClock::at_unix_seconds(100));
        let evaluator = FreshnessEvaluator::new(clock.clone());
        let entry = CacheEntry::new(
            ResourceIdentity::from("/a"),
            Vec::new(),
            EntryMetadata::stamped(at(100), "v1"),
        );

        assert!(evaluator.is_fresh(&entry, Duration::from_secs(60)));
        clock.advance_secs(60);
        assert!(!evaluator.is_fresh(&entry, Duration::from_secs(60)));
        assert_eq!(evaluator.now(), at(160));
    }
}
