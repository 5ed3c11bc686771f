//! Integration tests for the `time` module.
//!
//! These tests exercise the clock abstraction, deadline racing, and interval
//! timing together the way the cache engine drives them.

#![cfg(feature = "runtime")]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tidepool_common::time::{
    race_deadline, Clock, DeadlineOutcome, Interval, IntervalConfig, MockClock, SystemClock,
};

/// Verifies that a shared mock clock can drive a freshness-style comparison.
#[test]
fn test_mock_clock_drives_age_checks() {
    let clock = Arc::new(MockClock::at_unix_seconds(1_000));
    let handle: Arc<dyn Clock> = clock.clone();

    let cached_at = handle.unix_seconds();
    clock.advance_secs(299);
    assert!(handle.unix_seconds() - cached_at < 300);

    clock.advance_secs(1);
    assert_eq!(handle.unix_seconds() - cached_at, 300);
}

#[test]
fn test_system_clock_is_after_epoch() {
    assert!(SystemClock.unix_seconds() > 1_600_000_000);
}

/// Validates that a slow operation loses the race at the configured limit.
///
/// Assertions:
/// - Ensures the outcome is `Elapsed` with the configured limit.
/// - Ensures paused time advanced by the limit, not by the operation's sleep.
#[tokio::test(start_paused = true)]
async fn test_deadline_beats_slow_operation() {
    let start = tokio::time::Instant::now();
    let outcome = race_deadline(
        async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            "late"
        },
        Duration::from_secs(5),
    )
    .await;

    assert_eq!(outcome, DeadlineOutcome::Elapsed(Duration::from_secs(5)));
    assert_eq!(start.elapsed(), Duration::from_secs(5));
}

/// Verifies that an interval fires repeatedly and a spawned loop can be
/// stopped by dropping its handle.
#[tokio::test(start_paused = true)]
async fn test_interval_drives_recurring_work() {
    let counter = Arc::new(AtomicU32::new(0));
    let counter_clone = counter.clone();

    let handle = tokio::spawn(async move {
        let mut interval = Interval::new(
            IntervalConfig::new(Duration::from_secs(10)).delay_first_tick(true),
        );
        loop {
            interval.tick().await;
            counter_clone.fetch_add(1, Ordering::SeqCst);
        }
    });

    tokio::time::sleep(Duration::from_secs(35)).await;
    handle.abort();

    assert_eq!(counter.load(Ordering::SeqCst), 3);
}
