//! Wall-clock abstraction for freshness decisions
//!
//! Cache freshness is judged against wall-clock time (`cachedAt` stamps are
//! persisted and must survive restarts), so the engine asks a [`Clock`] for
//! the current [`SystemTime`] instead of calling `SystemTime::now()` directly.
//! Tests swap in a [`MockClock`] pinned to a known epoch second.
//!
//! # Examples
//!
//! ```
//! # #[cfg(feature = "runtime")]
//! # {
//! use std::time::Duration;
//!
//! use tidepool_common::time::{Clock, MockClock};
//!
//! let clock = MockClock::at_unix_seconds(100);
//! assert_eq!(clock.unix_seconds(), 100);
//!
//! clock.advance(Duration::from_secs(150));
//! assert_eq!(clock.unix_seconds(), 250);
//! # }
//! ```

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Trait for time operations to enable testing
pub trait Clock: Send + Sync + 'static {
    /// Get current instant (monotonic time)
    fn now(&self) -> Instant;

    /// Get current system time (wall clock)
    fn system_time(&self) -> SystemTime;

    /// Get milliseconds since UNIX epoch
    fn millis_since_epoch(&self) -> u64 {
        self.system_time().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64
    }

    /// Get whole seconds since UNIX epoch
    fn unix_seconds(&self) -> u64 {
        self.system_time().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
    }
}

/// Real system clock implementation for production use
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn system_time(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Implement Clock for Arc<T> where T: Clock for convenient cloning
impl<T: Clock> Clock for Arc<T> {
    fn now(&self) -> Instant {
        (**self).now()
    }

    fn system_time(&self) -> SystemTime {
        (**self).system_time()
    }
}

/// Mock clock for deterministic testing
///
/// Cloned clocks share the same elapsed time, so a test can hand one clone to
/// the engine and keep another to move time forward.
#[derive(Debug, Clone)]
pub struct MockClock {
    start: Instant,
    elapsed: Arc<Mutex<Duration>>,
    base_system_time: SystemTime,
}

impl MockClock {
    /// Create a new mock clock starting at the current real time
    pub fn new() -> Self {
        Self::with_base(SystemTime::now())
    }

    /// Create a mock clock whose wall clock reads `secs` seconds after the
    /// UNIX epoch
    pub fn at_unix_seconds(secs: u64) -> Self {
        Self::with_base(UNIX_EPOCH + Duration::from_secs(secs))
    }

    fn with_base(base_system_time: SystemTime) -> Self {
        Self { start: Instant::now(), elapsed: Arc::new(Mutex::new(Duration::ZERO)), base_system_time }
    }

    /// Advance the mock clock by a duration
    pub fn advance(&self, duration: Duration) {
        let mut elapsed = self.elapsed.lock().unwrap_or_else(PoisonError::into_inner);
        *elapsed += duration;
    }

    /// Advance the mock clock by whole seconds
    pub fn advance_secs(&self, secs: u64) {
        self.advance(Duration::from_secs(secs));
    }

    /// Set the mock clock to a specific elapsed time
    pub fn set_elapsed(&self, duration: Duration) {
        let mut elapsed = self.elapsed.lock().unwrap_or_else(PoisonError::into_inner);
        *elapsed = duration;
    }

    /// Move the wall clock to an absolute UNIX second
    ///
    /// Times before the clock's base are clamped to the base.
    pub fn set_unix_seconds(&self, secs: u64) {
        let target = UNIX_EPOCH + Duration::from_secs(secs);
        let offset = target.duration_since(self.base_system_time).unwrap_or_default();
        self.set_elapsed(offset);
    }

    /// Get the current elapsed time
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        *self.elapsed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        self.start + self.elapsed()
    }

    fn system_time(&self) -> SystemTime {
        self.base_system_time + self.elapsed()
    }
}
