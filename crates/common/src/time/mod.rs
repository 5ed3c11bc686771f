//! Time utilities and abstractions
//!
//! - **[`clock`]**: wall-clock abstraction with real and mock implementations
//! - **[`deadline`]**: racing an operation against a timeout
//! - **[`interval`]**: recurring intervals with jitter

pub mod clock;
pub mod deadline;
pub mod interval;

// Re-export commonly used items
pub use clock::{Clock, MockClock, SystemClock};
pub use deadline::{race_deadline, DeadlineOutcome};
pub use interval::{Interval, IntervalConfig};
