//! Testing utilities and helpers
//!
//! - **[`async_utils`]**: polling helpers and the `assert_eventually_async!`
//!   macro for background work
//!
//! Deterministic time lives in [`crate::time::MockClock`].

pub mod async_utils;

// Note: Macros exported with #[macro_export] are available at crate root
pub use async_utils::{poll_until, timeout_ok};
