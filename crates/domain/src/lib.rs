//! # Tidepool Domain
//!
//! Data model for the Tidepool caching engine.
//!
//! This crate contains:
//! - Cache data types (`ResourceIdentity`, `CacheConfig`, `CacheEntry`, ...)
//! - Engine configuration with the default named caches
//! - Domain error types and Result definitions
//! - Domain constants
//!
//! ## Architecture
//! - Depends only on the `foundation` tier of `tidepool-common` (for
//!   `ErrorClassification`)
//! - Pure models, no I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
