//! # Tidepool Infrastructure
//!
//! Infrastructure implementations of the engine's ports.
//!
//! This crate contains:
//! - Blob stores (in-memory and filesystem)
//! - The HTTP resource fetcher
//! - Configuration loading (files and environment)
//! - Tracing initialisation
//!
//! ## Architecture
//! - Implements traits defined in `tidepool-core`
//! - Depends on `tidepool-domain` and `tidepool-core`
//! - Contains all "impure" code (I/O, network)

pub mod config;
pub mod errors;
pub mod http;
pub mod observability;
pub mod store;

// Re-export commonly used items
pub use http::{HttpResourceFetcher, HttpResourceFetcherBuilder};
pub use observability::{init_tracing, LogFormat};
pub use store::{FsBlobStore, MemoryBlobStore};
