//! Domain constants
//!
//! Names and defaults for the built-in named caches plus envelope limits.

// Built-in named caches
pub const STATIC_CACHE: &str = "static";
pub const API_CACHE: &str = "api";
pub const IMAGES_CACHE: &str = "images";
pub const CLINICAL_CACHE: &str = "clinical";

// Default cache configuration
pub const DEFAULT_CACHE_VERSION: &str = "v1";
pub const DEFAULT_NETWORK_TIMEOUT_SECS: u64 = 10;

pub const STATIC_MAX_AGE_SECS: u64 = 7 * 24 * 60 * 60;
pub const STATIC_MAX_ENTRIES: usize = 100;

pub const API_MAX_AGE_SECS: u64 = 15 * 60;
pub const API_MAX_ENTRIES: usize = 200;

pub const IMAGES_MAX_AGE_SECS: u64 = 30 * 24 * 60 * 60;
pub const IMAGES_MAX_ENTRIES: usize = 50;

pub const CLINICAL_MAX_AGE_SECS: u64 = 5 * 60;
pub const CLINICAL_MAX_ENTRIES: usize = 100;

// Cleanup scheduling
pub const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 60 * 60;
pub const SCHEDULER_STOP_TIMEOUT_SECS: u64 = 5;
pub const BACKGROUND_DRAIN_TIMEOUT_SECS: u64 = 5;

// Envelope layout: u32 big-endian header length, JSON header, payload
pub const ENVELOPE_LENGTH_PREFIX_BYTES: usize = 4;
pub const MAX_ENVELOPE_HEADER_BYTES: usize = 64 * 1024;

// Warm loader
pub const DEFAULT_WARM_LIMIT: usize = 10;
