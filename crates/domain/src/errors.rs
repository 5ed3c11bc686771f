//! Error types used throughout the engine
//!
//! [`CacheError`] is the only error a caller of the engine ever sees.
//! [`FetchError`] and [`StoreError`] are reported by the network and blob
//! store collaborators and mapped into `CacheError` at the engine boundary.

use std::time::Duration;

use thiserror::Error;
use tidepool_common::error::{ErrorClassification, ErrorSeverity};

/// Failure reported by a `ResourceFetcher`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("upstream returned status {status}")]
    Status { status: u16 },

    #[error("transport timed out after {0:?}")]
    Timeout(Duration),
}

/// Failure reported by a `BlobStore`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("blob store unavailable: {0}")]
    Unavailable(String),

    #[error("blob store I/O error: {0}")]
    Io(String),

    #[error("corrupt envelope for '{key}': {message}")]
    Corrupt { key: String, message: String },
}

/// Main error type for the caching engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("network timed out after {seconds}s fetching '{key}'")]
    NetworkTimeout { key: String, seconds: u64 },

    #[error("network failure fetching '{key}': {source}")]
    NetworkFailure {
        key: String,
        #[source]
        source: FetchError,
    },

    #[error("cache miss for '{key}' in '{cache}'")]
    CacheMiss { cache: String, key: String },

    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    #[error("invalid configuration for '{cache}': {message}")]
    Config { cache: String, message: String },

    #[error("unknown named cache '{0}'")]
    UnknownCache(String),
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, CacheError>;

impl CacheError {
    /// Map a fetcher failure for `key` into the caller-facing error
    ///
    /// Transport-level timeouts surface as `NetworkTimeout`, same as the
    /// engine's own deadline.
    pub fn from_fetch(key: impl Into<String>, err: FetchError) -> Self {
        let key = key.into();
        match err {
            FetchError::Timeout(limit) => Self::NetworkTimeout { key, seconds: limit.as_secs() },
            other => Self::NetworkFailure { key, source: other },
        }
    }

    pub fn config(cache: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config { cache: cache.into(), message: message.into() }
    }

    /// Returns `true` for the two network kinds
    pub fn is_network(&self) -> bool {
        matches!(self, Self::NetworkTimeout { .. } | Self::NetworkFailure { .. })
    }
}

impl ErrorClassification for FetchError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout(_) => true,
            Self::Status { status } => *status >= 500 || *status == 429,
        }
    }

    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Warning
    }

    fn is_critical(&self) -> bool {
        false
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

impl ErrorClassification for StoreError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Io(_))
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Unavailable(_) => ErrorSeverity::Warning,
            Self::Io(_) | Self::Corrupt { .. } => ErrorSeverity::Error,
        }
    }

    fn is_critical(&self) -> bool {
        false
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

impl ErrorClassification for CacheError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::NetworkTimeout { .. } => true,
            Self::NetworkFailure { source, .. } => source.is_retryable(),
            Self::StoreUnavailable(inner) => inner.is_retryable(),
            Self::CacheMiss { .. } | Self::Config { .. } | Self::UnknownCache(_) => false,
        }
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::CacheMiss { .. } => ErrorSeverity::Info,
            Self::NetworkTimeout { .. } | Self::NetworkFailure { .. } => ErrorSeverity::Warning,
            Self::StoreUnavailable(inner) => inner.severity(),
            Self::Config { .. } | Self::UnknownCache(_) => ErrorSeverity::Error,
        }
    }

    fn is_critical(&self) -> bool {
        false
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::NetworkTimeout { seconds, .. } => Some(Duration::from_secs(*seconds)),
            _ => None,
        }
    }
}
