//! Conversions from external infrastructure errors into domain errors.

use std::io::{Error as IoError, ErrorKind};
use std::time::Duration;

use reqwest::Error as HttpError;
use tidepool_domain::{CacheError, FetchError, StoreError};

/// Name used as the `cache` field of configuration errors raised while loading
pub(crate) const CONFIG_SCOPE: &str = "config";

/// Map a `reqwest` failure into a fetcher error
///
/// Transport timeouts carry the client's configured `timeout`, since
/// `reqwest` does not report which limit fired.
pub trait IntoFetchError {
    fn into_fetch_error(self, timeout: Duration) -> FetchError;
}

/// Map an I/O failure into a blob store error
pub trait IntoStoreError {
    fn into_store_error(self) -> StoreError;
}

/// Map a parse failure into a configuration error
pub trait IntoConfigError {
    fn into_config_error(self) -> CacheError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → FetchError */
/* -------------------------------------------------------------------------- */

impl IntoFetchError for HttpError {
    fn into_fetch_error(self, timeout: Duration) -> FetchError {
        if self.is_timeout() {
            return FetchError::Timeout(timeout);
        }

        if let Some(status) = self.status() {
            return FetchError::Status { status: status.as_u16() };
        }

        #[cfg(not(target_arch = "wasm32"))]
        if self.is_connect() {
            return FetchError::Transport("HTTP connection failure".into());
        }

        if self.is_builder() {
            return FetchError::Transport(format!("invalid HTTP request: {self}"));
        }

        FetchError::Transport(self.to_string())
    }
}

/* -------------------------------------------------------------------------- */
/* std::io::Error → StoreError */
/* -------------------------------------------------------------------------- */

impl IntoStoreError for IoError {
    fn into_store_error(self) -> StoreError {
        match self.kind() {
            ErrorKind::PermissionDenied => {
                StoreError::Unavailable(format!("permission denied: {self}"))
            }
            ErrorKind::NotConnected | ErrorKind::BrokenPipe => {
                StoreError::Unavailable(self.to_string())
            }
            _ => StoreError::Io(self.to_string()),
        }
    }
}

/* -------------------------------------------------------------------------- */
/* toml / serde_json → CacheError */
/* -------------------------------------------------------------------------- */

impl IntoConfigError for toml::de::Error {
    fn into_config_error(self) -> CacheError {
        CacheError::config(CONFIG_SCOPE, format!("Invalid TOML format: {self}"))
    }
}

impl IntoConfigError for serde_json::Error {
    fn into_config_error(self) -> CacheError {
        CacheError::config(CONFIG_SCOPE, format!("Invalid JSON format: {self}"))
    }
}

impl IntoConfigError for IoError {
    fn into_config_error(self) -> CacheError {
        CacheError::config(CONFIG_SCOPE, format!("Failed to read config file: {self}"))
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
