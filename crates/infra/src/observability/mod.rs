//! Tracing initialisation
//!
//! The engine only emits `tracing` events; installing a subscriber is the
//! host's call. [`init_tracing`] is the stock setup: an `EnvFilter` read from
//! `TIDEPOOL_LOG` and a plain or JSON fmt layer.

use tidepool_common::error::{CommonError, CommonResult};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the filter directives
pub const LOG_ENV_VAR: &str = "TIDEPOOL_LOG";

/// Filter used when neither `TIDEPOOL_LOG` nor an explicit filter is given
pub const DEFAULT_FILTER: &str = "info";

/// Output format of the fmt layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Resolve the filter directives
///
/// `TIDEPOOL_LOG` wins over `filter`; `filter` wins over [`DEFAULT_FILTER`].
pub fn resolve_filter(filter: Option<&str>) -> String {
    std::env::var(LOG_ENV_VAR)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .or_else(|| filter.map(str::to_string))
        .unwrap_or_else(|| DEFAULT_FILTER.to_string())
}

/// Install the global subscriber
///
/// Calling this again once a subscriber is installed is a no-op.
///
/// # Errors
///
/// Returns `CommonError::Config` if the filter directives do not parse.
pub fn init_tracing(filter: Option<&str>, format: LogFormat) -> CommonResult<()> {
    let directives = resolve_filter(filter);
    let env_filter = EnvFilter::try_new(&directives).map_err(|err| {
        CommonError::config_field(LOG_ENV_VAR, format!("invalid log filter '{directives}': {err}"))
    })?;

    let layer = tracing_subscriber::fmt::layer().with_target(true);
    let layer = match format {
        LogFormat::Pretty => layer.boxed(),
        LogFormat::Json => layer.json().flatten_event(true).with_current_span(true).boxed(),
    };

    let installed = tracing_subscriber::registry().with(layer.with_filter(env_filter)).try_init();
    if installed.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    //! Unit tests for observability.
    use super::*;

    #[test]
    fn test_explicit_filter_used_without_env() {
        std::env::remove_var(LOG_ENV_VAR);

        assert_eq!(resolve_filter(Some("tidepool_core=debug")), "tidepool_core=debug");
        assert_eq!(resolve_filter(None), DEFAULT_FILTER);
    }

    #[test]
    fn test_invalid_filter_is_rejected() {
        std::env::remove_var(LOG_ENV_VAR);

        let err = init_tracing(Some("tidepool=notalevel"), LogFormat::Pretty).unwrap_err();
        assert_eq!(err.error_type_name(), "config");
    }

    #[test]
    fn test_init_twice_is_harmless() {
        std::env::remove_var(LOG_ENV_VAR);

        init_tracing(Some("warn"), LogFormat::Json).unwrap();
        init_tracing(Some("warn"), LogFormat::Pretty).unwrap();
    }
}
