//! Configuration loader
//!
//! Loads [`EngineConfig`] from a file, then applies environment overrides.
//!
//! ## Loading Strategy
//! 1. Use the explicit path if one is given, otherwise probe the standard
//!    locations
//! 2. Fall back to the built-in defaults when no file exists
//! 3. Apply `TIDEPOOL_*` environment overrides
//! 4. Validate the result
//!
//! ## Environment Variables
//! - `TIDEPOOL_<CACHE>_VERSION`: Version tag of a named cache
//! - `TIDEPOOL_<CACHE>_MAX_AGE_SECONDS`: Max age of a named cache
//! - `TIDEPOOL_<CACHE>_MAX_ENTRIES`: Entry bound of a named cache
//! - `TIDEPOOL_<CACHE>_NETWORK_TIMEOUT_SECONDS`: Network timeout of a named cache
//! - `TIDEPOOL_CLEANUP_INTERVAL_SECONDS`: Cleanup period (`0` disables it)
//! - `TIDEPOOL_CLEANUP_ON_STARTUP`: Whether `init` runs the sweeps (true/false)
//!
//! `<CACHE>` is the upper-cased cache name, so `clinical` reads
//! `TIDEPOOL_CLINICAL_MAX_AGE_SECONDS`. Overrides only touch caches that
//! already exist in the loaded configuration.
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./tidepool.toml` or `./tidepool.json` (current working directory)
//! 2. `./config/tidepool.toml` or `./config/tidepool.json`
//! 3. Relative to executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use tidepool_domain::{CacheError, EngineConfig, Result};

use crate::errors::conversions::CONFIG_SCOPE;
use crate::errors::IntoConfigError;

const ENV_PREFIX: &str = "TIDEPOOL";

/// Load configuration with automatic fallback strategy
///
/// Probes the standard locations, falls back to defaults, then applies
/// environment overrides.
///
/// # Errors
/// Returns `CacheError::Config` if a file exists but is invalid, an
/// override does not parse, or the result fails validation.
pub fn load() -> Result<EngineConfig> {
    let base = match probe_config_paths() {
        Some(path) => read_config_file(&path)?,
        None => {
            tracing::debug!("No config file found, using built-in defaults");
            EngineConfig::default()
        }
    };

    finish(base)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations and fails when none
/// exists. Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `CacheError::Config` if:
/// - File not found
/// - File format is invalid
/// - An environment override does not parse
/// - Validation fails
pub fn load_from_file(path: Option<PathBuf>) -> Result<EngineConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(CacheError::config(
                    CONFIG_SCOPE,
                    format!("Config file not found: {}", p.display()),
                ));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            CacheError::config(CONFIG_SCOPE, "No config file found in any of the standard locations")
        })?,
    };

    finish(read_config_file(&config_path)?)
}

/// Parse configuration from string content
///
/// `format` is `"toml"` or `"json"`. No environment overrides are applied.
///
/// # Errors
/// Returns `CacheError::Config` if the format is unsupported or parsing fails.
pub fn parse_config(contents: &str, format: &str) -> Result<EngineConfig> {
    match format {
        "toml" => toml::from_str(contents).map_err(IntoConfigError::into_config_error),
        "json" => serde_json::from_str(contents).map_err(IntoConfigError::into_config_error),
        _ => Err(CacheError::config(CONFIG_SCOPE, format!("Unsupported config format: {format}"))),
    }
}

/// Apply `TIDEPOOL_*` overrides to `config`
///
/// # Errors
/// Returns `CacheError::Config` if an override is set but does not parse.
pub fn apply_env_overrides(config: &mut EngineConfig) -> Result<()> {
    for (name, cache) in &mut config.caches {
        let prefix = format!("{ENV_PREFIX}_{}", name.to_ascii_uppercase());

        if let Some(version) = env_string(&format!("{prefix}_VERSION")) {
            cache.version = version;
        }
        if let Some(max_age) = env_parse(&format!("{prefix}_MAX_AGE_SECONDS"))? {
            cache.max_age_seconds = max_age;
        }
        if let Some(max_entries) = env_parse(&format!("{prefix}_MAX_ENTRIES"))? {
            cache.max_entries = max_entries;
        }
        if let Some(timeout) = env_parse(&format!("{prefix}_NETWORK_TIMEOUT_SECONDS"))? {
            cache.network_timeout_seconds = timeout;
        }
    }

    if let Some(interval) = env_parse::<u64>(&format!("{ENV_PREFIX}_CLEANUP_INTERVAL_SECONDS"))? {
        config.cleanup.interval_seconds = (interval > 0).then_some(interval);
    }
    if let Some(on_startup) = env_bool(&format!("{ENV_PREFIX}_CLEANUP_ON_STARTUP")) {
        config.cleanup.run_on_startup = on_startup;
    }

    Ok(())
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    // Try current working directory
    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(candidate_files(&cwd));
    }

    // Try relative to executable
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(candidate_files(exe_dir));
        }
    }

    // Return first existing candidate
    candidates.into_iter().find(|path| path.exists())
}

fn candidate_files(dir: &Path) -> [PathBuf; 4] {
    [
        dir.join("tidepool.toml"),
        dir.join("tidepool.json"),
        dir.join("config/tidepool.toml"),
        dir.join("config/tidepool.json"),
    ]
}

fn read_config_file(path: &Path) -> Result<EngineConfig> {
    tracing::info!(path = %path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(path).map_err(IntoConfigError::into_config_error)?;
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    parse_config(&contents, extension)
}

fn finish(mut config: EngineConfig) -> Result<EngineConfig> {
    apply_env_overrides(&mut config)?;
    config.validate()?;
    tracing::info!(caches = config.caches.len(), "Configuration loaded");
    Ok(config)
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_string(key)
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|e| {
                CacheError::config(CONFIG_SCOPE, format!("Invalid value for {key}: {e}"))
            })
        })
        .transpose()
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str) -> Option<bool> {
    env_string(key).map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}
