//! Bootstrap configuration loading
//!
//! Settings resolve in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing TOML file is not an error: the service starts on environment
//! variables and defaults alone.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 3000;

/// Default bind address
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";

/// Default blob container for uploaded recordings
pub const DEFAULT_CONTAINER: &str = "bird-audios";

/// Default timeout for the outbound inference call
pub const DEFAULT_INFERENCE_TIMEOUT_SECS: u64 = 30;

/// Server-side upload ceiling (50 MiB)
pub const SERVER_MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

/// Client-side pre-check ceiling (10 MiB)
pub const CLIENT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Bootstrap configuration loaded from TOML file
///
/// Every field is optional so a partial file only overrides what it names.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TomlConfig {
    /// HTTP server port
    #[serde(default)]
    pub port: Option<u16>,

    /// Address the HTTP listener binds to
    #[serde(default)]
    pub bind_address: Option<String>,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub inference: InferenceConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub limits: LimitsConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Remote inference endpoint settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct InferenceConfig {
    /// Prediction endpoint URL; absent means synthetic-only mode
    pub endpoint: Option<String>,
    /// Bearer credential sent with each prediction request
    pub api_key: Option<String>,
    /// "synthetic" (mask upstream failures) or "surface" (return them)
    pub fallback: Option<String>,
    /// Outbound request timeout in seconds
    pub timeout_secs: Option<u64>,
}

/// Durable audio storage settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Azure storage connection string
    pub connection_string: Option<String>,
    /// Blob container name
    pub container: Option<String>,
    /// Local directory used instead of Azure when set
    pub local_path: Option<PathBuf>,
}

/// Reference catalog settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CatalogConfig {
    /// sqlx database URL, e.g. `sqlite://birds.db?mode=rwc`
    pub database_url: Option<String>,
    /// JSON file of reference facts loaded at startup
    pub seed_file: Option<PathBuf>,
}

/// Upload size ceilings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LimitsConfig {
    pub server_max_bytes: Option<u64>,
    pub client_max_bytes: Option<u64>,
}

/// Load TOML bootstrap config, falling back to defaults when the file is absent
///
/// Runs before the tracing subscriber exists (the log level lives in this
/// file), so it does not log; callers report which file was used.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)?;
    let config: TomlConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Resolve config file path: CLI argument, then environment variable, then platform default
pub fn resolve_config_path(cli_arg: Option<&Path>, env_var_name: &str) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Some(path) = env_value(env_var_name) {
        return PathBuf::from(path);
    }

    default_config_path()
}

/// Platform default config file location (`~/.config/birdcall/config.toml` on Linux)
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("birdcall").join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("birdcall.toml"))
}

/// Read an environment variable, treating empty or whitespace values as unset
pub fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .filter(|v| is_present(v))
}

/// Validate a setting value (non-empty, non-whitespace)
pub fn is_present(value: &str) -> bool {
    !value.trim().is_empty()
}

/// Resolve a string setting from environment and TOML tiers
///
/// Environment wins over TOML. Warns when both are set, since that usually
/// means a stale value in one of them. Returns `None` when neither is usable.
pub fn resolve_setting(
    setting: &str,
    env_var_name: &str,
    toml_value: Option<&str>,
) -> Option<String> {
    let env = env_value(env_var_name);
    let toml = toml_value.filter(|v| is_present(v)).map(str::to_string);

    if env.is_some() && toml.is_some() {
        warn!(
            "{} found in both environment ({}) and TOML. Using environment.",
            setting, env_var_name
        );
    }

    match (env, toml) {
        (Some(v), _) => {
            info!("{} loaded from environment variable", setting);
            Some(v)
        }
        (None, Some(v)) => {
            info!("{} loaded from TOML config", setting);
            Some(v)
        }
        (None, None) => None,
    }
}

/// Parse a numeric setting value, naming the setting in the error
pub fn parse_setting<T>(setting: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| Error::Config(format!("Invalid value for {}: {}", setting, e)))
}
