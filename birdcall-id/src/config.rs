//! Service configuration for birdcall-id
//!
//! Resolves the bootstrap TOML, environment variables and command-line
//! overrides into one immutable [`ServiceConfig`] (CLI > ENV > TOML >
//! default). Constructed once in `main` and handed to constructors; nothing
//! reads the environment after startup.

use std::path::PathBuf;

use birdcall_common::config::{
    env_value, parse_setting, resolve_setting, TomlConfig, CLIENT_MAX_UPLOAD_BYTES,
    DEFAULT_BIND_ADDRESS, DEFAULT_CONTAINER, DEFAULT_INFERENCE_TIMEOUT_SECS, DEFAULT_PORT,
    SERVER_MAX_UPLOAD_BYTES,
};
use birdcall_common::{time, Error, Result};

use crate::services::{AudioLimits, FallbackPolicy, InferenceEndpoint, InferenceSettings};

pub const ENV_CONFIG: &str = "BIRDCALL_CONFIG";
pub const ENV_PORT: &str = "BIRDCALL_PORT";
pub const ENV_BIND: &str = "BIRDCALL_BIND";
pub const ENV_INFERENCE_ENDPOINT: &str = "ML_MODEL_ENDPOINT";
pub const ENV_INFERENCE_API_KEY: &str = "ML_MODEL_API_KEY";
pub const ENV_INFERENCE_FALLBACK: &str = "ML_MODEL_FALLBACK";
pub const ENV_INFERENCE_TIMEOUT: &str = "ML_MODEL_TIMEOUT_SECS";
pub const ENV_STORAGE_CONNECTION: &str = "AZURE_STORAGE_CONNECTION_STRING";
pub const ENV_STORAGE_CONTAINER: &str = "AZURE_STORAGE_CONTAINER_NAME";
pub const ENV_STORAGE_PATH: &str = "BIRDCALL_STORAGE_PATH";
pub const ENV_CATALOG_URL: &str = "BIRDCALL_CATALOG_URL";
pub const ENV_CATALOG_SEED: &str = "BIRDCALL_CATALOG_SEED";
pub const ENV_MAX_UPLOAD: &str = "BIRDCALL_MAX_UPLOAD_BYTES";

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub port: Option<u16>,
    pub bind_address: Option<String>,
}

/// Where accepted recordings are persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageTarget {
    Disabled,
    Azure {
        connection_string: String,
        container: String,
    },
    Local(PathBuf),
}

/// Reference catalog location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogSettings {
    pub database_url: String,
    pub seed_file: Option<PathBuf>,
}

/// Fully resolved service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub port: u16,
    pub bind_address: String,
    pub inference: InferenceSettings,
    pub storage: StorageTarget,
    pub catalog: Option<CatalogSettings>,
    pub server_limits: AudioLimits,
    pub client_limits: AudioLimits,
}

impl ServiceConfig {
    /// Resolve every setting from CLI, environment and TOML
    pub fn resolve(toml: &TomlConfig, cli: &CliOverrides) -> Result<Self> {
        let port = match cli.port {
            Some(port) => port,
            None => match env_value(ENV_PORT) {
                Some(value) => parse_setting("port", &value)?,
                None => toml.port.unwrap_or(DEFAULT_PORT),
            },
        };

        let bind_address = cli
            .bind_address
            .clone()
            .or_else(|| resolve_setting("bind_address", ENV_BIND, toml.bind_address.as_deref()))
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let server_max_bytes = match env_value(ENV_MAX_UPLOAD) {
            Some(value) => parse_setting("limits.server_max_bytes", &value)?,
            None => toml.limits.server_max_bytes.unwrap_or(SERVER_MAX_UPLOAD_BYTES),
        };
        let client_max_bytes = toml.limits.client_max_bytes.unwrap_or(CLIENT_MAX_UPLOAD_BYTES);
        if server_max_bytes == 0 {
            return Err(Error::Config(
                "limits.server_max_bytes must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            port,
            bind_address,
            inference: resolve_inference(toml)?,
            storage: resolve_storage(toml),
            catalog: resolve_catalog(toml),
            server_limits: AudioLimits::server().with_max_bytes(server_max_bytes),
            client_limits: AudioLimits::client().with_max_bytes(client_max_bytes),
        })
    }

    /// `host:port` for the listener
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

fn resolve_inference(toml: &TomlConfig) -> Result<InferenceSettings> {
    let endpoint = resolve_setting(
        "inference.endpoint",
        ENV_INFERENCE_ENDPOINT,
        toml.inference.endpoint.as_deref(),
    )
    .map(|url| InferenceEndpoint {
        url,
        api_key: resolve_setting(
            "inference.api_key",
            ENV_INFERENCE_API_KEY,
            toml.inference.api_key.as_deref(),
        ),
    });

    let fallback = match resolve_setting(
        "inference.fallback",
        ENV_INFERENCE_FALLBACK,
        toml.inference.fallback.as_deref(),
    ) {
        Some(value) => value.parse::<FallbackPolicy>().map_err(Error::Config)?,
        None => FallbackPolicy::default(),
    };

    let timeout_secs = match env_value(ENV_INFERENCE_TIMEOUT) {
        Some(value) => parse_setting("inference.timeout_secs", &value)?,
        None => toml
            .inference
            .timeout_secs
            .unwrap_or(DEFAULT_INFERENCE_TIMEOUT_SECS),
    };
    if timeout_secs == 0 {
        return Err(Error::Config(
            "inference.timeout_secs must be greater than zero".to_string(),
        ));
    }

    Ok(InferenceSettings {
        endpoint,
        fallback,
        timeout: time::secs_to_duration(timeout_secs),
    })
}

fn resolve_storage(toml: &TomlConfig) -> StorageTarget {
    let local_path = resolve_setting(
        "storage.local_path",
        ENV_STORAGE_PATH,
        toml.storage.local_path.as_ref().and_then(|p| p.to_str()),
    );
    if let Some(path) = local_path {
        return StorageTarget::Local(PathBuf::from(path));
    }

    match resolve_setting(
        "storage.connection_string",
        ENV_STORAGE_CONNECTION,
        toml.storage.connection_string.as_deref(),
    ) {
        Some(connection_string) => StorageTarget::Azure {
            connection_string,
            container: resolve_setting(
                "storage.container",
                ENV_STORAGE_CONTAINER,
                toml.storage.container.as_deref(),
            )
            .unwrap_or_else(|| DEFAULT_CONTAINER.to_string()),
        },
        None => StorageTarget::Disabled,
    }
}

fn resolve_catalog(toml: &TomlConfig) -> Option<CatalogSettings> {
    let database_url = resolve_setting(
        "catalog.database_url",
        ENV_CATALOG_URL,
        toml.catalog.database_url.as_deref(),
    )?;
    let seed_file = resolve_setting(
        "catalog.seed_file",
        ENV_CATALOG_SEED,
        toml.catalog.seed_file.as_ref().and_then(|p| p.to_str()),
    )
    .map(PathBuf::from);

    Some(CatalogSettings {
        database_url,
        seed_file,
    })
}
