use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;

use parley_backend::BackendConfig;
use crate::rate_limit::RateLimitPolicy;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub rate_limit: RateLimitPolicy,
    #[serde(default)]
    pub streams: StreamsConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub logging: LoggingConfig,

    // Secrets (from ENV only)
    #[serde(default)]
    pub mongodb_uri: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound on one request, streaming included
    #[serde(default = "default_max_duration_secs")]
    pub max_duration_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            max_duration_secs: default_max_duration_secs(),
        }
    }
}

fn default_max_duration_secs() -> u64 {
    60
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CorsConfig {
    pub enabled: bool,
    #[serde(default)]
    pub origins: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Mongodb,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default = "default_database")]
    pub database: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            database: default_database(),
        }
    }
}

fn default_database() -> String {
    "parley".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct StreamsConfig {
    /// Buffer streams so clients can reconnect to them
    #[serde(default = "default_resumable")]
    pub resumable: bool,
    /// How long a finished stream stays resumable
    #[serde(default = "default_retention_secs")]
    pub retention_secs: u64,
}

impl Default for StreamsConfig {
    fn default() -> Self {
        Self {
            resumable: default_resumable(),
            retention_secs: default_retention_secs(),
        }
    }
}

fn default_resumable() -> bool {
    true
}

fn default_retention_secs() -> u64 {
    300
}

/// Identity headers set by the authenticating proxy in front of the API
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_user_header")]
    pub user_header: String,
    #[serde(default = "default_user_type_header")]
    pub user_type_header: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            user_header: default_user_header(),
            user_type_header: default_user_type_header(),
        }
    }
}

fn default_user_header() -> String {
    "x-user-id".to_string()
}

fn default_user_type_header() -> String {
    "x-user-type".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (if ENV is set)
    /// 3. Environment variables, `PARLEY_` prefix with `__` between keys
    ///    (e.g. `PARLEY_SERVER__PORT`, `PARLEY_RATE_LIMIT__ENABLED`)
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let builder = ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("PARLEY")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;

        let mut cfg: Config = config.try_deserialize()?;

        // Load secrets from ENV (not in TOML)
        if cfg.storage.backend == StorageBackend::Mongodb {
            cfg.mongodb_uri = std::env::var("MONGODB_URI").map_err(|_| {
                ConfigError::Message("MONGODB_URI environment variable is required".to_string())
            })?;
        }

        Ok(cfg)
    }
}
