use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::models::UpdateEmptinessPolicy;

/// Prefix for every service setting read from the environment
pub const ENV_PREFIX: &str = "FOODS";

/// Unprefixed variable holding the document-store connection string
pub const DB_CONNECTION_VAR: &str = "DB_CONNECTION";

/// Environment snapshot used in place of the process environment
pub type EnvSource = config::Map<String, String>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading error: {message}")]
    LoadError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Environment variable missing: {name}")]
    MissingEnvironmentVariable { name: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_max_request_size")]
    pub max_request_size: usize,
    #[serde(default = "default_update_emptiness")]
    pub update_emptiness: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(skip)]
    pub connection: String,
    #[serde(default = "default_table_name")]
    pub table_name: String,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default = "default_create_table")]
    pub create_table: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_service_version")]
    pub service_version: String,
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub enable_json_logging: bool,
}

/// Where the document store lives, decoded from `DB_CONNECTION`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConnection {
    /// `memory://`: in-process store, lost on restart
    Memory,
    /// `http(s)://host[:port]`: a DynamoDB-compatible endpoint
    DynamoDb { endpoint: String },
}

impl StoreConnection {
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let trimmed = raw.trim();
        let (scheme, rest) = trimmed
            .split_once("://")
            .ok_or_else(|| ConfigError::ValidationError {
                message: format!("{} must be a URL, got \"{}\"", DB_CONNECTION_VAR, raw),
            })?;

        match scheme.to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreConnection::Memory),
            "http" | "https" if !rest.is_empty() => Ok(StoreConnection::DynamoDb {
                endpoint: trimmed.trim_end_matches('/').to_string(),
            }),
            "http" | "https" => Err(ConfigError::ValidationError {
                message: format!("{} is missing a host", DB_CONNECTION_VAR),
            }),
            other => Err(ConfigError::ValidationError {
                message: format!(
                    "Unsupported {} scheme \"{}\" (expected http, https or memory)",
                    DB_CONNECTION_VAR, other
                ),
            }),
        }
    }
}

impl Config {
    /// Load configuration from the process environment
    pub fn from_environment() -> Result<Self, ConfigError> {
        info!("Loading configuration from environment");
        Self::from_source(None, std::env::var(DB_CONNECTION_VAR).ok())
    }

    /// Load configuration from an explicit environment snapshot.
    ///
    /// `None` reads the process environment.
    pub fn from_source(
        source: Option<EnvSource>,
        connection: Option<String>,
    ) -> Result<Self, ConfigError> {
        let settings = load_settings(source)?;

        let server: ServerConfig = deserialize(&settings, "server")?;
        let mut database: DatabaseConfig = deserialize(&settings, "database")?;
        let observability: ObservabilityConfig = deserialize(&settings, "observability")?;

        database.connection = connection
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvironmentVariable {
                name: DB_CONNECTION_VAR.to_string(),
            })?;

        let config = Config {
            server,
            database,
            observability,
        };

        config.validate()?;

        info!("Configuration loaded successfully");
        debug!("Configuration: {:?}", config);

        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError {
                message: "Server port cannot be 0".to_string(),
            });
        }

        if self.server.max_request_size == 0 {
            return Err(ConfigError::ValidationError {
                message: "Maximum request size cannot be 0".to_string(),
            });
        }

        self.server.update_emptiness_policy()?;

        if self.database.table_name.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                message: "Table name cannot be empty".to_string(),
            });
        }

        self.database.store_connection()?;

        Ok(())
    }
}

impl ServerConfig {
    pub fn update_emptiness_policy(&self) -> Result<UpdateEmptinessPolicy, ConfigError> {
        self.update_emptiness
            .parse()
            .map_err(|message| ConfigError::ValidationError { message })
    }
}

impl DatabaseConfig {
    pub fn store_connection(&self) -> Result<StoreConnection, ConfigError> {
        StoreConnection::parse(&self.connection)
    }

    /// In-memory database settings, mostly for tests and local runs
    pub fn in_memory() -> Self {
        Self {
            connection: "memory://".to_string(),
            table_name: default_table_name(),
            region: default_region(),
            create_table: default_create_table(),
        }
    }
}

fn load_settings(source: Option<EnvSource>) -> Result<config::Config, ConfigError> {
    config::Config::builder()
        .add_source(config::Environment::with_prefix(ENV_PREFIX).source(source))
        .build()
        .map_err(|e| ConfigError::LoadError {
            message: format!("Failed to load configuration: {}", e),
        })
}

fn deserialize<T: DeserializeOwned>(
    settings: &config::Config,
    section: &str,
) -> Result<T, ConfigError> {
    settings
        .clone()
        .try_deserialize()
        .map_err(|e| ConfigError::LoadError {
            message: format!("Failed to deserialize {} config: {}", section, e),
        })
}

// Default value functions
pub(crate) fn default_host() -> String {
    "0.0.0.0".to_string()
}

pub(crate) fn default_port() -> u16 {
    3000
}

pub(crate) fn default_max_request_size() -> usize {
    1024 * 1024 // 1MB
}

pub(crate) fn default_update_emptiness() -> String {
    UpdateEmptinessPolicy::default().to_string()
}

pub(crate) fn default_table_name() -> String {
    "foods".to_string()
}

pub(crate) fn default_region() -> String {
    "us-east-1".to_string()
}

pub(crate) fn default_create_table() -> bool {
    true
}

pub(crate) fn default_service_name() -> String {
    "foods-api".to_string()
}

pub(crate) fn default_service_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

pub(crate) fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests;
