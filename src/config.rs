/// Service configuration loader - parses climate_api.toml
///
/// Every setting has a default, so the file is optional. The values that
/// used to be baked into the query code (the most active station and the
/// lookback window) live here as named constants.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Station with the most observations in the dataset, picked by offline
/// analysis. The tobs route reports this station only.
pub const MOST_ACTIVE_STATION: &str = "USC00519397";

/// Lookback window of the precipitation and tobs routes. Two years, although
/// the routes are described as returning the "last year" of data.
pub const LOOKBACK_DAYS: i64 = 730;

/// Upper bound for `lookback_days` (roughly a thousand years).
pub const MAX_LOOKBACK_DAYS: i64 = 365_250;

/// SQLite data file, relative to the working directory.
pub const DEFAULT_DATABASE: &str = "Resources/hawaii.sqlite";

pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_WORKER_THREADS: usize = 4;

/// Config file looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "climate_api.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("failed to parse {0}: {1}")]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Runtime configuration for the API service.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub bind_address: String,
    pub port: u16,

    /// SQLite path (optionally `sqlite://`-prefixed) or a PostgreSQL URL.
    pub database: String,

    pub most_active_station: String,
    pub lookback_days: i64,

    /// Size of the request worker pool.
    pub worker_threads: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            port: DEFAULT_PORT,
            database: DEFAULT_DATABASE.to_string(),
            most_active_station: MOST_ACTIVE_STATION.to_string(),
            lookback_days: LOOKBACK_DAYS,
            worker_threads: DEFAULT_WORKER_THREADS,
        }
    }
}

impl ServiceConfig {
    /// Address string accepted by `tiny_http::Server::http`.
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    /// Applies `DATABASE_URL` when it is set and non-empty.
    pub fn with_database_url(mut self, database_url: Option<String>) -> Self {
        if let Some(url) = database_url.filter(|u| !u.trim().is_empty()) {
            self.database = url;
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker_threads == 0 {
            return Err(ConfigError::Invalid("worker_threads must be at least 1".into()));
        }
        if !(0..=MAX_LOOKBACK_DAYS).contains(&self.lookback_days) {
            return Err(ConfigError::Invalid(format!(
                "lookback_days must be between 0 and {}, got {}",
                MAX_LOOKBACK_DAYS, self.lookback_days
            )));
        }
        if self.most_active_station.trim().is_empty() {
            return Err(ConfigError::Invalid("most_active_station must not be empty".into()));
        }
        if self.database.trim().is_empty() {
            return Err(ConfigError::Invalid("database must not be empty".into()));
        }
        Ok(())
    }
}

/// Parses configuration from TOML text. `path` is only used in errors.
pub fn parse_config(contents: &str, path: &Path) -> Result<ServiceConfig, ConfigError> {
    let config: ServiceConfig =
        toml::from_str(contents).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
    config.validate()?;
    Ok(config)
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ServiceConfig, ConfigError> {
    let path = path.as_ref();
    let contents =
        fs::read_to_string(path).map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
    parse_config(&contents, path)
}

/// Loads the explicit config file if given, otherwise `climate_api.toml` when
/// present, otherwise the defaults. `DATABASE_URL` (from `.env` or the
/// environment) then overrides the database location.
pub fn load_service_config(explicit: Option<&Path>) -> Result<ServiceConfig, ConfigError> {
    let config = match explicit {
        Some(path) => load_config(path)?,
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => load_config(DEFAULT_CONFIG_FILE)?,
        None => ServiceConfig::default(),
    };

    dotenv::dotenv().ok();
    let config = config.with_database_url(std::env::var("DATABASE_URL").ok());
    config.validate()?;
    Ok(config)
}
