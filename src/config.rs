//! Service configuration loader - parses dzmeteo.toml
//!
//! Keeps tunables (API endpoint, timeout, fetch concurrency, refresh
//! interval, alert thresholds, city registry file) out of the code so they
//! can be adjusted without recompiling. Every section is optional and
//! falls back to the built-in defaults.

use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::alert::Thresholds;
use crate::cities::CityRegistry;

/// Default configuration file, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "dzmeteo.toml";

/// Environment variable (also read from `.env`) naming a config file.
pub const CONFIG_ENV_VAR: &str = "DZMETEO_CONFIG";

pub const DEFAULT_API_BASE_URL: &str = "https://api.open-meteo.com/v1/forecast";

/// Startup configuration errors. All of them are fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {message}")]
    Read { path: String, message: String },

    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },

    #[error("invalid thresholds: {0}")]
    Thresholds(String),

    #[error("invalid setting: {0}")]
    Invalid(String),

    #[error("invalid city registry: {0}")]
    Registry(String),
}

/// Open-Meteo API settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_secs: 20,
        }
    }
}

/// National aggregation settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Maximum simultaneous forecast requests during a national refresh.
    pub concurrency: usize,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self { concurrency: 6 }
    }
}

/// Daemon settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// Minutes between automatic national refreshes. 0 disables the loop.
    pub poll_interval_minutes: u64,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            poll_interval_minutes: 30,
        }
    }
}

/// Optional override of the built-in city list.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub path: Option<PathBuf>,
}

/// Root configuration structure for TOML parsing.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub api: ApiConfig,
    pub aggregation: AggregationConfig,
    pub daemon: DaemonConfig,
    pub thresholds: Thresholds,
    pub registry: RegistryConfig,
}

impl ServiceConfig {
    /// Parses and validates a configuration document.
    pub fn from_toml_str(contents: &str, origin: &str) -> Result<Self, ConfigError> {
        let config: ServiceConfig = toml::from_str(contents).map_err(|e| ConfigError::Parse {
            path: origin.to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a configuration file.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&contents, &path.display().to_string())
    }

    /// Resolves the configuration the way the binary does:
    ///
    /// 1. an explicit path (`--config`), which must exist;
    /// 2. `DZMETEO_CONFIG` from the environment or `.env`, which must exist;
    /// 3. `dzmeteo.toml` in the working directory, if present;
    /// 4. built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        if let Some(path) = explicit {
            return Self::load_file(path);
        }
        if let Ok(path) = env::var(CONFIG_ENV_VAR) {
            return Self::load_file(Path::new(&path));
        }
        let default_path = Path::new(DEFAULT_CONFIG_FILE);
        if default_path.exists() {
            return Self::load_file(default_path);
        }

        tracing::debug!("no {} found, using built-in defaults", DEFAULT_CONFIG_FILE);
        Ok(Self::default())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.thresholds.validate().map_err(ConfigError::Thresholds)?;

        if self.aggregation.concurrency == 0 {
            return Err(ConfigError::Invalid(
                "aggregation.concurrency must be at least 1".to_string(),
            ));
        }
        if self.api.timeout_secs == 0 {
            return Err(ConfigError::Invalid("api.timeout_secs must be at least 1".to_string()));
        }
        if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://") {
            return Err(ConfigError::Invalid(format!(
                "api.base_url must be an http(s) URL, got '{}'",
                self.api.base_url
            )));
        }
        Ok(())
    }

    /// Loads the city registry: the configured file, or the built-in list.
    pub fn load_registry(&self) -> Result<CityRegistry, ConfigError> {
        match &self.registry.path {
            Some(path) => CityRegistry::load(path),
            None => Ok(CityRegistry::builtin()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
