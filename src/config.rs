//! Engine configuration.
//!
//! Looked up in this order:
//! 1. the file named by `HEATSPOT_CONFIG`;
//! 2. `heatspot.toml` in the working directory;
//! 3. `heatspot/heatspot.toml` under the platform config directory;
//! 4. built-in defaults.
//!
//! Secrets are read from the environment (and a `.env` file) after the file is parsed.

use crate::scoring::classifier::DEFAULT_PERCENTILE_THRESHOLD;
use crate::weather_data::data_gov_sg::DEFAULT_DATA_GOV_BASE_URL;
use crate::weather_data::onemap::DEFAULT_ONEMAP_SEARCH_URL;
use crate::weather_data::retry::RetryPolicy;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const APP_NAME: &str = "heatspot";
pub const CONFIG_ENV_VAR: &str = "HEATSPOT_CONFIG";
pub const CONFIG_FILE_NAME: &str = "heatspot.toml";
pub const ONEMAP_KEY_ENV_VAR: &str = "ONEMAP_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{0}'")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse config file '{0}'")]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Where a configuration was loaded from.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    /// Named by the `HEATSPOT_CONFIG` environment variable.
    Explicit(PathBuf),
    CurrentDir(PathBuf),
    /// Under the platform config directory (`~/.config/heatspot/` on Linux).
    UserConfig(PathBuf),
    Defaults,
}

impl ConfigSource {
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigSource::Explicit(p) | ConfigSource::CurrentDir(p) | ConfigSource::UserConfig(p) => {
                Some(p.as_path())
            }
            ConfigSource::Defaults => None,
        }
    }
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.path() {
            Some(p) => write!(f, "{}", p.display()),
            None => write!(f, "(defaults)"),
        }
    }
}

/// Upstream API endpoints and request behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    pub data_gov_base_url: String,
    pub onemap_search_url: String,
    /// Bearer token for OneMap. `ONEMAP_KEY` in the environment takes precedence.
    pub onemap_key: Option<String>,
    /// Requests per upstream call, the first one included. Only transient failures retry.
    pub max_attempts: u32,
    /// Initial retry backoff.
    pub retry_delay_ms: u64,
    pub request_timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            data_gov_base_url: DEFAULT_DATA_GOV_BASE_URL.to_string(),
            onemap_search_url: DEFAULT_ONEMAP_SEARCH_URL.to_string(),
            onemap_key: None,
            max_attempts: 3,
            retry_delay_ms: 500,
            request_timeout_secs: 10,
        }
    }
}

impl UpstreamConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.retry_delay_ms))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeatspotConfig {
    /// Historical corpus CSV.
    pub corpus_path: PathBuf,
    /// Stations interpolated per query.
    pub station_count: usize,
    pub percentile_threshold: f64,
    pub snapshot_ttl_secs: u64,
    /// Restrict the historical baseline to dates within this many days of today's day of
    /// year. Unset compares against the whole corpus.
    pub seasonal_window_days: Option<u32>,
    pub upstream: UpstreamConfig,
}

impl Default for HeatspotConfig {
    fn default() -> Self {
        Self {
            corpus_path: PathBuf::from("data/weather_data_5years.csv"),
            station_count: 3,
            percentile_threshold: DEFAULT_PERCENTILE_THRESHOLD,
            snapshot_ttl_secs: 300,
            seasonal_window_days: None,
            upstream: UpstreamConfig::default(),
        }
    }
}

impl HeatspotConfig {
    /// Finds, parses, overrides from the environment and validates the configuration.
    pub fn load() -> Result<(Self, ConfigSource), ConfigError> {
        if let Ok(path) = dotenv::dotenv() {
            debug!("Loaded environment from {:?}", path);
        }
        let source = find_config_file(CONFIG_ENV_VAR, CONFIG_FILE_NAME);
        let mut config = load_config(&source)?;
        config.apply_env_overrides(|key| env::var(key).ok());
        config.validate()?;
        info!("Loaded configuration from {}", source);
        Ok((config, source))
    }

    /// Replaces secrets with values from `lookup`, typically the process environment.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup(ONEMAP_KEY_ENV_VAR).filter(|key| !key.is_empty()) {
            self.upstream.onemap_key = Some(key);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.station_count == 0 {
            return Err(ConfigError::Invalid(
                "station_count must be at least 1".to_string(),
            ));
        }
        if !(0.0..=100.0).contains(&self.percentile_threshold) {
            return Err(ConfigError::Invalid(format!(
                "percentile_threshold {} is outside [0, 100]",
                self.percentile_threshold
            )));
        }
        if self.upstream.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "upstream.max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn snapshot_ttl(&self) -> Duration {
        Duration::from_secs(self.snapshot_ttl_secs)
    }
}

/// Finds a configuration file, see the module docs for the search order.
pub fn find_config_file(env_var: &str, filename: &str) -> ConfigSource {
    if let Ok(path) = env::var(env_var) {
        let p = PathBuf::from(&path);
        if p.exists() {
            return ConfigSource::Explicit(p);
        }
    }

    let local = PathBuf::from(filename);
    if local.exists() {
        return ConfigSource::CurrentDir(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
        let user = config_dir.join(APP_NAME).join(filename);
        if user.exists() {
            return ConfigSource::UserConfig(user);
        }
    }

    ConfigSource::Defaults
}

/// Parses the file behind `source`, or returns the defaults when there is none.
pub fn load_config(source: &ConfigSource) -> Result<HeatspotConfig, ConfigError> {
    match source.path() {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
            toml::from_str(&content).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))
        }
        None => Ok(HeatspotConfig::default()),
    }
}
