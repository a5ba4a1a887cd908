//! Configuration loading and validation for the health service daemon

use health_service::HealthServiceConfig;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use validator::{Validate, ValidationError, ValidationErrors};

/// Environment variable overriding the node identity
pub const NODE_NAME_ENV: &str = "NODE_NAME";

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(#[from] validator::ValidationErrors),
}

impl From<ConfigError> for common::Error {
    fn from(err: ConfigError) -> Self {
        common::Error::config(err)
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Health evaluation and scheduling settings
    #[serde(default)]
    pub health: HealthServiceConfig,

    #[serde(default)]
    pub shutdown: ShutdownSettings,

    #[serde(default)]
    pub logging: LoggingSettings,

    #[serde(default)]
    pub monitors: Vec<TcpMonitorSettings>,
}

impl Validate for Config {
    fn validate(&self) -> Result<(), validator::ValidationErrors> {
        validate_health(&self.health)?;
        for monitor in &self.monitors {
            monitor.validate()?;
        }
        Ok(())
    }
}

/// Shutdown policy
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShutdownSettings {
    /// Exit the process if the scheduler does not stop in time
    #[serde(default)]
    pub exit_on_failure: bool,
}

/// Logging settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingSettings {
    pub level: Option<String>,
    pub format: Option<String>,
}

/// A TCP endpoint to monitor
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TcpMonitorSettings {
    #[validate(length(min = 1))]
    pub name: String,

    #[validate(length(min = 1))]
    pub metric_name: String,

    pub address: SocketAddr,

    #[serde(with = "humantime_serde")]
    #[validate(custom = "validate_probe_timeout")]
    pub timeout: Duration,

    #[serde(default, with = "humantime_serde")]
    pub cache_ttl: Duration,

    #[serde(default)]
    pub restart_on_failure: bool,

    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

// Custom validators

fn validate_health(health: &HealthServiceConfig) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if health.node_name.trim().is_empty() {
        errors.add("node_name", ValidationError::new("node_name_empty"));
    }
    if health.failure_retry_threshold > 1000 {
        errors.add(
            "failure_retry_threshold",
            ValidationError::new("failure_retry_threshold_out_of_range"),
        );
    }
    if let Err(e) = validate_failure_retry_interval(&health.failure_retry_interval) {
        errors.add("failure_retry_interval", e);
    }
    if let Err(e) = validate_retry_interval(&health.retry_interval) {
        errors.add("retry_interval", e);
    }
    if let Err(e) = validate_shutdown_buffer(&health.shutdown_buffer) {
        errors.add("shutdown_buffer", e);
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

fn validate_failure_retry_interval(interval: &Duration) -> Result<(), ValidationError> {
    if interval.as_millis() > 60_000 {
        return Err(ValidationError::new("failure_retry_interval_out_of_range"));
    }
    Ok(())
}

fn validate_retry_interval(interval: &Duration) -> Result<(), ValidationError> {
    let millis = interval.as_millis();
    if millis < 1 || millis > 3_600_000 {
        return Err(ValidationError::new("retry_interval_out_of_range"));
    }
    Ok(())
}

fn validate_shutdown_buffer(buffer: &Duration) -> Result<(), ValidationError> {
    let millis = buffer.as_millis();
    if millis < 1 || millis > 300_000 {
        return Err(ValidationError::new("shutdown_buffer_out_of_range"));
    }
    Ok(())
}

fn validate_probe_timeout(timeout: &Duration) -> Result<(), ValidationError> {
    if timeout.is_zero() {
        return Err(ValidationError::new("probe_timeout_zero"));
    }
    Ok(())
}

// Configuration loading implementation

impl Config {
    /// Load configuration from default search paths
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match Self::find_config_file() {
            Some(path) => Self::load_from_file(&path)?,
            None => Self::default(),
        };
        config.apply_node_override(std::env::var(NODE_NAME_ENV).ok());
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&contents)
    }

    /// Parse and validate a YAML document
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Replace the node name when an override is present and non-empty
    pub fn apply_node_override(&mut self, node_name: Option<String>) {
        if let Some(node_name) = node_name.filter(|n| !n.trim().is_empty()) {
            self.health.node_name = node_name;
        }
    }

    /// Path of the file `load` would read, if any
    pub fn find_config_file() -> Option<PathBuf> {
        let mut paths = vec![PathBuf::from("/etc/health-service/config.yaml")];

        if let Some(home_path) = Self::home_config_path() {
            paths.push(home_path);
        }

        paths.push(PathBuf::from("./health-service.yaml"));

        paths.into_iter().find(|p: &PathBuf| p.exists() && p.is_file())
    }

    /// Get home directory config path
    fn home_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".config/health-service/config.yaml"))
    }
}
