//! Configuration loading and validation for the health server

use crate::types::ServerConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use validator::{Validate, ValidationError};

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
        match err {
            ConfigError::IoError(e) => common::Error::Io(e),
            other => common::Error::config(other),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub proxy: ProxySettings,

    #[serde(default)]
    pub metrics: MetricsSettings,

    #[serde(default)]
    pub logging: LoggingSettings,

    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

impl Validate for Config {
    fn validate(&self) -> Result<(), validator::ValidationErrors> {
        self.server.validate()?;
        self.logging.validate()?;
        self.telemetry.validate()?;
        Ok(())
    }
}

/// Probe listener settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ServerSettings {
    #[validate(length(min = 1), custom = "validate_listen_addr")]
    pub listen_addr: String,

    #[serde(with = "humantime_serde")]
    #[validate(custom = "validate_shutdown_timeout")]
    pub shutdown_timeout: Duration,
}

/// Settings describing the proxy whose health is reported
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxySettings {
    /// Maximum concurrent connections (0 = unlimited)
    pub max_connections: u64,
}

/// Prometheus endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsSettings {
    pub enabled: bool,
}

/// Logging settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: Option<String>,

    #[validate(custom = "validate_log_format")]
    pub format: Option<String>,
}

/// OpenTelemetry export settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct TelemetrySettings {
    pub enabled: bool,

    #[validate(length(min = 1))]
    pub service_name: String,

    #[validate(length(min = 1))]
    pub otlp_endpoint: String,
}

// Default implementations

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8090".to_string(),
            shutdown_timeout: Duration::from_secs(5),
        }
    }
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            enabled: false,
            service_name: "health-server".to_string(),
            otlp_endpoint: "http://localhost:4317".to_string(),
        }
    }
}

impl LoggingSettings {
    pub fn is_json(&self) -> bool {
        self.format.as_deref() == Some("json")
    }
}

// Custom validators

fn validate_listen_addr(addr: &str) -> Result<(), ValidationError> {
    let Some((host, port)) = addr.trim().rsplit_once(':') else {
        return Err(ValidationError::new("listen_addr_missing_port"));
    };

    if host.is_empty() {
        return Err(ValidationError::new("listen_addr_missing_host"));
    }

    if port.parse::<u16>().is_err() {
        return Err(ValidationError::new("listen_addr_invalid_port"));
    }

    Ok(())
}

fn validate_shutdown_timeout(timeout: &Duration) -> Result<(), ValidationError> {
    let millis = timeout.as_millis();
    if millis < 1 || millis > 60_000 {
        return Err(ValidationError::new("shutdown_timeout_out_of_range"));
    }
    Ok(())
}

fn validate_log_format(format: &str) -> Result<(), ValidationError> {
    match format {
        "text" | "json" => Ok(()),
        _ => Err(ValidationError::new("log_format_unknown")),
    }
}

// Configuration loading implementation

impl Config {
    /// Load configuration from default search paths
    pub fn load() -> Result<Self, ConfigError> {
        match Self::find_config_file() {
            Some(path) => {
                tracing::info!("Loading configuration from: {}", path.display());
                Self::load_from_file(&path)
            }
            None => {
                tracing::info!("No configuration file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&contents)
    }

    /// Parse and validate configuration from a YAML document
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let mut paths = vec![PathBuf::from("/etc/proxy-health/health-server.yaml")];

        if let Some(home_path) = Self::home_config_path() {
            paths.push(home_path);
        }

        paths.push(PathBuf::from("./health-server.yaml"));

        paths.into_iter().find(|p| p.is_file())
    }

    /// Get home directory config path
    fn home_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".config/proxy-health/health-server.yaml"))
    }

    /// Convert to the runtime ServerConfig
    pub fn to_server_config(&self) -> ServerConfig {
        ServerConfig {
            listen_addr: self.server.listen_addr.trim().to_string(),
            shutdown_timeout: self.server.shutdown_timeout,
            max_connections: self.proxy.max_connections,
            metrics_enabled: self.metrics.enabled,
        }
    }
}
