use crate::error::ExporterError;
use anyhow::{Context, Result};
use secrecy::SecretString;
use serde::Deserialize;

/// Exporter configuration.
///
/// Only `devices` is required in the configuration file; every other section
/// falls back to its defaults. Credentials never come from the file, they are
/// supplied through the environment (see `main.rs`).
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub devices: Vec<DeviceConfig>,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub polling: PollingConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    pub name: String,
    pub ip_address: String,
}

/// Account used to open a session on every device.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_addr")]
    pub addr: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PollingConfig {
    #[serde(default = "default_interval")]
    pub interval_seconds: u64,
    #[serde(default = "default_prefix")]
    pub metric_prefix: String,
}

fn default_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8086
}

fn default_interval() -> u64 {
    3
}

fn default_prefix() -> String {
    "tapo".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            port: default_port(),
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_interval(),
            metric_prefix: default_prefix(),
        }
    }
}

impl Config {
    /// Load the device file at `path` (JSON), layered with `TAPO_EXPORTER__*`
    /// environment overrides, and validate the result.
    pub fn load(path: &str) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::new(path, config::FileFormat::Json))
            .add_source(config::Environment::with_prefix("TAPO_EXPORTER").separator("__"))
            .build()
            .with_context(|| format!("Failed to read configuration from {}", path))?;

        let config: Config = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the exporter cannot start with.
    pub fn validate(&self) -> std::result::Result<(), ExporterError> {
        if self.devices.is_empty() {
            return Err(ExporterError::Config("No devices configured".to_string()));
        }

        for (index, device) in self.devices.iter().enumerate() {
            if device.name.trim().is_empty() {
                return Err(ExporterError::Config(format!(
                    "Device #{} has an empty name",
                    index
                )));
            }
            if device.ip_address.trim().is_empty() {
                return Err(ExporterError::Config(format!(
                    "Device '{}' has an empty ip_address",
                    device.name
                )));
            }
        }

        if self.polling.interval_seconds == 0 {
            return Err(ExporterError::Config(
                "polling.interval_seconds must be greater than zero".to_string(),
            ));
        }

        if self.polling.metric_prefix.trim().is_empty() {
            return Err(ExporterError::Config(
                "polling.metric_prefix must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}
