pub mod bus_config;

pub use bus_config::{BusSection, I2cSettings, SpiSettings};

use crate::errors::{ConfigError, ConfigResult};
use serde::Deserialize;
use std::fs;

/// Root configuration for the monitor, loaded from `bme280.toml`
#[derive(Debug, Deserialize)]
pub struct DriverConfig {
    pub bus: BusSection,
    #[serde(default)]
    pub sampling: SamplingSection,
    #[serde(default)]
    pub output: OutputSection,
}

/// `[sampling]` section
#[derive(Debug, Default, Deserialize)]
pub struct SamplingSection {
    #[serde(default)]
    pub mode: SamplingMode,
}

/// `[output]` section
#[derive(Debug, Default, Deserialize)]
pub struct OutputSection {
    #[serde(default)]
    pub format: OutputFormat,
}

/// Sensor power-mode strategy for the polling loop
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SamplingMode {
    /// Free-running measurements at the configured standby interval
    #[default]
    Normal,
    /// One measurement per explicit trigger
    Forced,
}

/// Numeric representation used when printing readings
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Two-decimal floating point values
    #[default]
    Float,
    /// The sensor's fixed-point integer representations
    Integer,
}

/// Loads config from TOML file
pub fn load_config(path: &str) -> ConfigResult<DriverConfig> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::LoadError {
        path: path.to_string(),
        source: e,
    })?;
    let parsed: DriverConfig = toml::from_str(&content)?;
    Ok(parsed)
}
