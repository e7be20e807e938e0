use linux_embedded_hal::gpio_cdev;
use linux_embedded_hal::i2cdev::linux::LinuxI2CError;
use thiserror::Error;

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration from '{path}': {source}")]
    LoadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration format: {0}")]
    FormatError(#[from] toml::de::Error),

    #[error("Invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Failures while acquiring the bus and chip-select resources at startup.
/// Any of these terminates the process with exit code 1.
#[derive(Error, Debug)]
pub enum SetupError {
    #[error("Unsupported bus type '{bus_type}'")]
    UnsupportedBus { bus_type: String },

    #[error("Failed to open I2C device '{path}': {source}")]
    I2cOpen {
        path: String,
        #[source]
        source: LinuxI2CError,
    },

    #[error("Failed to open SPI device '{path}': {source}")]
    SpiOpen {
        path: String,
        #[source]
        source: linux_embedded_hal::SPIError,
    },

    #[error("Failed to configure SPI device: {0}")]
    SpiConfig(#[source] std::io::Error),

    #[error("Failed to acquire chip-select GPIO line: {0}")]
    ChipSelect(#[from] gpio_cdev::errors::Error),
}

/// Per-transfer failures reported by a bus adapter
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("I2C transfer failed: {0}")]
    I2c(String),

    #[error("SPI transfer failed: {0}")]
    Spi(String),

    #[error("Chip-select toggle failed: {0}")]
    ChipSelect(String),
}

/// Errors raised by the BME280 device layer
#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("Bus transfer failed: {0}")]
    Transport(#[from] TransportError),

    #[error("Unexpected chip id: expected {expected:#04x}, got {actual:#04x}")]
    WrongChipId { expected: u8, actual: u8 },
}

/// Result type aliases for convenience
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type SetupResult<T> = Result<T, SetupError>;
pub type TransportResult<T> = Result<T, TransportError>;
pub type DeviceResult<T> = Result<T, DeviceError>;
