use serde::Deserialize;

/// `[bus]` section: which transport to use and how to open it.
#[derive(Debug, Deserialize)]
pub struct BusSection {
    #[serde(rename = "type")]
    pub r#type: String, // 'type' is a reserved word in Rust, use raw identifier
    #[serde(default)]
    pub i2c: I2cSettings,
    #[serde(default)]
    pub spi: SpiSettings,
}

/// `[bus.i2c]` settings, defaulting to the Raspberry Pi primary bus
/// with the BME280 secondary address.
#[derive(Debug, Deserialize)]
pub struct I2cSettings {
    #[serde(default = "default_i2c_path")]
    pub path: String,
    #[serde(default = "default_i2c_address")]
    pub address: u8,
}

/// `[bus.spi]` settings: spidev device, clock, SPI mode, and the GPIO
/// line driven as manual chip-select.
#[derive(Debug, Deserialize)]
pub struct SpiSettings {
    #[serde(default = "default_spi_path")]
    pub path: String,
    #[serde(default = "default_spi_speed")]
    pub speed_hz: u32,
    #[serde(default)]
    pub mode: u8,
    #[serde(default = "default_gpio_chip")]
    pub gpio_chip: String,
    #[serde(default = "default_cs_line")]
    pub cs_line: u32,
}

fn default_i2c_path() -> String {
    "/dev/i2c-1".to_string()
}

fn default_i2c_address() -> u8 {
    0x77
}

fn default_spi_path() -> String {
    "/dev/spidev0.0".to_string()
}

fn default_spi_speed() -> u32 {
    2_000_000
}

fn default_gpio_chip() -> String {
    "/dev/gpiochip0".to_string()
}

fn default_cs_line() -> u32 {
    27
}

impl Default for I2cSettings {
    fn default() -> Self {
        Self {
            path: default_i2c_path(),
            address: default_i2c_address(),
        }
    }
}

impl Default for SpiSettings {
    fn default() -> Self {
        Self {
            path: default_spi_path(),
            speed_hz: default_spi_speed(),
            mode: 0,
            gpio_chip: default_gpio_chip(),
            cs_line: default_cs_line(),
        }
    }
}
