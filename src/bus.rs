pub mod i2c;
pub mod spi;

use crate::config::BusSection;
use crate::errors::{SetupError, SetupResult, TransportResult};
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::sleep;

/// Bus type enum for the two supported transports
#[derive(Debug, Clone)]
pub enum BusType {
    I2c,
    Spi,
}

impl BusType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "i2c" => Some(BusType::I2c),
            "spi" => Some(BusType::Spi),
            _ => None,
        }
    }
}

/// Register-level contract the device layer drives: raw byte transfers
/// against a register address, plus a millisecond delay. Exactly one
/// adapter exists per process, selected from configuration at startup.
#[async_trait]
pub trait Transport: Send {
    /// Reads `buf.len()` bytes starting at register `reg`.
    async fn read_registers(&mut self, reg: u8, buf: &mut [u8]) -> TransportResult<()>;

    /// Writes `data` starting at register `reg`.
    async fn write_registers(&mut self, reg: u8, data: &[u8]) -> TransportResult<()>;

    /// Blocks the current task for `period` milliseconds.
    async fn delay_ms(&mut self, period: u64) {
        sleep(Duration::from_millis(period)).await;
    }
}

/// Opens the transport selected by the `[bus]` configuration section.
pub fn open_transport(cfg: &BusSection) -> SetupResult<Box<dyn Transport>> {
    match BusType::from_str(&cfg.r#type) {
        Some(BusType::I2c) => Ok(Box::new(i2c::I2cTransport::open(&cfg.i2c)?)),
        Some(BusType::Spi) => Ok(Box::new(spi::SpiTransport::open(&cfg.spi)?)),
        None => Err(SetupError::UnsupportedBus {
            bus_type: cfg.r#type.clone(),
        }),
    }
}
