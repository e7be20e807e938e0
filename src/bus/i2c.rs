use super::Transport;
use crate::config::I2cSettings;
use crate::errors::{SetupError, SetupResult, TransportError, TransportResult};
use async_trait::async_trait;
use embedded_hal::i2c::I2c;
use linux_embedded_hal::I2cdev;

/// I2C transport adapter.
///
/// A register read is a one-byte address write followed by the data read,
/// issued as a single combined transaction; a register write is one
/// contiguous write of the address followed by the payload. Bus errors are
/// propagated to the caller.
pub struct I2cTransport<D> {
    dev: D,
    address: u8,
}

impl I2cTransport<I2cdev> {
    /// Opens a Linux i2cdev device file (e.g. `/dev/i2c-1`).
    pub fn open(settings: &I2cSettings) -> SetupResult<Self> {
        let dev = I2cdev::new(&settings.path).map_err(|e| SetupError::I2cOpen {
            path: settings.path.clone(),
            source: e,
        })?;
        Ok(Self::new(dev, settings.address))
    }
}

impl<D> I2cTransport<D> {
    pub fn new(dev: D, address: u8) -> Self {
        Self { dev, address }
    }
}

#[async_trait]
impl<D> Transport for I2cTransport<D>
where
    D: I2c + Send,
{
    async fn read_registers(&mut self, reg: u8, buf: &mut [u8]) -> TransportResult<()> {
        self.dev
            .write_read(self.address, &[reg], buf)
            .map_err(|e| TransportError::I2c(format!("{e:?}")))
    }

    async fn write_registers(&mut self, reg: u8, data: &[u8]) -> TransportResult<()> {
        let mut frame = Vec::with_capacity(data.len() + 1);
        frame.push(reg);
        frame.extend_from_slice(data);
        self.dev
            .write(self.address, &frame)
            .map_err(|e| TransportError::I2c(format!("{e:?}")))
    }
}
