use super::Transport;
use crate::config::SpiSettings;
use crate::errors::{SetupError, SetupResult, TransportError, TransportResult};
use async_trait::async_trait;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;
use linux_embedded_hal::gpio_cdev::{Chip, LineRequestFlags};
use linux_embedded_hal::spidev::{SpiModeFlags, SpidevOptions};
use linux_embedded_hal::{CdevPin, SpidevBus};

/// Bit 7 of the register address selects the transfer direction on the
/// BME280 SPI protocol: set for reads, clear for writes.
const READ_FLAG: u8 = 0x80;
const WRITE_MASK: u8 = 0x7F;

const CS_CONSUMER: &str = "bme280-cs";

/// SPI transport adapter with a GPIO line as manual chip-select.
///
/// A read is a 1-byte address phase followed by the data phase; a write is
/// one contiguous frame of address plus payload. Chip-select is held low
/// for the strict span of one transfer and released again on the error
/// path as well.
pub struct SpiTransport<B, P> {
    bus: B,
    cs: P,
}

impl SpiTransport<SpidevBus, CdevPin> {
    /// Opens a Linux spidev device and requests the chip-select GPIO line
    /// as an output initialized high (deselected).
    pub fn open(settings: &SpiSettings) -> SetupResult<Self> {
        let mut chip = Chip::new(&settings.gpio_chip)?;
        let line = chip.get_line(settings.cs_line)?;
        let handle = line.request(LineRequestFlags::OUTPUT, 1, CS_CONSUMER)?;
        let cs = CdevPin::new(handle)?;

        let mut bus = SpidevBus::open(&settings.path).map_err(|e| SetupError::SpiOpen {
            path: settings.path.clone(),
            source: e,
        })?;
        let mode = match settings.mode {
            1 => SpiModeFlags::SPI_MODE_1,
            2 => SpiModeFlags::SPI_MODE_2,
            3 => SpiModeFlags::SPI_MODE_3,
            _ => SpiModeFlags::SPI_MODE_0,
        };
        let options = SpidevOptions::new()
            .bits_per_word(8)
            .max_speed_hz(settings.speed_hz)
            .mode(mode)
            .build();
        bus.0.configure(&options).map_err(SetupError::SpiConfig)?;

        Ok(Self::new(bus, cs))
    }
}

impl<B, P> SpiTransport<B, P>
where
    B: SpiBus + Send,
    P: OutputPin + Send,
{
    pub fn new(bus: B, cs: P) -> Self {
        Self { bus, cs }
    }

    fn select(&mut self) -> TransportResult<()> {
        self.cs
            .set_low()
            .map_err(|e| TransportError::ChipSelect(format!("{e:?}")))
    }

    fn deselect(&mut self) -> TransportResult<()> {
        self.cs
            .set_high()
            .map_err(|e| TransportError::ChipSelect(format!("{e:?}")))
    }

    fn transfer_read(&mut self, cmd: u8, buf: &mut [u8]) -> TransportResult<()> {
        self.bus
            .write(&[cmd])
            .and_then(|_| self.bus.read(buf))
            .and_then(|_| self.bus.flush())
            .map_err(|e| TransportError::Spi(format!("{e:?}")))
    }

    fn transfer_write(&mut self, frame: &[u8]) -> TransportResult<()> {
        self.bus
            .write(frame)
            .and_then(|_| self.bus.flush())
            .map_err(|e| TransportError::Spi(format!("{e:?}")))
    }
}

#[async_trait]
impl<B, P> Transport for SpiTransport<B, P>
where
    B: SpiBus + Send,
    P: OutputPin + Send,
{
    async fn read_registers(&mut self, reg: u8, buf: &mut [u8]) -> TransportResult<()> {
        self.select()?;
        let result = self.transfer_read(reg | READ_FLAG, buf);
        self.deselect()?;
        result
    }

    async fn write_registers(&mut self, reg: u8, data: &[u8]) -> TransportResult<()> {
        let mut frame = Vec::with_capacity(data.len() + 1);
        frame.push(reg & WRITE_MASK);
        frame.extend_from_slice(data);

        self.select()?;
        let result = self.transfer_write(&frame);
        self.deselect()?;
        result
    }
}
