mod calib;

use crate::bus::Transport;
use crate::errors::{DeviceError, DeviceResult};
use bitflags::bitflags;
use calib::Calibration;
use tracing::debug;

/// Value of the id register on every BME280
pub const CHIP_ID: u8 = 0x60;

const REG_ID: u8 = 0xD0;
const REG_RESET: u8 = 0xE0;
const REG_CTRL_HUM: u8 = 0xF2;
const REG_CTRL_MEAS: u8 = 0xF4;
const REG_CONFIG: u8 = 0xF5;
const REG_PRESS_MSB: u8 = 0xF7;

const REG_CALIB1: u8 = 0x88;
const REG_CALIB2: u8 = 0xE1;

const RESET_CMD: u8 = 0xB6;
const RESET_SETTLE_MS: u64 = 5;

/// Per-quantity oversampling rate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Oversampling {
    Skipped,
    X1,
    X2,
    X4,
    X8,
    X16,
}

impl Oversampling {
    fn bits(self) -> u8 {
        match self {
            Oversampling::Skipped => 0b000,
            Oversampling::X1 => 0b001,
            Oversampling::X2 => 0b010,
            Oversampling::X4 => 0b011,
            Oversampling::X8 => 0b100,
            Oversampling::X16 => 0b101,
        }
    }
}

/// IIR filter coefficient
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    Off,
    X2,
    X4,
    X8,
    X16,
}

impl Filter {
    fn bits(self) -> u8 {
        match self {
            Filter::Off => 0b000,
            Filter::X2 => 0b001,
            Filter::X4 => 0b010,
            Filter::X8 => 0b011,
            Filter::X16 => 0b100,
        }
    }
}

/// Normal-mode standby interval between measurement cycles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandbyTime {
    Micros500,
    Millis62_5,
    Millis125,
    Millis250,
    Millis500,
    Millis1000,
    Millis10,
    Millis20,
}

impl StandbyTime {
    fn bits(self) -> u8 {
        match self {
            StandbyTime::Micros500 => 0b000,
            StandbyTime::Millis62_5 => 0b001,
            StandbyTime::Millis125 => 0b010,
            StandbyTime::Millis250 => 0b011,
            StandbyTime::Millis500 => 0b100,
            StandbyTime::Millis1000 => 0b101,
            StandbyTime::Millis10 => 0b110,
            StandbyTime::Millis20 => 0b111,
        }
    }
}

/// Sensor power mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Sleep,
    Forced,
    Normal,
}

impl Mode {
    fn bits(self) -> u8 {
        match self {
            Mode::Sleep => 0b00,
            Mode::Forced => 0b01,
            Mode::Normal => 0b11,
        }
    }
}

bitflags! {
    /// Which fields `apply_settings` should write, mirroring the selector
    /// mask of the Bosch vendor API.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SettingsSelector: u8 {
        const OSR_HUM = 1;
        const OSR_PRESS = 1 << 1;
        const OSR_TEMP = 1 << 2;
        const FILTER = 1 << 3;
        const STANDBY = 1 << 4;
    }
}

/// Oversampling, filter, and standby configuration.
///
/// The default is the Bosch "indoor navigation" profile the original demo
/// used: humidity x1, pressure x16, temperature x2, filter coefficient 16,
/// standby 62.5 ms.
#[derive(Debug, Clone, Copy)]
pub struct Settings {
    pub osr_humidity: Oversampling,
    pub osr_pressure: Oversampling,
    pub osr_temperature: Oversampling,
    pub filter: Filter,
    pub standby: StandbyTime,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            osr_humidity: Oversampling::X1,
            osr_pressure: Oversampling::X16,
            osr_temperature: Oversampling::X2,
            filter: Filter::X16,
            standby: StandbyTime::Millis62_5,
        }
    }
}

/// One set of compensated readings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurements {
    pub temperature_c: f32,
    pub pressure_hpa: f32,
    pub humidity_pct: f32,
}

/// BME280 device handle over a runtime-selected transport.
///
/// Owns the transport for its whole lifetime; compensation coefficients
/// are loaded once by [`Bme280::init`] and reused for every read.
pub struct Bme280 {
    transport: Box<dyn Transport>,
    calibration: Calibration,
}

impl Bme280 {
    pub fn new(transport: Box<dyn Transport>) -> Self {
        Self {
            transport,
            calibration: Calibration::default(),
        }
    }

    /// Probes the chip id, soft-resets the device, and loads both
    /// calibration blocks.
    pub async fn init(&mut self) -> DeviceResult<()> {
        let id = self.read_register(REG_ID).await?;
        if id != CHIP_ID {
            return Err(DeviceError::WrongChipId {
                expected: CHIP_ID,
                actual: id,
            });
        }

        self.transport
            .write_registers(REG_RESET, &[RESET_CMD])
            .await?;
        self.transport.delay_ms(RESET_SETTLE_MS).await;

        let mut block1 = [0u8; calib::BLOCK1_LEN];
        let mut block2 = [0u8; calib::BLOCK2_LEN];
        self.transport.read_registers(REG_CALIB1, &mut block1).await?;
        self.transport.read_registers(REG_CALIB2, &mut block2).await?;
        self.calibration = Calibration::parse(&block1, &block2);
        debug!("[bme280] chip id ok, calibration loaded");
        Ok(())
    }

    /// Writes the selected settings fields, leaving the others untouched.
    /// A humidity oversampling change only latches on the next ctrl_meas
    /// write, so one is issued whenever ctrl_hum changes.
    pub async fn apply_settings(
        &mut self,
        settings: &Settings,
        selector: SettingsSelector,
    ) -> DeviceResult<()> {
        if selector.contains(SettingsSelector::OSR_HUM) {
            self.transport
                .write_registers(REG_CTRL_HUM, &[settings.osr_humidity.bits()])
                .await?;
            let meas = self.read_register(REG_CTRL_MEAS).await?;
            self.transport
                .write_registers(REG_CTRL_MEAS, &[meas])
                .await?;
        }

        if selector.intersects(SettingsSelector::OSR_PRESS | SettingsSelector::OSR_TEMP) {
            let mut meas = self.read_register(REG_CTRL_MEAS).await?;
            if selector.contains(SettingsSelector::OSR_PRESS) {
                meas = (meas & !0b0001_1100) | (settings.osr_pressure.bits() << 2);
            }
            if selector.contains(SettingsSelector::OSR_TEMP) {
                meas = (meas & !0b1110_0000) | (settings.osr_temperature.bits() << 5);
            }
            self.transport
                .write_registers(REG_CTRL_MEAS, &[meas])
                .await?;
        }

        if selector.intersects(SettingsSelector::FILTER | SettingsSelector::STANDBY) {
            let mut config = self.read_register(REG_CONFIG).await?;
            if selector.contains(SettingsSelector::FILTER) {
                config = (config & !0b0001_1100) | (settings.filter.bits() << 2);
            }
            if selector.contains(SettingsSelector::STANDBY) {
                config = (config & !0b1110_0000) | (settings.standby.bits() << 5);
            }
            self.transport
                .write_registers(REG_CONFIG, &[config])
                .await?;
        }

        Ok(())
    }

    /// Switches the power mode, preserving the oversampling bits.
    pub async fn set_mode(&mut self, mode: Mode) -> DeviceResult<()> {
        let meas = self.read_register(REG_CTRL_MEAS).await?;
        self.transport
            .write_registers(REG_CTRL_MEAS, &[(meas & !0b11) | mode.bits()])
            .await?;
        Ok(())
    }

    /// Burst-reads the data block and returns compensated readings.
    pub async fn read_measurements(&mut self) -> DeviceResult<Measurements> {
        let mut raw = [0u8; 8];
        self.transport
            .read_registers(REG_PRESS_MSB, &mut raw)
            .await?;

        let adc_p = ((raw[0] as i32) << 12) | ((raw[1] as i32) << 4) | ((raw[2] as i32) >> 4);
        let adc_t = ((raw[3] as i32) << 12) | ((raw[4] as i32) << 4) | ((raw[5] as i32) >> 4);
        let adc_h = ((raw[6] as i32) << 8) | (raw[7] as i32);

        let (temperature_c, t_fine) = self.calibration.compensate_temperature(adc_t);
        let pressure_hpa = self.calibration.compensate_pressure(adc_p, t_fine);
        let humidity_pct = self.calibration.compensate_humidity(adc_h, t_fine);

        Ok(Measurements {
            temperature_c,
            pressure_hpa,
            humidity_pct,
        })
    }

    /// Delay routed through the transport, as the vendor callback contract
    /// specifies.
    pub async fn delay_ms(&mut self, period: u64) {
        self.transport.delay_ms(period).await;
    }

    async fn read_register(&mut self, reg: u8) -> DeviceResult<u8> {
        let mut buf = [0u8; 1];
        self.transport.read_registers(reg, &mut buf).await?;
        Ok(buf[0])
    }
}
