//! Drives the device layer end to end against a simulated BME280
//! register file populated with the Bosch datasheet trimming example.

use async_trait::async_trait;
use bme280_monitor::bme280::{Bme280, Mode, Settings, SettingsSelector};
use bme280_monitor::errors::{DeviceError, TransportResult};
use bme280_monitor::Transport;
use std::sync::{Arc, Mutex};

struct SimState {
    registers: [u8; 256],
    writes: Vec<(u8, Vec<u8>)>,
    delays: Vec<u64>,
}

struct SimTransport {
    state: Arc<Mutex<SimState>>,
}

#[async_trait]
impl Transport for SimTransport {
    async fn read_registers(&mut self, reg: u8, buf: &mut [u8]) -> TransportResult<()> {
        let state = self.state.lock().unwrap();
        for (i, byte) in buf.iter_mut().enumerate() {
            *byte = state.registers[reg as usize + i];
        }
        Ok(())
    }

    async fn write_registers(&mut self, reg: u8, data: &[u8]) -> TransportResult<()> {
        let mut state = self.state.lock().unwrap();
        for (i, byte) in data.iter().enumerate() {
            state.registers[reg as usize + i] = *byte;
        }
        state.writes.push((reg, data.to_vec()));
        Ok(())
    }

    async fn delay_ms(&mut self, period: u64) {
        self.state.lock().unwrap().delays.push(period);
    }
}

fn simulated_device(chip_id: u8) -> (Bme280, Arc<Mutex<SimState>>) {
    let mut registers = [0u8; 256];
    registers[0xD0] = chip_id;

    // Calibration block 1 (0x88..=0xA1), datasheet trimming example
    let block1_start = 0x88usize;
    let tp_coefficients: [i32; 12] = [
        27504, 26435, -1000, // T1..T3
        36477, -10685, 3024, 2855, 140, -7, 15500, -14600, 6000, // P1..P9
    ];
    for (i, value) in tp_coefficients.iter().enumerate() {
        let bytes = (*value as u16).to_le_bytes();
        registers[block1_start + 2 * i] = bytes[0];
        registers[block1_start + 2 * i + 1] = bytes[1];
    }
    registers[block1_start + 25] = 75; // H1

    // Calibration block 2 (0xE1..=0xE7): H2=353, H3=0, H4=339, H5=0, H6=30
    registers[0xE1] = 0x61;
    registers[0xE2] = 0x01;
    registers[0xE3] = 0x00;
    registers[0xE4] = 0x15;
    registers[0xE5] = 0x03;
    registers[0xE6] = 0x00;
    registers[0xE7] = 30;

    // Raw data block: adc_p=415148, adc_t=519888, adc_h=32768
    registers[0xF7..0xFF].copy_from_slice(&[0x65, 0x5A, 0xC0, 0x7E, 0xED, 0x00, 0x80, 0x00]);

    let state = Arc::new(Mutex::new(SimState {
        registers,
        writes: Vec::new(),
        delays: Vec::new(),
    }));
    let transport = SimTransport {
        state: state.clone(),
    };
    (Bme280::new(Box::new(transport)), state)
}

#[tokio::test]
async fn init_settings_and_read_full_cycle() {
    let (mut dev, state) = simulated_device(0x60);

    dev.init().await.unwrap();
    dev.apply_settings(&Settings::default(), SettingsSelector::all())
        .await
        .unwrap();
    dev.set_mode(Mode::Normal).await.unwrap();

    {
        let state = state.lock().unwrap();
        // Soft reset, then the settle delay
        assert!(state.writes.contains(&(0xE0, vec![0xB6])));
        assert_eq!(state.delays, vec![5]);
        // Indoor-navigation profile: hum x1, press x16 / temp x2, filter 16
        // + standby 62.5 ms, normal mode
        assert_eq!(state.registers[0xF2], 0x01);
        assert_eq!(state.registers[0xF4], 0x57);
        assert_eq!(state.registers[0xF5], 0x30);
    }

    let m = dev.read_measurements().await.unwrap();
    assert!((m.temperature_c - 25.08).abs() < 0.005);
    assert!((m.pressure_hpa - 1006.5325).abs() < 0.01);
    assert!((m.humidity_pct - 60.4805).abs() < 0.01);
}

#[tokio::test]
async fn init_rejects_wrong_chip_id() {
    let (mut dev, state) = simulated_device(0x58);

    let err = dev.init().await.unwrap_err();
    assert!(matches!(
        err,
        DeviceError::WrongChipId {
            expected: 0x60,
            actual: 0x58,
        }
    ));
    // Probe failure must not reach the reset register
    assert!(state.lock().unwrap().writes.is_empty());
}

#[tokio::test]
async fn partial_selector_leaves_other_fields_untouched() {
    let (mut dev, state) = simulated_device(0x60);
    dev.init().await.unwrap();
    dev.apply_settings(&Settings::default(), SettingsSelector::all())
        .await
        .unwrap();

    // Change only the filter; oversampling and standby must survive.
    let mut settings = Settings::default();
    settings.filter = bme280_monitor::bme280::Filter::Off;
    dev.apply_settings(&settings, SettingsSelector::FILTER)
        .await
        .unwrap();

    let state = state.lock().unwrap();
    assert_eq!(state.registers[0xF4], 0x54);
    assert_eq!(state.registers[0xF5], 0x20);
}
