use crate::bme280::{Bme280, Measurements, Mode, Settings, SettingsSelector};
use crate::config::{OutputFormat, SamplingMode};
use crate::errors::DeviceResult;
use tokio::sync::watch;
use tracing::info;

/// Fixed wait after triggering a forced measurement, long enough for the
/// indoor-navigation oversampling profile to complete.
const FORCED_CYCLE_DELAY_MS: u64 = 40;
/// Inter-read delay while the sensor free-runs in normal mode.
const NORMAL_CYCLE_DELAY_MS: u64 = 70;

/// Configures the device for the selected sampling mode, then prints one
/// reading per cycle until the shutdown channel fires.
pub async fn stream(
    dev: &mut Bme280,
    mode: SamplingMode,
    format: OutputFormat,
    mut shutdown: watch::Receiver<bool>,
) -> DeviceResult<()> {
    let settings = Settings::default();
    match mode {
        SamplingMode::Forced => {
            let selector = SettingsSelector::OSR_HUM
                | SettingsSelector::OSR_PRESS
                | SettingsSelector::OSR_TEMP
                | SettingsSelector::FILTER;
            dev.apply_settings(&settings, selector).await?;
        }
        SamplingMode::Normal => {
            dev.apply_settings(&settings, SettingsSelector::all()).await?;
            dev.set_mode(Mode::Normal).await?;
        }
    }
    info!("[stream] streaming in {:?} mode", mode);

    println!("Temperature           Pressure             Humidity");
    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                info!("[stream] shutdown requested, stopping");
                return Ok(());
            }
            cycle = poll_cycle(dev, mode) => {
                let readings = cycle?;
                println!("{}", format_measurements(&readings, format));
            }
        }
    }
}

/// One polling iteration: trigger (forced) or wait out (normal) a
/// measurement, then fetch the compensated readings.
pub async fn poll_cycle(dev: &mut Bme280, mode: SamplingMode) -> DeviceResult<Measurements> {
    match mode {
        SamplingMode::Forced => {
            dev.set_mode(Mode::Forced).await?;
            dev.delay_ms(FORCED_CYCLE_DELAY_MS).await;
        }
        SamplingMode::Normal => {
            dev.delay_ms(NORMAL_CYCLE_DELAY_MS).await;
        }
    }
    dev.read_measurements().await
}

/// Renders one console line in the original demo's format.
pub fn format_measurements(m: &Measurements, format: OutputFormat) -> String {
    match format {
        OutputFormat::Float => format!(
            "temperature:{:.2}*C   pressure:{:.2}hPa   humidity:{:.2}%",
            m.temperature_c, m.pressure_hpa, m.humidity_pct
        ),
        // Fixed-point: 0.01 degC units, whole hPa, whole percent
        OutputFormat::Integer => format!(
            "temperature:{}*C   pressure:{}hPa   humidity:{}%",
            (m.temperature_c * 100.0).round() as i64,
            m.pressure_hpa.round() as i64,
            m.humidity_pct.round() as i64
        ),
    }
}
