// Public modules
pub mod bme280;
pub mod bus;
pub mod config;
pub mod errors;
pub mod stream;

// Re-export commonly used types
pub use bme280::{Bme280, Measurements, Mode, Settings, SettingsSelector};
pub use bus::{open_transport, Transport};
pub use config::{load_config, DriverConfig};
pub use errors::{ConfigError, DeviceError, SetupError, TransportError};
pub use stream::stream;

use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Initialize tracing with default configuration. Diagnostics go to
/// stderr so the reading lines on stdout stay machine-readable.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_writer(std::io::stderr)
        .init();
}

/// Run the monitor with the given configuration file until Ctrl-C.
pub async fn run(config_file: &str) -> Result<(), Box<dyn std::error::Error>> {
    info!("[bme280-monitor] starting up...");

    let config = load_config(config_file)?;
    info!(
        "[config] bus type '{}', {:?} sampling, {:?} output",
        config.bus.r#type, config.sampling.mode, config.output.format
    );

    let transport = open_transport(&config.bus)?;
    let mut dev = Bme280::new(transport);
    dev.init().await?;
    info!("[bme280] device initialized");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(true);
        }
    });

    stream::stream(
        &mut dev,
        config.sampling.mode,
        config.output.format,
        shutdown_rx,
    )
    .await?;

    info!("[bme280-monitor] stopped");
    Ok(())
}
