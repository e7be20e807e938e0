use bme280_monitor::{init_tracing, run};
use tracing::error;

#[tokio::main]
async fn main() {
    // RUST_LOG=debug for verbose, RUST_LOG=info for normal, RUST_LOG=warn for production
    init_tracing();

    // Load configuration from CONFIG_PATH or default
    let config_path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config".to_string());
    let config_file = format!("{}/bme280.toml", config_path);

    if let Err(e) = run(&config_file).await {
        error!("[bme280-monitor] fatal: {}", e);
        std::process::exit(1);
    }
}
