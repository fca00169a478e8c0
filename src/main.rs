//! EV slot booking service
//!
//! Reads configuration from TOML (~/.config/ev-slot-booking/config.toml,
//! or the path in EV_BOOKING_CONFIG), keeps the time slot window rolling
//! and waits for SIGINT/SIGTERM.

use std::path::PathBuf;

use tracing::{error, info};

use ev_slot_booking::config::{AppConfig, LoggingConfig};
use ev_slot_booking::server::{init_tracing, ServerHandle, ServerOptions};
use ev_slot_booking::default_config_path;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ── Load configuration ─────────────────────────────────────
    let config_path = std::env::var("EV_BOOKING_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| default_config_path());

    let config = match AppConfig::load(&config_path) {
        Ok(cfg) => {
            init_tracing(&cfg.logging);
            info!("Configuration loaded from {}", config_path.display());
            cfg
        }
        Err(e) => {
            init_tracing(&LoggingConfig::default());
            error!("Failed to load config: {}. Using defaults.", e);
            AppConfig::default()
        }
    };

    let handle = match ServerHandle::start(ServerOptions {
        config,
        ..Default::default()
    })
    .await
    {
        Ok(handle) => handle,
        Err(e) => {
            error!("Failed to start: {}", e);
            return Err(e.into());
        }
    };

    handle.install_signal_handler();
    info!("Press Ctrl+C to shutdown gracefully.");
    handle.run_until_shutdown().await;
    Ok(())
}
