use std::fs::OpenOptions;
use std::sync::{Arc, Mutex};

use color_eyre::eyre::{eyre, Result};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::calendar::{Aggregator, HomeAssistantClient};
use crate::config::Config;

/// Log to a file in the cache dir; the terminal belongs to the TUI.
pub fn init_logging() -> Result<()> {
    let Some(dir) = dirs::cache_dir().map(|d| d.join("ha-agenda")) else {
        return Ok(());
    };
    std::fs::create_dir_all(&dir)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("ha-agenda.log"))?;

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,reqwest=warn")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| eyre!("Failed to set up logging: {}", e))?;

    Ok(())
}

/// Load the config and wire the aggregator to Home Assistant.
pub fn build_aggregator() -> Result<Aggregator> {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Failed to load configuration");
            return Err(e.into());
        }
    };
    info!(
        url = %config.connection.url,
        calendars = config.display.sources.len(),
        "Configuration loaded"
    );

    let client = HomeAssistantClient::new(&config.connection)?;
    Ok(Aggregator::new(Arc::new(client), Arc::new(config.display)))
}
