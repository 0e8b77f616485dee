mod api;
mod bootstrap;
mod health;
mod poller;

use std::time::Duration;

use anyhow::Result;
use dinebot_core::config::{AppConfig, LoadOptions};

fn init_logging(config: &AppConfig) {
    use dinebot_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Logging depends on the loaded config, so load it first.
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;
    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);

    let poller = match (&app.components.worker, app.config.server.worker_poll_secs) {
        (Some(worker), secs) if secs > 0 => {
            Some(poller::spawn(worker.clone(), Duration::from_secs(secs)))
        }
        _ => None,
    };

    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        bind_address = %address,
        background_worker = poller.is_some(),
        "dinebot-server started"
    );
    let router = api::router(app.components.into());
    api::serve(&address, router, wait_for_shutdown()).await?;

    if let Some(handle) = poller {
        handle.abort();
    }
    tracing::info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        "dinebot-server stopping"
    );
    Ok(())
}

async fn wait_for_shutdown() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(
            event_name = "system.server.signal_failed",
            correlation_id = "shutdown",
            error = %error,
            "could not listen for shutdown signal"
        );
    }
}
