mod bootstrap;
mod error;
mod health;
mod routes;
mod service;
#[cfg(test)]
mod test_support;

use std::time::Duration;

use anyhow::Result;
use coffeebot_core::config::{AppConfig, LoadOptions};

fn init_logging(config: &AppConfig) {
    use coffeebot_core::config::LogFormat::*;
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
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;
    let address = app.config.listen_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;

    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        bind_address = %address,
        "coffeebot-server listening"
    );

    axum::serve(listener, app.router()).with_graceful_shutdown(wait_for_shutdown()).await?;

    tracing::info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        "coffeebot-server stopping"
    );

    let grace = Duration::from_secs(app.config.server.graceful_shutdown_secs);
    if tokio::time::timeout(grace, app.db_pool.close()).await.is_err() {
        tracing::warn!(
            event_name = "system.server.pool_close_timeout",
            correlation_id = "shutdown",
            "database pool did not close within the shutdown grace period"
        );
    }

    Ok(())
}

async fn wait_for_shutdown() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(
            event_name = "system.server.signal_error",
            correlation_id = "shutdown",
            error = %error,
            "could not listen for ctrl-c"
        );
        std::future::pending::<()>().await;
    }
}
