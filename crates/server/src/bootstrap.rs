use std::sync::Arc;

use axum::{middleware, Router};
use coffeebot_core::config::AppConfig;
use coffeebot_db::{connect_with_settings, migrations, DbPool};
use coffeebot_slack::{SlackClient, SlackError};
use thiserror::Error;
use tracing::info;

use crate::service::{CoffeeService, Repositories};
use crate::{health, routes};

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub service: Arc<CoffeeService>,
}

impl Application {
    /// Coffee routes and `/health`, with request logging on both.
    pub fn router(&self) -> Router {
        routes::router(self.service.clone())
            .merge(health::router(self.db_pool.clone()))
            .layer(middleware::from_fn(routes::log_requests))
    }
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("slack client setup failed: {0}")]
    Slack(#[from] SlackError),
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let slack = SlackClient::from_config(&config.slack)?;
    let service = CoffeeService::new(Repositories::sql(db_pool.clone()), Arc::new(slack));

    Ok(Application { config, db_pool, service: Arc::new(service) })
}
