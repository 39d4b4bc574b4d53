use std::sync::Arc;

use focal_agent::{build_registry, AgentRuntime, HttpAssistantClient, RegistryError};
use focal_core::config::{AppConfig, ConfigError, LoadOptions};
use focal_core::errors::ToolError;
use focal_db::{connect_with_settings, migrations, DbPool};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub agent_runtime: Arc<AgentRuntime>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("assistant client setup failed: {0}")]
    AssistantClient(#[source] ToolError),
    #[error("tool registry wiring failed: {0}")]
    Registry(#[from] RegistryError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
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

    let assistant = HttpAssistantClient::new(config.assistant.clone())
        .map_err(BootstrapError::AssistantClient)?;
    let registry = build_registry(db_pool.clone(), Arc::new(assistant))?;
    info!(
        event_name = "system.bootstrap.registry_built",
        correlation_id = "bootstrap",
        tool_count = registry.len(),
        "agent tool registry built"
    );

    Ok(Application {
        config,
        db_pool,
        agent_runtime: Arc::new(AgentRuntime::new(registry)),
    })
}
