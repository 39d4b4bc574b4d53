use std::sync::Arc;

use crate::commands::CommandResult;
use focal_agent::{build_registry, HttpAssistantClient};
use focal_core::config::{AppConfig, LoadOptions};
use focal_db::{connect_with_settings, migrations};

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "tools",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "tools",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let result = runtime.block_on(async {
        let pool = connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let assistant = HttpAssistantClient::new(config.assistant.clone())
            .map_err(|error| ("assistant_client", error.to_string(), 6u8))?;
        let registry = build_registry(pool.clone(), Arc::new(assistant))
            .map_err(|error| ("registry", error.to_string(), 7u8))?;

        let catalog = serde_json::to_string_pretty(&registry.definitions())
            .map_err(|error| ("serialization", error.to_string(), 8u8))?;

        pool.close().await;
        Ok::<String, (&'static str, String, u8)>(catalog)
    });

    match result {
        Ok(catalog) => CommandResult { exit_code: 0, output: catalog },
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("tools", error_class, message, exit_code)
        }
    }
}
