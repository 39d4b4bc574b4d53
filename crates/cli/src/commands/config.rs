use secrecy::ExposeSecret;
use serde::Serialize;
use serde_json::json;

use focal_core::config::{AppConfig, LoadOptions, LogFormat};

#[derive(Debug, Serialize)]
struct ConfigReport {
    status: &'static str,
    config: serde_json::Value,
}

pub fn run() -> String {
    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            let report = ConfigReport { status: "ok", config: redacted_view(&config) };
            serde_json::to_string_pretty(&report)
                .unwrap_or_else(|error| format!("{{\"status\":\"error\",\"message\":\"{error}\"}}"))
        }
        Err(error) => serde_json::to_string_pretty(&json!({
            "status": "error",
            "message": error.to_string(),
        }))
        .unwrap_or_else(|error| format!("{{\"status\":\"error\",\"message\":\"{error}\"}}")),
    }
}

fn redacted_view(config: &AppConfig) -> serde_json::Value {
    json!({
        "database": {
            "url": config.database.url,
            "max_connections": config.database.max_connections,
            "timeout_secs": config.database.timeout_secs,
        },
        "assistant": {
            "provider": format!("{:?}", config.assistant.provider).to_lowercase(),
            "api_key": config.assistant.api_key.as_ref().map(|key| redact(key.expose_secret())),
            "base_url": config.assistant.base_url,
            "model": config.assistant.model,
            "timeout_secs": config.assistant.timeout_secs,
            "max_retries": config.assistant.max_retries,
        },
        "server": {
            "bind_address": config.server.bind_address,
            "agent_port": config.server.agent_port,
            "health_check_port": config.server.health_check_port,
            "graceful_shutdown_secs": config.server.graceful_shutdown_secs,
        },
        "logging": {
            "level": config.logging.level,
            "format": match config.logging.format {
                LogFormat::Compact => "compact",
                LogFormat::Pretty => "pretty",
                LogFormat::Json => "json",
            },
        },
    })
}

fn redact(secret: &str) -> String {
    if secret.len() <= 4 {
        "****".to_string()
    } else {
        format!("{}****", &secret[..4])
    }
}
