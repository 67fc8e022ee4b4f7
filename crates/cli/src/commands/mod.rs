pub mod config;
pub mod doctor;
pub mod migrate;
pub mod reset;

use coffeebot_core::config::{AppConfig, LoadOptions};
use coffeebot_db::{connect_with_settings, DbPool};
use serde::Serialize;
use tokio::runtime::Runtime;

/// Exit code and the single line printed for a command.
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome<'a> {
    command: &'a str,
    status: &'a str,
    error_class: Option<&'a str>,
    message: String,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload =
            CommandOutcome { command, status: "ok", error_class: None, message: message.into() };
        Self { exit_code: 0, output: serialize_payload(&payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command,
            status: "error",
            error_class: Some(error_class),
            message: message.into(),
        };
        Self { exit_code, output: serialize_payload(&payload) }
    }
}

fn serialize_payload(payload: &CommandOutcome<'_>) -> String {
    serde_json::to_string(payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"{}\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            payload.command,
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

/// Loads and validates config, or the exit-2 failure every command shares.
pub(crate) fn load_config(command: &str) -> Result<AppConfig, CommandResult> {
    AppConfig::load(LoadOptions::default()).map_err(|error| {
        CommandResult::failure(
            command,
            "config_validation",
            format!("configuration issue: {error}"),
            2,
        )
    })
}

pub(crate) fn runtime(command: &str) -> Result<Runtime, CommandResult> {
    tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
        CommandResult::failure(
            command,
            "runtime_init",
            format!("failed to initialize async runtime: {error}"),
            3,
        )
    })
}

pub(crate) async fn connect(config: &AppConfig) -> Result<DbPool, String> {
    connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(|error| format!("failed to connect to database: {error}"))
}
