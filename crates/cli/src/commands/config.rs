use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use coffeebot_core::config::{AppConfig, LoadOptions, CONFIG_FILE_CANDIDATES};
use secrecy::ExposeSecret;
use toml::Value;

/// One reported setting and the environment variables that can set it,
/// highest priority first.
struct Field {
    key: &'static str,
    value: String,
    env_keys: &'static [&'static str],
}

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in fields(&config) {
        let source = field_source(
            field.key,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(format!("- {} = {} (source: {source})", field.key, field.value));
    }

    lines.join("\n")
}

fn fields(config: &AppConfig) -> Vec<Field> {
    vec![
        Field {
            key: "database.url",
            value: config.database.url.clone(),
            env_keys: &["COFFEEBOT_DATABASE_URL"],
        },
        Field {
            key: "database.max_connections",
            value: config.database.max_connections.to_string(),
            env_keys: &["COFFEEBOT_DATABASE_MAX_CONNECTIONS"],
        },
        Field {
            key: "database.timeout_secs",
            value: config.database.timeout_secs.to_string(),
            env_keys: &["COFFEEBOT_DATABASE_TIMEOUT_SECS"],
        },
        Field {
            key: "slack.bot_token",
            value: redact_token(config.slack.bot_token.expose_secret()),
            env_keys: &["COFFEEBOT_SLACK_BOT_TOKEN"],
        },
        Field {
            key: "slack.api_base_url",
            value: config.slack.api_base_url.clone(),
            env_keys: &["COFFEEBOT_SLACK_API_BASE_URL"],
        },
        Field {
            key: "server.bind_address",
            value: config.server.bind_address.clone(),
            env_keys: &["COFFEEBOT_SERVER_BIND_ADDRESS"],
        },
        Field {
            key: "server.port",
            value: config.server.port.to_string(),
            env_keys: &["COFFEEBOT_SERVER_PORT", "PORT"],
        },
        Field {
            key: "server.graceful_shutdown_secs",
            value: config.server.graceful_shutdown_secs.to_string(),
            env_keys: &["COFFEEBOT_SERVER_GRACEFUL_SHUTDOWN_SECS"],
        },
        Field {
            key: "logging.level",
            value: config.logging.level.clone(),
            env_keys: &["COFFEEBOT_LOGGING_LEVEL", "COFFEEBOT_LOG_LEVEL"],
        },
        Field {
            key: "logging.format",
            value: format!("{:?}", config.logging.format).to_lowercase(),
            env_keys: &["COFFEEBOT_LOGGING_FORMAT", "COFFEEBOT_LOG_FORMAT"],
        },
    ]
}

fn detect_config_path() -> Option<PathBuf> {
    CONFIG_FILE_CANDIDATES
        .into_iter()
        .map(PathBuf::from)
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let raw = fs::read_to_string(path?).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

/// Keeps the token family prefix (`xoxb`) and hides the rest.
fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    match trimmed.split_once('-') {
        Some((prefix, _)) => format!("{prefix}-***"),
        None => "<redacted>".to_string(),
    }
}
