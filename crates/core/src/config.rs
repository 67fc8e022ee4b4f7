use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

pub const DEFAULT_SLACK_API_BASE_URL: &str = "https://slack.com/api";

/// Files tried, in order, when no explicit path is given.
pub const CONFIG_FILE_CANDIDATES: [&str; 2] = ["coffeebot.toml", "config/coffeebot.toml"];

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub slack: SlackConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SlackConfig {
    #[serde(deserialize_with = "secret_string")]
    pub bot_token: SecretString,
    pub api_base_url: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

/// Values set by the caller; they win over file and environment.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub slack_bot_token: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { url: "sqlite://coffeebot.db".to_owned(), max_connections: 5, timeout_secs: 30 }
    }
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            bot_token: SecretString::from(String::new()),
            api_base_url: DEFAULT_SLACK_API_BASE_URL.to_owned(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind_address: "127.0.0.1".to_owned(), port: 3000, graceful_shutdown_secs: 15 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_owned(), format: LogFormat::Compact }
    }
}

fn secret_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SecretString, D::Error> {
    String::deserialize(deserializer).map(SecretString::from)
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    /// Defaults, then the TOML file, then `COFFEEBOT_*` variables, then
    /// `options.overrides`; the result is validated before it is returned.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = match resolve_config_path(options.config_path.as_deref()) {
            Some(path) => read_file(&path)?,
            None => Self::default(),
        };

        config.apply_env()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    /// `host:port` the HTTP server binds to.
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.server.bind_address, self.server.port)
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        env_override(&mut self.database.url, &["COFFEEBOT_DATABASE_URL"])?;
        env_override(&mut self.database.max_connections, &["COFFEEBOT_DATABASE_MAX_CONNECTIONS"])?;
        env_override(&mut self.database.timeout_secs, &["COFFEEBOT_DATABASE_TIMEOUT_SECS"])?;

        if let Some((_, token)) = read_env(&["COFFEEBOT_SLACK_BOT_TOKEN"]) {
            self.slack.bot_token = SecretString::from(token);
        }
        env_override(&mut self.slack.api_base_url, &["COFFEEBOT_SLACK_API_BASE_URL"])?;

        env_override(&mut self.server.bind_address, &["COFFEEBOT_SERVER_BIND_ADDRESS"])?;
        env_override(&mut self.server.port, &["COFFEEBOT_SERVER_PORT", "PORT"])?;
        env_override(
            &mut self.server.graceful_shutdown_secs,
            &["COFFEEBOT_SERVER_GRACEFUL_SHUTDOWN_SECS"],
        )?;

        env_override(&mut self.logging.level, &["COFFEEBOT_LOGGING_LEVEL", "COFFEEBOT_LOG_LEVEL"])?;
        env_override(
            &mut self.logging.format,
            &["COFFEEBOT_LOGGING_FORMAT", "COFFEEBOT_LOG_FORMAT"],
        )?;

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(bot_token) = overrides.slack_bot_token {
            self.slack.bot_token = SecretString::from(bot_token);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_slack(&self.slack)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then(|| path.to_path_buf());
    }

    CONFIG_FILE_CANDIDATES.into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn read_file(path: &Path) -> Result<AppConfig, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
    toml::from_str(&raw)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

/// First non-blank variable among `keys`, with the key it came from.
fn read_env(keys: &[&'static str]) -> Option<(&'static str, String)> {
    keys.iter().find_map(|key| {
        env::var(key).ok().filter(|value| !value.trim().is_empty()).map(|value| (*key, value))
    })
}

fn env_override<T: FromStr>(target: &mut T, keys: &[&'static str]) -> Result<(), ConfigError> {
    if let Some((key, value)) = read_env(keys) {
        match value.parse() {
            Ok(parsed) => *target = parsed,
            Err(_) => return Err(ConfigError::InvalidEnvOverride { key: key.to_owned(), value }),
        }
    }
    Ok(())
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::Validation(message.to_owned())
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    if !(url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:") {
        return Err(invalid(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)",
        ));
    }
    if database.max_connections == 0 {
        return Err(invalid("database.max_connections must be greater than zero"));
    }
    if !(1..=300).contains(&database.timeout_secs) {
        return Err(invalid("database.timeout_secs must be in range 1..=300"));
    }
    Ok(())
}

fn validate_slack(slack: &SlackConfig) -> Result<(), ConfigError> {
    let bot_token = slack.bot_token.expose_secret();
    if bot_token.is_empty() {
        return Err(invalid(
            "slack.bot_token is required; copy the Bot User OAuth Token from your Slack app",
        ));
    }
    if !bot_token.starts_with("xoxb-") {
        let hint = if bot_token.starts_with("xapp-") {
            " (hint: that is an app-level token, not the bot token)"
        } else {
            ""
        };
        let message = format!("slack.bot_token must start with `xoxb-`{hint}");
        return Err(ConfigError::Validation(message));
    }

    let base_url = slack.api_base_url.trim();
    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(invalid("slack.api_base_url must start with http:// or https://"));
    }
    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.bind_address.trim().is_empty() {
        return Err(invalid("server.bind_address must not be empty"));
    }
    if server.graceful_shutdown_secs == 0 {
        return Err(invalid("server.graceful_shutdown_secs must be greater than zero"));
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    match logging.level.trim().to_ascii_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(invalid("logging.level must be one of trace|debug|info|warn|error")),
    }
}
