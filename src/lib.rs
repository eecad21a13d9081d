pub mod api;
pub mod error;
pub mod formatter;
pub mod logging;
pub mod notifier;
pub mod signature;
pub mod webhook;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use error::{NotifierError, Result};
use formatter::PushEventFormatter;
use notifier::Notifier;

pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8888";
pub const DEFAULT_CONFIG_PATH: &str = "push_notifier.toml";
const DEFAULT_TEXT_FIELD: &str = "text";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_MAX_LOG_FILES: usize = 5;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub github: GithubConfig,
    pub notifier: NotifierConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct GithubConfig {
    pub webhook_secret: Option<String>,
}

impl GithubConfig {
    /// Returns true if a valid (non-empty) webhook_secret is set.
    pub fn has_valid_secret(&self) -> bool {
        self.webhook_secret
            .as_ref()
            .map(|s| !s.is_empty())
            .unwrap_or(false)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct NotifierConfig {
    /// Incoming webhook URL of the chat platform
    pub url: Option<String>,
    /// JSON field carrying the message text ("text" for Slack/Mattermost, "content" for Discord)
    pub text_field: String,
    pub timeout_secs: u64,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            url: None,
            text_field: DEFAULT_TEXT_FIELD.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    /// Write rolling log files here in addition to the console
    pub directory: Option<PathBuf>,
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: None,
            max_files: DEFAULT_MAX_LOG_FILES,
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(config_str: &str) -> Result<Self> {
        Ok(toml::from_str(config_str)?)
    }

    /// Overlay values from the environment (or any other key lookup).
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("BIND_ADDRESS") {
            self.server.bind_address = addr;
        }
        if let Some(secret) = lookup("GITHUB_WEBHOOK_SECRET") {
            self.github.webhook_secret = Some(secret);
        }
        if let Some(url) = lookup("NOTIFIER_URL") {
            self.notifier.url = Some(url);
        }
        if let Some(dir) = lookup("LOG_DIR") {
            self.logging.directory = Some(PathBuf::from(dir));
        }
    }
}

/// Load the configuration file, then apply environment overrides.
/// A missing file is not an error; every setting then comes from defaults and env.
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let mut config = if path.exists() {
        let config_str = std::fs::read_to_string(path).map_err(|e| {
            NotifierError::ConfigError(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        AppConfig::from_toml_str(&config_str).map_err(|e| {
            NotifierError::ConfigError(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?
    } else {
        AppConfig::default()
    };

    config.apply_overrides(|key| std::env::var(key).ok());
    Ok(config)
}

pub struct AppState {
    pub config: AppConfig,
    pub formatter: PushEventFormatter,
    pub notifier: Arc<dyn Notifier>,
    pub start_time: Instant,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: AppConfig, formatter: PushEventFormatter, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            config,
            formatter,
            notifier,
            start_time: Instant::now(),
            started_at: Utc::now(),
        }
    }
}

pub type SharedState = Arc<AppState>;
