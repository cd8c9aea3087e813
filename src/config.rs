//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::chat::DEFAULT_WEBHOOK_URL;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub chat: ChatConfig,

    #[serde(default)]
    pub knowledge: KnowledgeConfig,

    #[serde(default)]
    pub mock_server: MockServerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// REST backend the client talks to
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_url")]
    pub base_url: String,

    #[serde(default = "default_request_timeout")]
    pub timeout_secs: u64,
}

fn default_api_url() -> String {
    "http://localhost:8000/api".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_url(),
            timeout_secs: default_request_timeout(),
        }
    }
}

/// Planning assistant webhook
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatConfig {
    #[serde(default = "default_webhook_url")]
    pub webhook_url: String,

    #[serde(default = "default_chat_timeout")]
    pub timeout_secs: u64,
}

fn default_webhook_url() -> String {
    DEFAULT_WEBHOOK_URL.to_string()
}

fn default_chat_timeout() -> u64 {
    120
}

impl ChatConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            webhook_url: default_webhook_url(),
            timeout_secs: default_chat_timeout(),
        }
    }
}

/// Knowledge base loading
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KnowledgeConfig {
    /// Consecutive failed fetches before the knowledge base stops loading; 0 never stops
    #[serde(default = "default_max_failures")]
    pub max_consecutive_failures: u32,
}

fn default_max_failures() -> u32 {
    3
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            max_consecutive_failures: default_max_failures(),
        }
    }
}

/// Mock REST server
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MockServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_seed")]
    pub seed: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_seed() -> bool {
    true
}

impl MockServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for MockServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            seed: default_seed(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `pretty` or `json`
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl LoggingConfig {
    /// Install the global subscriber; `RUST_LOG` wins over `level`.
    ///
    /// Logs go to stderr so command output on stdout stays clean.
    pub fn init_tracing(&self) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            format!("event_horizon={},tower_http={}", self.level, self.level).into()
        });
        let registry = tracing_subscriber::registry().with(filter);

        let result = if self.format.eq_ignore_ascii_case("json") {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .try_init()
        } else {
            registry
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .try_init()
        };
        if let Err(e) = result {
            eprintln!("Logging already initialized: {}", e);
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        for path in Self::search_paths() {
            if path.exists() {
                match Self::load_with_env(&path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::debug!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Config file locations, in lookup order
    pub fn search_paths() -> Vec<PathBuf> {
        [
            dirs::config_dir().map(|p| p.join("event-horizon").join("config.toml")),
            Some(PathBuf::from("/etc/event-horizon/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply `EVENT_HORIZON_*` overrides read through `lookup`
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("EVENT_HORIZON_API_URL") {
            self.api.base_url = url;
        }
        if let Some(secs) = lookup("EVENT_HORIZON_API_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            self.api.timeout_secs = secs;
        }

        if let Some(url) = lookup("EVENT_HORIZON_CHAT_WEBHOOK_URL") {
            self.chat.webhook_url = url;
        }

        if let Some(host) = lookup("EVENT_HORIZON_MOCK_HOST") {
            self.mock_server.host = host;
        }
        if let Some(port) = lookup("EVENT_HORIZON_MOCK_PORT").and_then(|v| v.parse().ok()) {
            self.mock_server.port = port;
        }

        if let Some(level) = lookup("EVENT_HORIZON_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("EVENT_HORIZON_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Event Horizon Configuration
#
# Environment variables override these settings:
# - EVENT_HORIZON_API_URL
# - EVENT_HORIZON_API_TIMEOUT_SECS
# - EVENT_HORIZON_CHAT_WEBHOOK_URL
# - EVENT_HORIZON_MOCK_HOST
# - EVENT_HORIZON_MOCK_PORT
# - EVENT_HORIZON_LOG_LEVEL
# - EVENT_HORIZON_LOG_FORMAT

[api]
# Base URL of the REST backend
base_url = "http://localhost:8000/api"

# Request timeout in seconds
timeout_secs = 30

[chat]
# Planning assistant webhook
webhook_url = "http://n8n:5678/webhook-test/project-planner"

# The assistant can take a while to answer
timeout_secs = 120

[knowledge]
# Stop loading the knowledge base after this many failures in a row (0 = never)
max_consecutive_failures = 3

[mock_server]
host = "127.0.0.1"
port = 8000

# Load demo data on startup
seed = true

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
