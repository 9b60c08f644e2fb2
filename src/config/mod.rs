//! Configuration management for elaster
//!
//! This module handles loading, parsing, and managing configuration from various sources:
//! - Configuration files (TOML format)
//! - Environment variables
//! - Command-line arguments
//!
//! Configuration precedence (highest to lowest):
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. Configuration file
//! 4. Default values

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use crate::error::{ConfigError, Result};
use crate::pipeline::ExportDescriptor;

/// Environment variable overriding `mongo.connection`.
pub const ENV_MONGO_URI: &str = "ELASTER_MONGO_URI";
/// Environment variable overriding `mongo.database`.
pub const ENV_MONGO_DATABASE: &str = "ELASTER_MONGO_DATABASE";
/// Environment variable overriding `elastic.host`.
pub const ENV_ELASTIC_HOST: &str = "ELASTER_ELASTIC_HOST";
/// Environment variable overriding `logging.level`.
pub const ENV_LOG_LEVEL: &str = "ELASTER_LOG_LEVEL";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Source store connection
    #[serde(default)]
    pub mongo: MongoConfig,

    /// Destination index connection
    #[serde(default)]
    pub elastic: ElasticConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Progress display configuration
    #[serde(default)]
    pub progress: ProgressConfig,

    /// Collections to export, in run order
    #[serde(default)]
    pub collections: Vec<ExportDescriptor>,
}

/// MongoDB source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoConfig {
    /// MongoDB connection URI
    #[serde(default = "default_mongo_uri")]
    pub connection: String,

    /// Database holding the collections; defaults to the URI's database
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,

    /// Cursor batch size requested from the server
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,
}

/// Elasticsearch destination configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElasticConfig {
    /// Base URL of the Elasticsearch node
    #[serde(default = "default_elastic_host")]
    pub host: String,

    /// Connectivity check timeout in milliseconds
    #[serde(default = "default_ping_timeout_ms")]
    pub ping_timeout_ms: u64,

    /// Per-request timeout in seconds; unset waits indefinitely
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: LogLevel,

    /// Enable timestamps in logs
    #[serde(default = "default_log_timestamps")]
    pub timestamps: bool,
}

/// Log level options
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Progress display configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressConfig {
    /// Render a progress bar while streaming
    #[serde(default = "default_progress_enabled")]
    pub enabled: bool,

    /// Colored status lines
    #[serde(default = "default_color_output")]
    pub color: bool,
}

// Default value functions
fn default_mongo_uri() -> String {
    "mongodb://localhost:27017".to_string()
}

fn default_batch_size() -> u32 {
    500
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_elastic_host() -> String {
    "http://localhost:9200".to_string()
}

fn default_ping_timeout_ms() -> u64 {
    1000
}

fn default_log_level() -> LogLevel {
    LogLevel::Info
}

fn default_log_timestamps() -> bool {
    false
}

fn default_progress_enabled() -> bool {
    true
}

fn default_color_output() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mongo: MongoConfig::default(),
            elastic: ElasticConfig::default(),
            logging: LoggingConfig::default(),
            progress: ProgressConfig::default(),
            collections: Vec::new(),
        }
    }
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            connection: default_mongo_uri(),
            database: None,
            batch_size: default_batch_size(),
            connect_timeout: default_connect_timeout(),
        }
    }
}

impl Default for ElasticConfig {
    fn default() -> Self {
        Self {
            host: default_elastic_host(),
            ping_timeout_ms: default_ping_timeout_ms(),
            request_timeout_secs: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            timestamps: default_log_timestamps(),
        }
    }
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            enabled: default_progress_enabled(),
            color: default_color_output(),
        }
    }
}

impl Config {
    /// Parse configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| ConfigError::InvalidFormat(e.to_string()).into())
    }

    /// Load configuration from a file
    ///
    /// # Arguments
    /// * `path` - Explicit path, or `None` for [`Config::default_config_path`]
    ///
    /// # Returns
    /// * `Result<Config>` - Loaded configuration or error
    pub fn load_from_file(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::default_config_path);

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()).into());
        }

        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// Apply environment variable overrides
    ///
    /// Variables are prefixed with ELASTER_ and read through `lookup`,
    /// normally `std::env::var`.
    /// Example: ELASTER_ELASTIC_HOST=http://search:9200
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(uri) = lookup(ENV_MONGO_URI) {
            self.mongo.connection = uri;
        }
        if let Some(database) = lookup(ENV_MONGO_DATABASE) {
            self.mongo.database = Some(database);
        }
        if let Some(host) = lookup(ENV_ELASTIC_HOST) {
            self.elastic.host = host;
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.logging.level = LogLevel::parse(&level).ok_or(ConfigError::InvalidValue {
                field: ENV_LOG_LEVEL.to_string(),
                value: level,
            })?;
        }
        Ok(())
    }

    /// Get the default configuration file path
    ///
    /// # Returns
    /// * `PathBuf` - Path to default configuration file
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".elaster")
            .join("config.toml")
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::InvalidFormat(e.to_string()).into())
    }

    /// Validate the configuration
    ///
    /// # Returns
    /// * `Result<()>` - Ok if valid, error otherwise
    pub fn validate(&self) -> Result<()> {
        if !self.mongo.connection.starts_with("mongodb://")
            && !self.mongo.connection.starts_with("mongodb+srv://")
        {
            return Err(ConfigError::InvalidValue {
                field: "mongo.connection".to_string(),
                value: self.mongo.connection.clone(),
            }
            .into());
        }

        if self.mongo.batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "mongo.batch_size".to_string(),
                value: "0".to_string(),
            }
            .into());
        }

        let host_is_base = url::Url::parse(&self.elastic.host)
            .map(|url| !url.cannot_be_a_base())
            .unwrap_or(false);
        if !host_is_base {
            return Err(ConfigError::InvalidValue {
                field: "elastic.host".to_string(),
                value: self.elastic.host.clone(),
            }
            .into());
        }

        if self.collections.is_empty() {
            return Err(ConfigError::MissingField("collections".to_string()).into());
        }

        let mut targets = HashSet::new();
        for (i, desc) in self.collections.iter().enumerate() {
            desc.validate()
                .map_err(|field| ConfigError::MissingField(format!("collections[{i}].{field}")))?;

            if !targets.insert(desc.index.as_str()) {
                warn!(
                    "Index [{}] is the target of more than one collection; later exports replace earlier ones",
                    desc.index
                );
            }
        }

        Ok(())
    }

    /// Restrict the run to the named collections, keeping configured order
    ///
    /// # Arguments
    /// * `names` - Collection names to keep; empty keeps everything
    pub fn select_collections(&mut self, names: &[String]) -> Result<()> {
        if names.is_empty() {
            return Ok(());
        }

        if let Some(unknown) = names
            .iter()
            .find(|name| !self.collections.iter().any(|c| &c.name == *name))
        {
            return Err(ConfigError::InvalidValue {
                field: "only".to_string(),
                value: unknown.clone(),
            }
            .into());
        }

        self.collections.retain(|c| names.contains(&c.name));
        Ok(())
    }

    /// Connectivity check timeout as Duration
    pub fn ping_timeout(&self) -> Duration {
        Duration::from_millis(self.elastic.ping_timeout_ms)
    }

    /// Destination request timeout as Duration
    pub fn request_timeout(&self) -> Option<Duration> {
        self.elastic.request_timeout_secs.map(Duration::from_secs)
    }
}

impl MongoConfig {
    /// Connection and server selection timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }
}

impl LogLevel {
    /// Parse a level name, case-insensitively
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "error" => Some(LogLevel::Error),
            "warn" | "warning" => Some(LogLevel::Warn),
            "info" => Some(LogLevel::Info),
            "debug" => Some(LogLevel::Debug),
            "trace" => Some(LogLevel::Trace),
            _ => None,
        }
    }

    /// Convert to tracing::Level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}
