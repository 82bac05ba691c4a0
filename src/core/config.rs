//! Configuration management for Pulse.
//!
//! This module provides configuration handling with:
//! - YAML file support
//! - CLI argument overrides (see `cli`)
//! - Validation and defaults

use crate::core::{PulseError, Result};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Complete configuration for Pulse
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Aggregation engine configuration
    pub store: StoreConfig,
    /// HTTP feed configuration
    pub server: ServerConfig,
    /// Dashboard page setup
    pub page: PageConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Debug mode
    #[serde(skip)]
    pub debug: bool,
}

/// Aggregation engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Number of closed windows kept per series
    pub window_len: usize,
    /// Time between two window boundaries
    #[serde(with = "humantime_serde")]
    pub tick_period: Duration,
    /// Series actor mailbox capacity
    pub metric_mailbox: usize,
    /// Note actor mailbox capacity
    pub note_mailbox: usize,
    /// Result buffer reuse strategy
    pub pooling: PoolingMode,
    /// Pooled metric snapshot buffers
    pub snapshot_pool: usize,
    /// Pooled definition list buffers
    pub definition_pool: usize,
    /// Pooled note list buffers
    pub note_pool: usize,
}

/// HTTP feed configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address for the JSON feed
    pub bind_address: IpAddr,
    /// Port for the JSON feed
    pub port: u16,
    /// Enable permissive CORS headers
    pub enable_cors: bool,
}

/// Dashboard page setup
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    /// Page title
    pub title: String,
    /// Optional page image
    pub image: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: LogLevel,
}

/// Result buffer reuse strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoolingMode {
    /// Bounded leaky pool, falls back to fresh allocation
    Leaky,
    /// Always allocate
    Disabled,
}

/// Log levels
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            store: StoreConfig::default(),
            server: ServerConfig::default(),
            page: PageConfig::default(),
            logging: LoggingConfig::default(),
            debug: false,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            window_len: 960,
            tick_period: Duration::from_secs(1),
            metric_mailbox: 1024,
            note_mailbox: 16,
            pooling: PoolingMode::Leaky,
            snapshot_pool: 64,
            definition_pool: 4,
            note_pool: 16,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind_address: IpAddr::from([127, 0, 0, 1]),
            port: 8080,
            enable_cors: true,
        }
    }
}

impl Default for PageConfig {
    fn default() -> Self {
        PageConfig {
            title: "Pulse".to_string(),
            image: "web/pulse36.png".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: LogLevel::Info,
        }
    }
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.store.validate()?;

        if self.server.port == 0 {
            return Err(PulseError::config("port must be greater than 0"));
        }

        Ok(())
    }

    /// Default configuration file location (`<config dir>/pulse/config.yaml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("pulse").join("config.yaml"))
    }
}

impl StoreConfig {
    /// Validate engine parameters
    pub fn validate(&self) -> Result<()> {
        if self.window_len == 0 {
            return Err(PulseError::config("window_len must be greater than 0"));
        }

        if self.tick_period.is_zero() {
            return Err(PulseError::config("tick_period must be greater than 0"));
        }

        if self.metric_mailbox == 0 || self.note_mailbox == 0 {
            return Err(PulseError::config(format!(
                "mailbox capacities must be greater than 0, got metric={} note={}",
                self.metric_mailbox, self.note_mailbox
            )));
        }

        Ok(())
    }
}

impl LogLevel {
    /// Convert to tracing filter string
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Configuration builder for programmatic construction
pub struct ConfigBuilder {
    config: Config,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigBuilder {
    /// Create a new builder with defaults
    pub fn new() -> Self {
        ConfigBuilder {
            config: Config::default(),
        }
    }

    /// Load configuration from YAML string
    pub fn from_yaml(mut self, yaml: &str) -> Result<Self> {
        self.config = serde_yaml::from_str(yaml)?;
        Ok(self)
    }

    /// Set the number of windows kept per series
    pub fn window_len(mut self, len: usize) -> Self {
        self.config.store.window_len = len;
        self
    }

    /// Set the tick period
    pub fn tick_period(mut self, period: Duration) -> Self {
        self.config.store.tick_period = period;
        self
    }

    /// Set the result buffer strategy
    pub fn pooling(mut self, mode: PoolingMode) -> Self {
        self.config.store.pooling = mode;
        self
    }

    /// Set bind address
    pub fn bind_address(mut self, addr: IpAddr) -> Self {
        self.config.server.bind_address = addr;
        self
    }

    /// Set HTTP port
    pub fn port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    /// Set page title
    pub fn title<S: Into<String>>(mut self, title: S) -> Self {
        self.config.page.title = title.into();
        self
    }

    /// Set page image
    pub fn image<S: Into<String>>(mut self, image: S) -> Self {
        self.config.page.image = image.into();
        self
    }

    /// Set debug mode
    pub fn debug(mut self, debug: bool) -> Self {
        self.config.debug = debug;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}
