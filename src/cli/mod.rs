//! Command-line interface for Pulse.
//!
//! Runs the telemetry store with its JSON feed. Handy for trying a dashboard
//! against synthetic load (`pulse --demo`).

use crate::api;
use crate::core::config::{ConfigBuilder, LogLevel};
use crate::core::{Config, PulseError, Result};
use crate::telemetry::Telemetry;
use clap::Parser;
use std::net::IpAddr;
use std::path::PathBuf;

pub mod demo;

/// In-process telemetry store with a JSON dashboard feed
#[derive(Parser, Debug)]
#[command(name = "pulse")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Port for the JSON feed
    #[arg(short, long, env = "PULSE_PORT")]
    pub port: Option<u16>,

    /// Bind address for the JSON feed
    #[arg(long, env = "PULSE_BIND")]
    pub bind: Option<IpAddr>,

    /// Configuration file path (default: ~/.config/pulse/config.yaml)
    #[arg(short, long, env = "PULSE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Dashboard page title
    #[arg(long)]
    pub title: Option<String>,

    /// Dashboard page image
    #[arg(long)]
    pub image: Option<String>,

    /// Feed synthetic metrics and notes into the store
    #[arg(long, env = "PULSE_DEMO")]
    pub demo: bool,

    /// Enable debug logging
    #[arg(short, long, env = "PULSE_DEBUG")]
    pub debug: bool,

    /// Validate configuration and exit
    #[arg(long)]
    pub check_config: bool,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Load configuration with proper precedence:
    /// 1. CLI arguments (highest priority)
    /// 2. Config file
    /// 3. Defaults (lowest priority)
    pub async fn load_config(&self) -> Result<Config> {
        let mut builder = ConfigBuilder::new();

        let config_path = match &self.config {
            Some(path) => Some(path.clone()),
            None => Config::default_path().filter(|path| path.exists()),
        };

        if let Some(path) = config_path {
            match tokio::fs::read_to_string(&path).await {
                Ok(content) => {
                    builder = builder.from_yaml(&content)?;
                },
                Err(e) => {
                    return Err(PulseError::config(format!(
                        "Failed to read config file {:?}: {}",
                        path, e
                    )));
                },
            }
        }

        self.build_config_from_args(builder)
    }

    fn build_config_from_args(&self, mut builder: ConfigBuilder) -> Result<Config> {
        if let Some(port) = self.port {
            builder = builder.port(port);
        }
        if let Some(bind) = self.bind {
            builder = builder.bind_address(bind);
        }
        if let Some(title) = &self.title {
            builder = builder.title(title.as_str());
        }
        if let Some(image) = &self.image {
            builder = builder.image(image.as_str());
        }

        builder.debug(self.debug).build()
    }

    /// Initialize logging based on flags, environment and the configured level.
    pub fn init_logging(&self, configured: LogLevel) -> Result<()> {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

        let env_log_level = std::env::var("PULSE_LOG_LEVEL")
            .unwrap_or_else(|_| configured.as_str().to_string());
        let log_level = if self.debug {
            "debug"
        } else {
            env_log_level.as_str()
        };

        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(self.debug)
            .compact();

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| PulseError::config(format!("Failed to initialize logging: {}", e)))?;

        Ok(())
    }
}

/// Execute the Pulse application.
pub async fn execute(cli: Cli) -> Result<()> {
    let config = cli.load_config().await?;
    cli.init_logging(config.logging.level)?;
    match &cli.config {
        Some(path) => tracing::info!("Loaded configuration from: {:?}", path),
        None => tracing::debug!("Using default configuration path or defaults"),
    }

    if cli.check_config {
        println!("Configuration is valid!");
        println!("  Listen: {}:{}", config.server.bind_address, config.server.port);
        println!("  Windows: {} x {:?}", config.store.window_len, config.store.tick_period);
        println!("  Pooling: {:?}", config.store.pooling);
        return Ok(());
    }

    let (telemetry, workers) = Telemetry::start(&config.store)?;
    telemetry
        .record_note("started", unix_timestamp())
        .await?;

    let demo = if cli.demo {
        tracing::info!("Starting synthetic load generator");
        Some(tokio::spawn(demo::run(telemetry.clone(), config.store.tick_period)))
    } else {
        None
    };

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for shutdown signal: {}", e);
        }
        tracing::info!("Received shutdown signal, stopping...");
    };

    api::serve(telemetry, &config, shutdown).await?;

    if let Some(demo) = demo {
        demo.abort();
    }
    workers.join().await
}

/// Seconds since the unix epoch, for the "started" note
fn unix_timestamp() -> String {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_default()
}
