//! Core domain types, configuration and errors for Pulse.

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{Config, ConfigBuilder, PageConfig, PoolingMode, StoreConfig};
pub use error::{PulseError, Result};
pub use types::{MetricDefinition, Note, Op, OpScope};
