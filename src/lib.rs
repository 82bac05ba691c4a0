//! Pulse - in-process telemetry store.
//!
//! Pulse keeps a fixed-length history of per-window aggregates for named
//! metrics plus a table of free-text notes, and serves both as JSON to a
//! dashboard.
//!
//! # Features
//!
//! - **Windowed aggregation**: count, average and sum per metric, one
//!   window per tick, with a constant-size history
//! - **Actor ownership**: each store runs on its own task and is reached
//!   only through its mailbox, so callers never share mutable state
//! - **Buffer reuse**: query results come out of leaky pools and go back
//!   on drop
//! - **JSON feed**: optional axum router for dashboards
//!
//! # Architecture
//!
//! - `core`: Domain types, configuration and errors
//! - `metrics`: Series store actor and its window math
//! - `notes`: Note store actor
//! - `pool`: Leaky buffer pools
//! - `telemetry`: Public façade over both actors
//! - `api`: JSON feed
//! - `cli`: Command-line interface
//!
//! # Example
//!
//! ```no_run
//! use pulse_lib::core::{Op, StoreConfig};
//! use pulse_lib::Telemetry;
//!
//! #[tokio::main]
//! async fn main() -> pulse_lib::Result<()> {
//!     let (telemetry, _workers) = Telemetry::start(&StoreConfig::default())?;
//!     telemetry.define_metric("reqs", Op::Count, "Requests").await?;
//!     telemetry.record_metric("reqs", 1, 12.5).await?;
//!
//!     let history = telemetry.query_series("reqs", Op::Count).await?;
//!     assert!(history.is_some());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod api;
pub mod cli;
pub mod core;
pub mod metrics;
pub mod notes;
pub mod pool;
pub mod telemetry;

// Re-export core types for convenience
pub use crate::core::{Config, Op, OpScope, Result};
pub use crate::telemetry::{Telemetry, Workers};
