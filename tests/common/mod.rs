//! Common test utilities and fixtures.

#![allow(dead_code)]

use pulse_lib::core::{PoolingMode, StoreConfig};
use pulse_lib::{Telemetry, Workers};
use std::time::Duration;

/// Tick period used by the paused-clock tests
pub const TICK: Duration = Duration::from_secs(1);

/// Store config with a short history and the default mailboxes
pub fn store_config(window_len: usize) -> StoreConfig {
    StoreConfig {
        window_len,
        tick_period: TICK,
        ..StoreConfig::default()
    }
}

/// Same as [`store_config`] with pooling switched off
pub fn unpooled_config(window_len: usize) -> StoreConfig {
    StoreConfig {
        pooling: PoolingMode::Disabled,
        ..store_config(window_len)
    }
}

/// Start both actors on the current runtime
pub fn start(window_len: usize) -> (Telemetry, Workers) {
    Telemetry::start(&store_config(window_len)).expect("valid store config")
}

/// Let `n` window boundaries pass.
///
/// Under a paused clock the runtime jumps straight to each boundary, and the
/// series actor closes the window before it looks at anything queued after.
pub async fn advance_windows(n: u32) {
    tokio::time::sleep(TICK * n).await;
}

/// Float comparison with a relative tolerance
pub fn approx_eq(a: f64, b: f64) -> bool {
    let scale = a.abs().max(b.abs()).max(1.0);
    (a - b).abs() <= scale * 1e-9
}
