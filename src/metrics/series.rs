//! Per-metric rolling window history.
//!
//! A series accumulates events into a pending slot and closes that slot into
//! two fixed-length histories on every tick:
//! - `counts[i]` / `values[i]` always describe the same window
//! - index `len - 1` is the most recently closed window
//! - histories are only written by `close_window`

use crate::core::Op;
use crate::metrics::definitions::Definitions;

/// Counts below this are treated as zero when averaging.
pub const AVERAGE_EPSILON: f64 = 0.000_000_001;

/// Rolling count/value history for one metric name
#[derive(Debug, Clone)]
pub struct MetricSeries {
    pending_count: i64,
    pending_value: f64,
    counts: Box<[f64]>,
    values: Box<[f64]>,
    definitions: Definitions,
}

impl MetricSeries {
    /// Create a series with `window_len` zeroed windows
    pub fn new(window_len: usize) -> Self {
        Self {
            pending_count: 0,
            pending_value: 0.0,
            counts: vec![0.0; window_len].into_boxed_slice(),
            values: vec![0.0; window_len].into_boxed_slice(),
            definitions: Definitions::default(),
        }
    }

    /// Add an observation to the open window
    #[inline]
    pub fn record(&mut self, count: i64, value: f64) {
        self.pending_count = self.pending_count.saturating_add(count);
        self.pending_value += value;
    }

    /// Close the open window into history and start a new one
    pub fn close_window(&mut self) {
        let closed_count = self.pending_count as f64;
        let closed_value = self.pending_value;

        shift_in(&mut self.counts, closed_count);
        shift_in(&mut self.values, closed_value);

        self.pending_count = 0;
        self.pending_value = 0.0;
    }

    /// Number of windows kept
    pub fn window_len(&self) -> usize {
        self.counts.len()
    }

    /// Closed per-window counts, oldest first
    pub fn counts(&self) -> &[f64] {
        &self.counts
    }

    /// Closed per-window value sums, oldest first
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Display name overrides
    pub fn definitions(&self) -> &Definitions {
        &self.definitions
    }

    /// Mutable display name overrides
    pub fn definitions_mut(&mut self) -> &mut Definitions {
        &mut self.definitions
    }

    /// Replace the contents of `out` with the `op` projection of the history.
    ///
    /// `out` ends up exactly `window_len` long whatever it held before.
    pub fn project_into(&self, op: Op, out: &mut Vec<f64>) {
        out.clear();
        match op {
            Op::Count => out.extend_from_slice(&self.counts),
            Op::Sum => out.extend_from_slice(&self.values),
            Op::Average => out.extend(
                self.counts
                    .iter()
                    .zip(self.values.iter())
                    .map(|(&count, &value)| average(count, value)),
            ),
        }
    }
}

/// Mean of one window; zero-count windows report the raw value.
#[inline]
pub fn average(count: f64, value: f64) -> f64 {
    if count == 0.0 || count < AVERAGE_EPSILON {
        value
    } else {
        value / count
    }
}

/// Drop the oldest slot and append `newest`
#[inline]
fn shift_in(history: &mut [f64], newest: f64) {
    if let Some(last) = history.len().checked_sub(1) {
        history.copy_within(1.., 0);
        history[last] = newest;
    }
}
