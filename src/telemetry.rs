//! Public entry point for recording and reading telemetry.
//!
//! [`Telemetry`] wraps the two actor handles. Calls fall in two groups:
//! - submits (`record_metric`, `define_metric`, `record_note`) return once the
//!   message is queued; a concurrent query may not see them yet
//! - fetches (`query_series`, `list_definitions`, `query_notes`) wait for the
//!   owning actor to answer
//!
//! Every method has a `blocking_` twin for plain OS threads. Those must not be
//! called from inside an async context.

use crate::core::{MetricDefinition, Note, Op, OpScope, Result, StoreConfig};
use crate::metrics::store::{define_command, SeriesCommand, SeriesHandle, SeriesStore};
use crate::notes::{NoteHandle, NoteStore};
use crate::pool::{shared_pool, PoolStats, Pooled};
use tokio::task::JoinHandle;

/// Initial capacity of freshly allocated definition listings
const DEFINITION_ALLOC: usize = 8;
/// Initial capacity of freshly allocated note listings
const NOTE_ALLOC: usize = 32;

/// Handle to a running telemetry store. Cheap to clone.
#[derive(Clone)]
pub struct Telemetry {
    series: SeriesHandle,
    notes: NoteHandle,
}

/// Join handles of the two actors started by [`Telemetry::start`]
pub struct Workers {
    /// Series store task
    pub series: JoinHandle<()>,
    /// Note store task
    pub notes: JoinHandle<()>,
}

impl Workers {
    /// Wait for both actors to stop (after every handle is dropped)
    pub async fn join(self) -> Result<()> {
        self.series.await?;
        self.notes.await?;
        Ok(())
    }
}

impl Telemetry {
    /// Assemble a façade from already running actors
    pub fn new(series: SeriesHandle, notes: NoteHandle) -> Self {
        Self { series, notes }
    }

    /// Validate `config`, build the pools and spawn both actors on the
    /// current tokio runtime.
    pub fn start(config: &StoreConfig) -> Result<(Self, Workers)> {
        config.validate()?;

        let snapshots = shared_pool(config.pooling, config.snapshot_pool, config.window_len);
        let definitions = shared_pool(config.pooling, config.definition_pool, DEFINITION_ALLOC);
        let notes = shared_pool(config.pooling, config.note_pool, NOTE_ALLOC);

        let (series, series_task) = SeriesStore::new(config.window_len, snapshots, definitions)
            .spawn(config.metric_mailbox, config.tick_period);
        let (notes, notes_task) = NoteStore::new(notes).spawn(config.note_mailbox);

        tracing::info!(
            window_len = config.window_len,
            pooling = ?config.pooling,
            "telemetry store running"
        );

        Ok((
            Self::new(series, notes),
            Workers {
                series: series_task,
                notes: notes_task,
            },
        ))
    }

    /// Record `count` events totalling `value` for metric `name`.
    ///
    /// `count` is usually 1; batch callers may pass the number of events
    /// summed into `value`. Gauges may pass 0.
    pub async fn record_metric(&self, name: impl Into<String>, count: i64, value: f64) -> Result<()> {
        self.series.submit(record_command(name, count, value)).await
    }

    /// Like [`Telemetry::record_metric`] but never waits on a full mailbox
    pub fn try_record_metric(&self, name: impl Into<String>, count: i64, value: f64) -> Result<()> {
        self.series.try_submit(record_command(name, count, value))
    }

    /// Blocking form of [`Telemetry::record_metric`]
    pub fn blocking_record_metric(
        &self,
        name: impl Into<String>,
        count: i64,
        value: f64,
    ) -> Result<()> {
        self.series.blocking_submit(record_command(name, count, value))
    }

    /// Set the display name of one or every operation of `name`
    pub async fn define_metric(
        &self,
        name: impl Into<String>,
        scope: impl Into<OpScope>,
        display_name: impl Into<String>,
    ) -> Result<()> {
        self.series
            .submit(define_command(name.into(), scope.into(), display_name.into()))
            .await
    }

    /// Blocking form of [`Telemetry::define_metric`]
    pub fn blocking_define_metric(
        &self,
        name: impl Into<String>,
        scope: impl Into<OpScope>,
        display_name: impl Into<String>,
    ) -> Result<()> {
        self.series
            .blocking_submit(define_command(name.into(), scope.into(), display_name.into()))
    }

    /// Window history of `name` projected by `op`; `None` if never mentioned
    pub async fn query_series(&self, name: impl Into<String>, op: Op) -> Result<Option<Pooled<f64>>> {
        self.series.query(name, op).await
    }

    /// Blocking form of [`Telemetry::query_series`]
    pub fn blocking_query_series(
        &self,
        name: impl Into<String>,
        op: Op,
    ) -> Result<Option<Pooled<f64>>> {
        self.series.blocking_query(name, op)
    }

    /// Every (metric, operation) definition sorted by name then operation
    pub async fn list_definitions(&self) -> Result<Pooled<MetricDefinition>> {
        self.series.list_definitions().await
    }

    /// Blocking form of [`Telemetry::list_definitions`]
    pub fn blocking_list_definitions(&self) -> Result<Pooled<MetricDefinition>> {
        self.series.blocking_list_definitions()
    }

    /// Set note `name` to `value`, replacing any previous text
    pub async fn record_note(&self, name: impl Into<String>, value: impl Into<String>) -> Result<()> {
        self.notes.record(name, value).await
    }

    /// Like [`Telemetry::record_note`] but never waits on a full mailbox
    pub fn try_record_note(&self, name: impl Into<String>, value: impl Into<String>) -> Result<()> {
        self.notes.try_record(name, value)
    }

    /// Blocking form of [`Telemetry::record_note`]
    pub fn blocking_record_note(
        &self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<()> {
        self.notes.blocking_record(name, value)
    }

    /// Every note sorted by name
    pub async fn query_notes(&self) -> Result<Pooled<Note>> {
        self.notes.query().await
    }

    /// Blocking form of [`Telemetry::query_notes`]
    pub fn blocking_query_notes(&self) -> Result<Pooled<Note>> {
        self.notes.blocking_query()
    }

    /// Statistics of the snapshot, definition and note pools, in that order
    pub fn pool_stats(&self) -> [PoolStats; 3] {
        [
            self.series.snapshot_pool_stats(),
            self.series.listing_pool_stats(),
            self.notes.pool_stats(),
        ]
    }
}

fn record_command(name: impl Into<String>, count: i64, value: f64) -> SeriesCommand {
    SeriesCommand::Record {
        name: name.into(),
        count,
        value,
    }
}
