//! Series store actor.
//!
//! One task owns every metric series. Ingestion, definitions, queries and the
//! window tick all pass through that task, one at a time, so no series is
//! ever observed half-updated and no locks are needed.

use crate::core::{MetricDefinition, Op, OpScope, PulseError, Result};
use crate::metrics::definitions::sort_definitions;
use crate::metrics::series::MetricSeries;
use crate::pool::{PoolStats, Pooled, SharedPool};
use ahash::AHashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

const ACTOR: &str = "series";

/// Messages accepted by the series store
#[derive(Debug)]
pub enum SeriesCommand {
    /// Add an observation to the open window
    Record {
        /// Metric name
        name: String,
        /// Number of events
        count: i64,
        /// Summed value of those events
        value: f64,
    },
    /// Set the display name of one operation
    Define {
        /// Metric name
        name: String,
        /// Operation to label
        op: Op,
        /// Label
        display_name: String,
    },
    /// Set the display name of every operation
    DefineAll {
        /// Metric name
        name: String,
        /// Label
        display_name: String,
    },
    /// Snapshot one projection; `None` when the metric is unknown
    Query {
        /// Metric name
        name: String,
        /// Projection
        op: Op,
        /// Reply slot
        reply: oneshot::Sender<Option<Vec<f64>>>,
    },
    /// Sorted listing of every metric definition
    ListDefinitions {
        /// Reply slot
        reply: oneshot::Sender<Vec<MetricDefinition>>,
    },
}

/// State owned by the series actor
pub struct SeriesStore {
    series: AHashMap<String, MetricSeries>,
    window_len: usize,
    snapshots: SharedPool<f64>,
    listings: SharedPool<MetricDefinition>,
}

impl SeriesStore {
    /// Create an empty store keeping `window_len` windows per series
    pub fn new(
        window_len: usize,
        snapshots: SharedPool<f64>,
        listings: SharedPool<MetricDefinition>,
    ) -> Self {
        Self {
            series: AHashMap::new(),
            window_len,
            snapshots,
            listings,
        }
    }

    /// True when no series exists yet
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Start the actor on the current tokio runtime.
    ///
    /// The actor stops once every [`SeriesHandle`] has been dropped.
    pub fn spawn(
        self,
        mailbox_capacity: usize,
        tick_period: Duration,
    ) -> (SeriesHandle, JoinHandle<()>) {
        let (sender, mailbox) = mpsc::channel(mailbox_capacity);
        let handle = SeriesHandle {
            sender,
            snapshots: Arc::clone(&self.snapshots),
            listings: Arc::clone(&self.listings),
        };

        let task = tokio::spawn(self.run(mailbox, tick_period));
        (handle, task)
    }

    async fn run(mut self, mut mailbox: mpsc::Receiver<SeriesCommand>, tick_period: Duration) {
        let mut ticker = interval_at(Instant::now() + tick_period, tick_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::debug!(
            window_len = self.window_len,
            tick_ms = tick_period.as_millis() as u64,
            "series store started"
        );

        loop {
            tokio::select! {
                biased;
                _ = ticker.tick() => self.tick(),
                command = mailbox.recv() => match command {
                    Some(command) => self.apply(command),
                    None => break,
                },
            }
        }

        tracing::debug!(series = self.series.len(), "series store stopped");
    }

    /// Close the open window of every series
    pub fn tick(&mut self) {
        for series in self.series.values_mut() {
            series.close_window();
        }
        tracing::trace!(series = self.series.len(), "closed window");
    }

    /// Process one message
    pub fn apply(&mut self, command: SeriesCommand) {
        match command {
            SeriesCommand::Record { name, count, value } => {
                if let Some(series) = self.series_mut(name) {
                    series.record(count, value);
                }
            },
            SeriesCommand::Define {
                name,
                op,
                display_name,
            } => {
                if let Some(series) = self.series_mut(name) {
                    series.definitions_mut().define(OpScope::Only(op), &display_name);
                }
            },
            SeriesCommand::DefineAll { name, display_name } => {
                if let Some(series) = self.series_mut(name) {
                    series.definitions_mut().define(OpScope::All, &display_name);
                }
            },
            SeriesCommand::Query { name, op, reply } => {
                let snapshot = self.snapshot(&name, op);
                if let Err(Some(unread)) = reply.send(snapshot) {
                    self.snapshots.release(unread);
                }
            },
            SeriesCommand::ListDefinitions { reply } => {
                let listing = self.list_definitions();
                if let Err(unread) = reply.send(listing) {
                    self.listings.release(unread);
                }
            },
        }
    }

    /// Fill a pooled buffer with the `op` projection of `name`
    pub fn snapshot(&self, name: &str, op: Op) -> Option<Vec<f64>> {
        let series = self.series.get(name)?;
        let mut buf = self.snapshots.acquire();
        series.project_into(op, &mut buf);
        Some(buf)
    }

    /// Sorted definitions of every series, in a pooled buffer
    pub fn list_definitions(&self) -> Vec<MetricDefinition> {
        let mut buf = self.listings.acquire();
        for (name, series) in &self.series {
            series.definitions().list_into(name, &mut buf);
        }
        sort_definitions(&mut buf);
        buf
    }

    /// Series for `name`, created on first mention; empty names are ignored
    fn series_mut(&mut self, name: String) -> Option<&mut MetricSeries> {
        if name.is_empty() {
            return None;
        }

        let window_len = self.window_len;
        Some(self.series.entry(name).or_insert_with_key(|name| {
            tracing::debug!(metric = %name, "created series");
            MetricSeries::new(window_len)
        }))
    }
}

/// Client side of the series actor. Cheap to clone.
#[derive(Clone)]
pub struct SeriesHandle {
    sender: mpsc::Sender<SeriesCommand>,
    snapshots: SharedPool<f64>,
    listings: SharedPool<MetricDefinition>,
}

impl SeriesHandle {
    /// Enqueue a command, waiting while the mailbox is full
    pub async fn submit(&self, command: SeriesCommand) -> Result<()> {
        self.sender
            .send(command)
            .await
            .map_err(|_| PulseError::ChannelSend { actor: ACTOR })
    }

    /// Enqueue a command or fail immediately when the mailbox is full
    pub fn try_submit(&self, command: SeriesCommand) -> Result<()> {
        self.sender.try_send(command).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                tracing::debug!("series mailbox full, command rejected");
                PulseError::MailboxFull { actor: ACTOR }
            },
            mpsc::error::TrySendError::Closed(_) => PulseError::ChannelSend { actor: ACTOR },
        })
    }

    /// Enqueue a command from a thread outside the runtime
    pub fn blocking_submit(&self, command: SeriesCommand) -> Result<()> {
        self.sender
            .blocking_send(command)
            .map_err(|_| PulseError::ChannelSend { actor: ACTOR })
    }

    /// Snapshot one projection of `name`
    pub async fn query(&self, name: impl Into<String>, op: Op) -> Result<Option<Pooled<f64>>> {
        let (reply, answer) = oneshot::channel();
        self.submit(SeriesCommand::Query {
            name: name.into(),
            op,
            reply,
        })
        .await?;

        let snapshot = answer.await.map_err(|_| PulseError::ChannelReceive { actor: ACTOR })?;
        Ok(snapshot.map(|buf| Pooled::new(buf, Arc::clone(&self.snapshots))))
    }

    /// Blocking form of [`SeriesHandle::query`]
    pub fn blocking_query(&self, name: impl Into<String>, op: Op) -> Result<Option<Pooled<f64>>> {
        let (reply, answer) = oneshot::channel();
        self.blocking_submit(SeriesCommand::Query {
            name: name.into(),
            op,
            reply,
        })?;

        let snapshot = answer
            .blocking_recv()
            .map_err(|_| PulseError::ChannelReceive { actor: ACTOR })?;
        Ok(snapshot.map(|buf| Pooled::new(buf, Arc::clone(&self.snapshots))))
    }

    /// Sorted listing of every metric definition
    pub async fn list_definitions(&self) -> Result<Pooled<MetricDefinition>> {
        let (reply, answer) = oneshot::channel();
        self.submit(SeriesCommand::ListDefinitions { reply }).await?;

        let listing = answer.await.map_err(|_| PulseError::ChannelReceive { actor: ACTOR })?;
        Ok(Pooled::new(listing, Arc::clone(&self.listings)))
    }

    /// Blocking form of [`SeriesHandle::list_definitions`]
    pub fn blocking_list_definitions(&self) -> Result<Pooled<MetricDefinition>> {
        let (reply, answer) = oneshot::channel();
        self.blocking_submit(SeriesCommand::ListDefinitions { reply })?;

        let listing = answer
            .blocking_recv()
            .map_err(|_| PulseError::ChannelReceive { actor: ACTOR })?;
        Ok(Pooled::new(listing, Arc::clone(&self.listings)))
    }

    /// Snapshot buffer pool statistics
    pub fn snapshot_pool_stats(&self) -> PoolStats {
        self.snapshots.stats()
    }

    /// Definition listing pool statistics
    pub fn listing_pool_stats(&self) -> PoolStats {
        self.listings.stats()
    }
}

/// Build the message for a define call
pub fn define_command(name: String, scope: OpScope, display_name: String) -> SeriesCommand {
    match scope {
        OpScope::All => SeriesCommand::DefineAll { name, display_name },
        OpScope::Only(op) => SeriesCommand::Define {
            name,
            op,
            display_name,
        },
    }
}
