//! Note store actor: a flat last-write-wins table of short texts.

use crate::core::{Note, PulseError, Result};
use crate::pool::{PoolStats, Pooled, SharedPool};
use ahash::AHashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

const ACTOR: &str = "notes";

/// Messages accepted by the note store
#[derive(Debug)]
pub enum NoteCommand {
    /// Insert or overwrite a note
    Record {
        /// Note key
        name: String,
        /// Note text
        value: String,
    },
    /// Every note, sorted by name
    Query {
        /// Reply slot
        reply: oneshot::Sender<Vec<Note>>,
    },
}

/// State owned by the note actor
pub struct NoteStore {
    notes: AHashMap<String, String>,
    listings: SharedPool<Note>,
}

impl NoteStore {
    /// Create an empty store
    pub fn new(listings: SharedPool<Note>) -> Self {
        Self {
            notes: AHashMap::new(),
            listings,
        }
    }

    /// Start the actor on the current tokio runtime
    pub fn spawn(self, mailbox_capacity: usize) -> (NoteHandle, JoinHandle<()>) {
        let (sender, mailbox) = mpsc::channel(mailbox_capacity);
        let handle = NoteHandle {
            sender,
            listings: Arc::clone(&self.listings),
        };

        let task = tokio::spawn(self.run(mailbox));
        (handle, task)
    }

    async fn run(mut self, mut mailbox: mpsc::Receiver<NoteCommand>) {
        tracing::debug!("note store started");
        while let Some(command) = mailbox.recv().await {
            self.apply(command);
        }
        tracing::debug!(notes = self.notes.len(), "note store stopped");
    }

    /// Process one message
    pub fn apply(&mut self, command: NoteCommand) {
        match command {
            NoteCommand::Record { name, value } => {
                if !name.is_empty() {
                    self.notes.insert(name, value);
                }
            },
            NoteCommand::Query { reply } => {
                if let Err(unread) = reply.send(self.list()) {
                    self.listings.release(unread);
                }
            },
        }
    }

    /// Every note sorted by name, in a pooled buffer
    pub fn list(&self) -> Vec<Note> {
        let mut buf = self.listings.acquire();
        buf.extend(self.notes.iter().map(|(name, value)| Note {
            name: name.clone(),
            value: value.clone(),
        }));
        buf.sort_unstable_by(|a, b| a.name.cmp(&b.name));
        buf
    }
}

/// Client side of the note actor. Cheap to clone.
#[derive(Clone)]
pub struct NoteHandle {
    sender: mpsc::Sender<NoteCommand>,
    listings: SharedPool<Note>,
}

impl NoteHandle {
    /// Record a note, waiting while the mailbox is full
    pub async fn record(&self, name: impl Into<String>, value: impl Into<String>) -> Result<()> {
        self.sender
            .send(NoteCommand::Record {
                name: name.into(),
                value: value.into(),
            })
            .await
            .map_err(|_| PulseError::ChannelSend { actor: ACTOR })
    }

    /// Record a note or fail immediately when the mailbox is full
    pub fn try_record(&self, name: impl Into<String>, value: impl Into<String>) -> Result<()> {
        self.sender
            .try_send(NoteCommand::Record {
                name: name.into(),
                value: value.into(),
            })
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => {
                    tracing::debug!("note mailbox full, note rejected");
                    PulseError::MailboxFull { actor: ACTOR }
                },
                mpsc::error::TrySendError::Closed(_) => PulseError::ChannelSend { actor: ACTOR },
            })
    }

    /// Blocking form of [`NoteHandle::record`]
    pub fn blocking_record(&self, name: impl Into<String>, value: impl Into<String>) -> Result<()> {
        self.sender
            .blocking_send(NoteCommand::Record {
                name: name.into(),
                value: value.into(),
            })
            .map_err(|_| PulseError::ChannelSend { actor: ACTOR })
    }

    /// Every note, sorted by name
    pub async fn query(&self) -> Result<Pooled<Note>> {
        let (reply, answer) = oneshot::channel();
        self.sender
            .send(NoteCommand::Query { reply })
            .await
            .map_err(|_| PulseError::ChannelSend { actor: ACTOR })?;

        let notes = answer.await.map_err(|_| PulseError::ChannelReceive { actor: ACTOR })?;
        Ok(Pooled::new(notes, Arc::clone(&self.listings)))
    }

    /// Blocking form of [`NoteHandle::query`]
    pub fn blocking_query(&self) -> Result<Pooled<Note>> {
        let (reply, answer) = oneshot::channel();
        self.sender
            .blocking_send(NoteCommand::Query { reply })
            .map_err(|_| PulseError::ChannelSend { actor: ACTOR })?;

        let notes = answer
            .blocking_recv()
            .map_err(|_| PulseError::ChannelReceive { actor: ACTOR })?;
        Ok(Pooled::new(notes, Arc::clone(&self.listings)))
    }

    /// Note listing pool statistics
    pub fn pool_stats(&self) -> PoolStats {
        self.listings.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PoolingMode;
    use crate::pool::shared_pool;

    fn record(store: &mut NoteStore, name: &str, value: &str) {
        store.apply(NoteCommand::Record {
            name: name.to_string(),
            value: value.to_string(),
        });
    }

    #[test]
    fn test_last_write_wins() {
        let mut store = NoteStore::new(shared_pool(PoolingMode::Disabled, 0, 4));
        record(&mut store, "OK", "x");
        record(&mut store, "OK", "y");

        let notes = store.list();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].name, "OK");
        assert_eq!(notes[0].value, "y");
    }

    #[test]
    fn test_sorted_and_empty_name_dropped() {
        let mut store = NoteStore::new(shared_pool(PoolingMode::Disabled, 0, 4));
        record(&mut store, "version", "1.2.0");
        record(&mut store, "", "ignored");
        record(&mut store, "build", "release");

        let names: Vec<String> = store.list().into_iter().map(|n| n.name).collect();
        assert_eq!(names, vec!["build".to_string(), "version".to_string()]);
    }

    #[test]
    fn test_reused_listing_is_cleared() {
        let pool = shared_pool(PoolingMode::Leaky, 2, 4);
        let mut store = NoteStore::new(Arc::clone(&pool));
        record(&mut store, "a", "1");
        record(&mut store, "b", "2");

        pool.release(store.list());
        let again = store.list();
        assert_eq!(again.len(), 2);
        assert_eq!(pool.stats().hits, 1);
    }
}
