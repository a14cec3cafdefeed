//! Write-behind persistence.
//!
//! The state machine never waits on storage. It hands blobs to a
//! `Persister`, whose background task applies them to the store one at a
//! time, in the order they were queued. A failed write is logged and
//! counted; the in-memory copy stays authoritative until the next write.

use std::sync::Arc;

use serde_json::Value as JsonValue;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::storage::KeyValueStore;

/// Running totals of the background writer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistReport {
    pub written: u64,
    pub failed: u64,
}

enum PersistCommand {
    Write { key: String, value: JsonValue },
    Flush(oneshot::Sender<PersistReport>),
}

#[derive(Debug, Clone)]
pub struct Persister {
    tx: mpsc::UnboundedSender<PersistCommand>,
}

impl std::fmt::Debug for PersistCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Write { key, .. } => f.debug_struct("Write").field("key", key).finish(),
            Self::Flush(_) => f.write_str("Flush"),
        }
    }
}

impl Persister {
    /// Start the writer task. Must be called from within a tokio runtime.
    ///
    /// The task exits once every `Persister` clone is dropped, returning the
    /// final report.
    pub fn spawn(store: Arc<dyn KeyValueStore>) -> (Self, JoinHandle<PersistReport>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<PersistCommand>();

        let handle = tokio::spawn(async move {
            let mut report = PersistReport::default();
            while let Some(command) = rx.recv().await {
                match command {
                    PersistCommand::Write { key, value } => match store.set(&key, value).await {
                        Ok(()) => {
                            report.written += 1;
                            debug!(%key, "Persisted");
                        }
                        Err(e) => {
                            report.failed += 1;
                            warn!(%key, error = %e, "Persist failed, keeping in-memory state");
                        }
                    },
                    PersistCommand::Flush(reply) => {
                        let _ = reply.send(report);
                    }
                }
            }
            report
        });

        (Self { tx }, handle)
    }

    /// Queue a write without waiting for it.
    pub fn enqueue(&self, key: String, value: JsonValue) {
        if self.tx.send(PersistCommand::Write { key, value }).is_err() {
            warn!("Persist queue closed, write dropped");
        }
    }

    /// Wait until everything queued before this call has been attempted.
    pub async fn flush(&self) -> Option<PersistReport> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(PersistCommand::Flush(reply)).ok()?;
        rx.await.ok()
    }
}
