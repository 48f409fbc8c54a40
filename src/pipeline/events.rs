//! Events published by the ingestion and query pipelines.
//!
//! Host layers subscribe to refresh their views instead of being called
//! directly. Each subscriber gets its own unbounded channel; subscribers
//! whose receiver was dropped are pruned on the next publish.

use std::path::PathBuf;
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, unbounded};
use parking_lot::Mutex;
use tracing::debug;

use crate::vector::DocumentOrdinal;

#[derive(Debug, Clone, PartialEq)]
pub enum LensEvent {
    /// A document was added to the vector store.
    DocumentIndexed { ordinal: DocumentOrdinal },

    /// The index (and vectorizer snapshot, when enabled) was written to disk.
    CheckpointSaved {
        path: PathBuf,
        documents: usize,
    },

    /// A query was answered.
    QueryAnswered {
        query: String,
        results: usize,
        similar_questions: usize,
    },
}

/// Fan-out publisher for [`LensEvent`]s.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<Sender<LensEvent>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new subscriber. Only events published afterwards are received.
    pub fn subscribe(&self) -> Receiver<LensEvent> {
        let (tx, rx) = unbounded();
        self.subscribers.lock().push(tx);
        rx
    }

    /// Sends `event` to every live subscriber.
    pub fn publish(&self, event: LensEvent) {
        let mut subscribers = self.subscribers.lock();
        if subscribers.is_empty() {
            return;
        }

        let before = subscribers.len();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());

        let dropped = before - subscribers.len();
        if dropped > 0 {
            debug!("Removed {dropped} disconnected event subscriber(s)");
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}
