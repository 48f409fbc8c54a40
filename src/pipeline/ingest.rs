//! Adding documents to the index.
//!
//! Batches are processed in chunks. Each chunk registers its documents with
//! the vectorizer, refits the IDF table, vectorizes the chunk in parallel,
//! inserts the vectors and then saves a checkpoint, so a crash loses at most
//! one chunk.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::error::LensResult;
use crate::pipeline::SharedState;
use crate::pipeline::events::{EventBus, LensEvent};
use crate::vector::{DocumentOrdinal, VectorError};

/// Maximum number of error messages kept in [`IngestStats::errors`]
const MAX_RECORDED_ERRORS: usize = 100;

/// Statistics collected during ingestion
#[derive(Debug, Default)]
pub struct IngestStats {
    /// Number of documents added to the store
    pub indexed: usize,

    /// Number of documents that were rejected
    pub failed: usize,

    /// Number of checkpoints written
    pub checkpoints: usize,

    /// Time elapsed during ingestion
    pub elapsed: Duration,

    /// Errors encountered as (batch position, message), first 100 only
    pub errors: Vec<(usize, String)>,

    /// Start time of ingestion
    start_time: Option<Instant>,
}

impl IngestStats {
    /// Create new stats and start timing
    pub fn new() -> Self {
        Self {
            start_time: Some(Instant::now()),
            ..Default::default()
        }
    }

    /// Stop timing and record elapsed time
    pub fn stop_timing(&mut self) {
        if let Some(start) = self.start_time.take() {
            self.elapsed = start.elapsed();
        }
    }

    /// Record a rejected document
    pub fn add_error(&mut self, position: usize, error: String) {
        if self.errors.len() < MAX_RECORDED_ERRORS {
            self.errors.push((position, error));
        }
        self.failed += 1;
    }

    /// Documents per second, if anything was indexed
    pub fn throughput(&self) -> Option<f64> {
        let seconds = self.elapsed.as_secs_f64();
        (self.indexed > 0 && seconds > 0.0).then(|| self.indexed as f64 / seconds)
    }
}

/// Write-side handle over the shared index state.
#[derive(Debug, Clone)]
pub struct DocumentIngestor {
    state: SharedState,
    settings: Arc<Settings>,
    events: EventBus,
}

impl DocumentIngestor {
    pub(crate) fn new(state: SharedState, settings: Arc<Settings>, events: EventBus) -> Self {
        Self {
            state,
            settings,
            events,
        }
    }

    /// Indexes one document without saving.
    ///
    /// Registers the text with the vectorizer, refits, vectorizes it and
    /// inserts it. A full store is reported before the vectorizer is
    /// touched, so a rejected document leaves no trace.
    pub fn ingest_one(&self, text: &str) -> LensResult<DocumentOrdinal> {
        let ordinal = {
            let mut state = self.state.write();
            if state.store.len() >= state.store.capacity() {
                return Err(VectorError::CapacityExceeded {
                    capacity: state.store.capacity(),
                }
                .into());
            }

            state.vectorizer.add_document(text);
            state.vectorizer.fit();
            let vector = state.vectorizer.transform(text);
            state.store.add_document(text, &vector)?
        };

        self.events.publish(LensEvent::DocumentIndexed { ordinal });
        Ok(ordinal)
    }

    /// Indexes `documents` in chunks, saving a checkpoint after each chunk.
    ///
    /// Documents that do not fit in the store are counted as failed and
    /// logged; the rest of the batch is still processed. Errors while saving
    /// a checkpoint abort the batch.
    pub fn ingest_batch<S>(&self, documents: &[S]) -> LensResult<IngestStats>
    where
        S: AsRef<str> + Sync,
    {
        let mut stats = IngestStats::new();
        let chunk_size = self.settings.ingestion.checkpoint_interval.max(1);
        let vectorizer_path = self
            .settings
            .vectorizer
            .persist
            .then(|| self.settings.vectorizer_state_path());

        for (chunk_index, chunk) in documents.chunks(chunk_size).enumerate() {
            let offset = chunk_index * chunk_size;
            let mut indexed = Vec::with_capacity(chunk.len());

            let saved_documents = {
                let mut state = self.state.write();

                let room = state.store.capacity().saturating_sub(state.store.len());
                let (accepted, rejected) = chunk.split_at(room.min(chunk.len()));

                for document in accepted {
                    state.vectorizer.add_document(document.as_ref());
                }
                state.vectorizer.fit();
                let vectors = state.vectorizer.transform_batch(accepted);

                for (position, (document, vector)) in accepted.iter().zip(&vectors).enumerate() {
                    match state.store.add_document(document.as_ref(), vector) {
                        Ok(ordinal) => {
                            indexed.push(ordinal);
                            stats.indexed += 1;
                        }
                        Err(e) => stats.add_error(offset + position, e.to_string()),
                    }
                }

                if !rejected.is_empty() {
                    let capacity = state.store.capacity();
                    warn!(
                        "Index is full at {capacity} documents, skipped {} document(s)",
                        rejected.len()
                    );
                    for position in 0..rejected.len() {
                        stats.add_error(
                            offset + accepted.len() + position,
                            VectorError::CapacityExceeded { capacity }.to_string(),
                        );
                    }
                }

                if indexed.is_empty() {
                    None
                } else {
                    state.persist(vectorizer_path.as_deref())?;
                    Some(state.store.len())
                }
            };

            for ordinal in indexed {
                self.events.publish(LensEvent::DocumentIndexed { ordinal });
            }

            if let Some(documents) = saved_documents {
                stats.checkpoints += 1;
                debug!("Checkpoint {} saved with {documents} documents", stats.checkpoints);
                self.events.publish(LensEvent::CheckpointSaved {
                    path: self.settings.index_path(),
                    documents,
                });
            }
        }

        stats.stop_timing();
        info!(
            "Ingested {} documents ({} failed, {} checkpoints) in {:.2}s",
            stats.indexed,
            stats.failed,
            stats.checkpoints,
            stats.elapsed.as_secs_f64()
        );
        Ok(stats)
    }
}
