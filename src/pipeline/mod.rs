//! Ingestion and query orchestration over the shared index state.
//!
//! The vectorizer and the vector store live together behind a single
//! `RwLock`. Ingestion takes the write lock one chunk at a time; queries
//! take the read lock and can run concurrently with each other.

mod events;
mod ingest;
mod query;

pub use events::{EventBus, LensEvent};
pub use ingest::{DocumentIngestor, IngestStats};
pub use query::{Answer, QueryPipeline, excerpt};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crossbeam_channel::Receiver;
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::error::{LensError, LensResult};
use crate::semantic::TfIdfVectorizer;
use crate::vector::{VectorError, VectorStore};

/// Everything a query needs, kept consistent under one lock.
#[derive(Debug)]
pub struct LensState {
    pub vectorizer: TfIdfVectorizer,
    pub store: VectorStore,
}

/// Shared handle to the index state.
pub type SharedState = Arc<RwLock<LensState>>;

impl LensState {
    /// Writes the index file and, if `vectorizer_path` is set, the vectorizer snapshot.
    pub fn persist(&mut self, vectorizer_path: Option<&Path>) -> LensResult<()> {
        self.store.save_index()?;
        if let Some(path) = vectorizer_path {
            self.vectorizer.save(path)?;
        }
        Ok(())
    }
}

/// Entry point owning the index state, its settings and the event bus.
///
/// # Examples
/// ```no_run
/// use doclens::{DocumentLens, Settings};
///
/// let lens = DocumentLens::open(Settings::with_storage_dir("/tmp/doclens"))?;
/// lens.ingestor().ingest_batch(&["flutter provider state management"])?;
/// let answer = lens.query_pipeline().answer("state management", 1)?;
/// println!("{:?}", answer.results);
/// # Ok::<(), doclens::LensError>(())
/// ```
#[derive(Debug)]
pub struct DocumentLens {
    settings: Arc<Settings>,
    state: SharedState,
    events: EventBus,
}

impl DocumentLens {
    /// Opens or creates the index under `settings.storage_dir`.
    ///
    /// A missing index file or vectorizer snapshot starts empty. Files that
    /// exist but cannot be loaded fail the open.
    pub fn open(settings: Settings) -> LensResult<Self> {
        std::fs::create_dir_all(&settings.storage_dir).map_err(|source| LensError::Io {
            path: settings.storage_dir.clone(),
            source,
        })?;

        let dimension = settings.index.vector_dimension()?;
        let store = VectorStore::open(
            settings.index_path(),
            dimension,
            settings.index.hnsw_params(),
        )?;

        let vectorizer = if settings.vectorizer.persist {
            TfIdfVectorizer::load(&settings.vectorizer_state_path(), dimension)?
        } else {
            TfIdfVectorizer::new(dimension)
        };

        if vectorizer.max_features() != store.dimension() {
            return Err(VectorError::DimensionMismatch {
                expected: store.dimension().get(),
                actual: vectorizer.max_features().get(),
            }
            .into());
        }
        let vectorizer = reconcile_vectorizer(vectorizer, &store, settings.vectorizer.persist);

        info!(
            "Opened document index at {} ({} documents, {} terms)",
            settings.storage_dir.display(),
            store.len(),
            vectorizer.vocabulary_len()
        );

        Ok(Self {
            settings: Arc::new(settings),
            state: Arc::new(RwLock::new(LensState { vectorizer, store })),
            events: EventBus::new(),
        })
    }

    /// Ingestion handle sharing this index.
    pub fn ingestor(&self) -> DocumentIngestor {
        DocumentIngestor::new(
            Arc::clone(&self.state),
            Arc::clone(&self.settings),
            self.events.clone(),
        )
    }

    /// Query handle sharing this index.
    pub fn query_pipeline(&self) -> QueryPipeline {
        QueryPipeline::new(
            Arc::clone(&self.state),
            self.settings.query.clone(),
            self.events.clone(),
        )
    }

    /// Writes the index file and the vectorizer snapshot.
    pub fn save(&self) -> LensResult<()> {
        let vectorizer_path = self.vectorizer_state_path();
        self.state.write().persist(vectorizer_path.as_deref())?;

        self.events.publish(LensEvent::CheckpointSaved {
            path: self.settings.index_path(),
            documents: self.document_count(),
        });
        Ok(())
    }

    /// Receives events published after this call.
    pub fn subscribe(&self) -> Receiver<LensEvent> {
        self.events.subscribe()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Shared state, for callers that need direct access to the store.
    pub fn state(&self) -> SharedState {
        Arc::clone(&self.state)
    }

    pub fn document_count(&self) -> usize {
        self.state.read().store.len()
    }

    fn vectorizer_state_path(&self) -> Option<PathBuf> {
        self.settings
            .vectorizer
            .persist
            .then(|| self.settings.vectorizer_state_path())
    }
}

/// Every indexed document passed through the vectorizer in ordinal order, so
/// a vectorizer that disagrees with the store on the document count is
/// rebuilt from the stored texts.
fn reconcile_vectorizer(
    vectorizer: TfIdfVectorizer,
    store: &VectorStore,
    persisted: bool,
) -> TfIdfVectorizer {
    if vectorizer.document_count() == store.len() {
        return vectorizer;
    }

    if persisted {
        warn!(
            "Vectorizer state covers {} documents but the index holds {}; rebuilding it from the index",
            vectorizer.document_count(),
            store.len()
        );
    } else {
        debug!("Rebuilding vectorizer from {} indexed documents", store.len());
    }
    TfIdfVectorizer::from_documents(vectorizer.max_features(), store.documents())
}
