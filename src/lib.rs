//! Documentation retrieval over a TF-IDF vectorizer and an HNSW vector index.
//!
//! Free-text package documentation is projected onto fixed-length TF-IDF
//! vectors, stored in a persisted approximate nearest-neighbor index, and
//! matched against natural-language questions by cosine similarity.

pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod semantic;
pub mod vector;

// Explicit exports for better API clarity
pub use config::Settings;
pub use error::{LensError, LensResult};
pub use pipeline::{
    Answer, DocumentIngestor, DocumentLens, EventBus, IngestStats, LensEvent, LensState,
    QueryPipeline, SharedState,
};
pub use semantic::{TfIdfVectorizer, VectorizerError, tokenize};
pub use vector::{
    DocumentOrdinal, HnswParams, Score, SearchHit, VECTOR_DIMENSION_384, VectorDimension,
    VectorError, VectorStore,
};
