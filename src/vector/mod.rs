//! Approximate nearest-neighbor storage for document vectors.
//!
//! Documents are kept in an HNSW graph under cosine distance, next to their
//! original text. The whole index persists to a single checksummed file that
//! is memory-mapped on load and replaced atomically on save.
//!
//! # Architecture
//! - `hnsw`: layered proximity graph with greedy descent and best-first search
//! - `storage`: versioned binary file format
//! - `store`: [`VectorStore`], the ordinal-to-text mapping on top of the graph

mod distance;
mod hnsw;
mod storage;
mod store;
mod types;

// Re-export core types for public API
pub use distance::{cosine_distance, cosine_similarity, normalize};
pub use hnsw::{HnswGraph, HnswParams};
pub use storage::{IndexFile, METRIC_COSINE, PersistedIndex, STORAGE_VERSION};
pub use store::{SearchHit, VectorStore};
pub use types::{DocumentOrdinal, Score, VECTOR_DIMENSION_384, VectorDimension, VectorError};
