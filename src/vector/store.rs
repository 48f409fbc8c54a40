//! Vector store that pairs the HNSW graph with the indexed document texts.
//!
//! This module provides the main entry point for the vector side of the
//! index, coordinating between the graph, the document list, and the
//! on-disk file.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::vector::hnsw::{HnswGraph, HnswParams};
use crate::vector::storage::{IndexFile, PersistedIndex};
use crate::vector::types::{DocumentOrdinal, Score, VectorDimension, VectorError};

/// A single search result.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub ordinal: DocumentOrdinal,
    pub score: Score,
    pub text: String,
}

/// ANN index over document vectors with binary persistence.
///
/// Ordinals are assigned in insertion order and index both the graph node
/// and the stored text, so the two always have the same length. Inserts
/// stay in memory until [`VectorStore::save_index`] is called.
#[derive(Debug)]
pub struct VectorStore {
    /// Graph with unit-length copies of every vector
    graph: HnswGraph,

    /// Document text per ordinal
    documents: Vec<String>,

    /// Backing file
    file: IndexFile,

    /// Inserts made since the last save or load
    unsaved: usize,
}

impl VectorStore {
    /// Opens the index at `path`, or creates an empty one if the file is absent.
    ///
    /// # Arguments
    /// * `path` - Index file location
    /// * `dimension` - Dimension every stored vector must have
    /// * `params` - Graph parameters for a new index
    ///
    /// # Errors
    /// A file that exists but cannot be read, is corrupted, or was built
    /// for another dimension fails the open. It is never discarded.
    ///
    /// A loaded index keeps the graph parameters it was built with; only
    /// `ef_search` and a larger `max_elements` from `params` are applied.
    pub fn open(
        path: impl Into<PathBuf>,
        dimension: VectorDimension,
        params: HnswParams,
    ) -> Result<Self, VectorError> {
        params.validate()?;
        let file = IndexFile::new(path);

        match file.load(dimension)? {
            Some(PersistedIndex {
                mut graph,
                documents,
            }) => {
                graph.set_ef_search(params.ef_search)?;
                if params.max_elements > graph.capacity() {
                    graph.set_capacity(params.max_elements)?;
                }
                Ok(Self {
                    graph,
                    documents,
                    file,
                    unsaved: 0,
                })
            }
            None => {
                info!(
                    "Creating new vector index at {} (capacity {}, M={}, ef_construction={})",
                    file.path().display(),
                    params.max_elements,
                    params.m,
                    params.ef_construction
                );
                Ok(Self {
                    graph: HnswGraph::new(dimension, params)?,
                    documents: Vec::new(),
                    file,
                    unsaved: 0,
                })
            }
        }
    }

    /// Adds a document and its vector under the next ordinal.
    ///
    /// Fails with `DimensionMismatch` or `CapacityExceeded` without changing
    /// the store.
    pub fn add_document(
        &mut self,
        text: impl Into<String>,
        vector: &[f32],
    ) -> Result<DocumentOrdinal, VectorError> {
        let id = self.graph.insert(vector)?;
        debug_assert_eq!(id as usize, self.documents.len());
        self.documents.push(text.into());
        self.unsaved += 1;

        let ordinal = DocumentOrdinal::new(id);
        debug!("Indexed document {ordinal}");
        Ok(ordinal)
    }

    /// Returns the texts of up to `k` nearest documents, closest first.
    ///
    /// An empty store returns an empty list.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<String>, VectorError> {
        Ok(self
            .search_scored(query, k)?
            .into_iter()
            .map(|hit| hit.text)
            .collect())
    }

    /// Like [`VectorStore::search`] but keeps ordinals and similarity scores.
    pub fn search_scored(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>, VectorError> {
        let neighbors = self.graph.search(query, k)?;

        neighbors
            .into_iter()
            .map(|(id, distance)| {
                let ordinal = DocumentOrdinal::new(id);
                let text = self.documents.get(ordinal.as_index()).ok_or_else(|| {
                    VectorError::InvalidFormat(format!("no document stored for ordinal {ordinal}"))
                })?;
                Ok(SearchHit {
                    ordinal,
                    score: Score::from_distance(distance),
                    text: text.clone(),
                })
            })
            .collect()
    }

    /// Writes the graph, vectors and document texts to the index file.
    pub fn save_index(&mut self) -> Result<(), VectorError> {
        let snapshot = PersistedIndex {
            graph: self.graph.clone(),
            documents: self.documents.clone(),
        };
        self.file.write(&snapshot)?;
        self.unsaved = 0;
        Ok(())
    }

    /// Raises the maximum number of documents the store accepts.
    pub fn grow_capacity(&mut self, max_elements: usize) -> Result<(), VectorError> {
        self.graph.set_capacity(max_elements)?;
        info!("Vector index capacity raised to {max_elements}");
        Ok(())
    }

    /// Text stored for `ordinal`.
    #[must_use]
    pub fn document(&self, ordinal: DocumentOrdinal) -> Option<&str> {
        self.documents.get(ordinal.as_index()).map(String::as_str)
    }

    /// Stored texts in ordinal order.
    pub fn documents(&self) -> impl ExactSizeIterator<Item = &str> {
        self.documents.iter().map(String::as_str)
    }

    /// Number of indexed documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether no documents are indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Maximum number of documents.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.graph.capacity()
    }

    #[must_use]
    pub fn dimension(&self) -> VectorDimension {
        self.graph.dimension()
    }

    #[must_use]
    pub fn params(&self) -> HnswParams {
        self.graph.params()
    }

    /// Path of the backing index file.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Whether inserts were made since the last save or load.
    #[must_use]
    pub fn has_unsaved_changes(&self) -> bool {
        self.unsaved > 0
    }
}
