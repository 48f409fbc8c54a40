//! JSON snapshots of the vectorizer state.
//!
//! The vocabulary order is the slot assignment, so a snapshot stores terms
//! as an ordered list rather than a map.

use std::io::Write;
use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::semantic::TfIdfVectorizer;
use crate::vector::VectorDimension;

/// Errors from reading or writing a vectorizer snapshot.
#[derive(Debug, thiserror::Error)]
pub enum VectorizerError {
    #[error("Failed to read vectorizer state '{path}': {source}\nSuggestion: Check file permissions")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "Failed to write vectorizer state '{path}': {source}\nSuggestion: Check disk space and file permissions"
    )]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "Failed to parse vectorizer state: {0}\nSuggestion: The state file may be corrupted. Delete it and re-ingest the documentation"
    )]
    Parse(#[from] serde_json::Error),

    #[error(
        "Vectorizer state version {found} is newer than supported version {supported}\nSuggestion: Upgrade doclens or rebuild the index"
    )]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("Invalid vectorizer state: {0}\nSuggestion: Delete the state file and re-ingest the documentation")]
    Invalid(String),
}

/// A vocabulary entry in slot order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermEntry {
    pub term: String,
    pub document_frequency: u32,
}

/// Serialized form of a [`TfIdfVectorizer`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorizerState {
    /// Format version
    pub version: u32,

    /// Output vector length
    pub max_features: usize,

    /// Documents registered
    pub document_count: usize,

    /// Document count of the last fit, if any
    pub fitted_documents: Option<usize>,

    /// Vocabulary in slot order
    pub terms: Vec<TermEntry>,

    /// IDF per term from the last fit; may be shorter than `terms`
    pub idf: Vec<f64>,

    /// Unix timestamp of the snapshot
    pub saved_at: u64,
}

impl VectorizerState {
    /// Current snapshot format version
    pub const CURRENT_VERSION: u32 = 1;

    /// Captures the current state of `vectorizer`.
    pub fn capture(vectorizer: &TfIdfVectorizer) -> Self {
        let terms = vectorizer
            .vocabulary()
            .iter()
            .zip(vectorizer.document_frequencies())
            .map(|(term, &df)| TermEntry {
                term: term.clone(),
                document_frequency: df,
            })
            .collect();

        Self {
            version: Self::CURRENT_VERSION,
            max_features: vectorizer.max_features().get(),
            document_count: vectorizer.document_count(),
            fitted_documents: vectorizer.fitted_documents(),
            terms,
            idf: vectorizer.idf_table().to_vec(),
            saved_at: Utc::now().timestamp() as u64,
        }
    }

    /// Rebuilds a vectorizer, checking the snapshot is self-consistent.
    pub fn restore(self) -> Result<TfIdfVectorizer, VectorizerError> {
        if self.version > Self::CURRENT_VERSION {
            return Err(VectorizerError::UnsupportedVersion {
                found: self.version,
                supported: Self::CURRENT_VERSION,
            });
        }

        let max_features = VectorDimension::new(self.max_features)
            .map_err(|e| VectorizerError::Invalid(e.to_string()))?;

        if self.idf.len() > self.terms.len() {
            return Err(VectorizerError::Invalid(format!(
                "{} IDF values for {} terms",
                self.idf.len(),
                self.terms.len()
            )));
        }

        let mut seen = std::collections::HashSet::with_capacity(self.terms.len());
        for entry in &self.terms {
            if entry.term.is_empty() {
                return Err(VectorizerError::Invalid("empty term".to_string()));
            }
            if entry.document_frequency == 0 {
                return Err(VectorizerError::Invalid(format!(
                    "term '{}' has zero document frequency",
                    entry.term
                )));
            }
            if entry.document_frequency as usize > self.document_count {
                return Err(VectorizerError::Invalid(format!(
                    "term '{}' appears in more documents than were added",
                    entry.term
                )));
            }
            if !seen.insert(entry.term.as_str()) {
                return Err(VectorizerError::Invalid(format!(
                    "duplicate term '{}'",
                    entry.term
                )));
            }
        }

        let vocabulary = self
            .terms
            .into_iter()
            .map(|entry| (entry.term, entry.document_frequency))
            .collect();

        Ok(TfIdfVectorizer::from_parts(
            max_features,
            self.document_count,
            vocabulary,
            self.idf,
            self.fitted_documents,
        ))
    }
}

impl TfIdfVectorizer {
    /// Writes a JSON snapshot to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), VectorizerError> {
        let write_error = |source| VectorizerError::Write {
            path: path.display().to_string(),
            source,
        };

        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent).map_err(write_error)?;

        // Write beside the target and rename, so a crash never leaves half a snapshot
        let json = serde_json::to_string_pretty(&VectorizerState::capture(self))?;
        let mut tmp = NamedTempFile::new_in(parent).map_err(write_error)?;
        tmp.write_all(json.as_bytes()).map_err(write_error)?;
        tmp.as_file().sync_all().map_err(write_error)?;
        tmp.persist(path).map_err(|e| write_error(e.error))?;

        debug!(
            "Saved vectorizer state ({} terms, {} documents) to {}",
            self.vocabulary_len(),
            self.document_count(),
            path.display()
        );
        Ok(())
    }

    /// Loads a snapshot from `path`.
    ///
    /// A missing file yields a fresh vectorizer with `max_features` slots.
    /// An existing snapshot keeps its own `max_features`.
    pub fn load(path: &Path, max_features: VectorDimension) -> Result<Self, VectorizerError> {
        if !path.exists() {
            return Ok(Self::new(max_features));
        }

        let json = std::fs::read_to_string(path).map_err(|source| VectorizerError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let state: VectorizerState = serde_json::from_str(&json)?;
        let vectorizer = state.restore()?;

        info!(
            "Loaded vectorizer state with {} terms over {} documents",
            vectorizer.vocabulary_len(),
            vectorizer.document_count()
        );
        Ok(vectorizer)
    }
}
