//! Error types for the documentation index
//!
//! This module provides the crate-level error type using thiserror. The
//! vector and vectorizer layers keep their own error enums; `LensError`
//! wraps them for callers of the pipelines.

use std::path::PathBuf;
use thiserror::Error;

use crate::semantic::VectorizerError;
use crate::vector::VectorError;

/// Main error type for ingestion and query operations
#[derive(Error, Debug)]
pub enum LensError {
    #[error(transparent)]
    Vector(#[from] VectorError),

    #[error(transparent)]
    Vectorizer(#[from] VectorizerError),

    #[error("Configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    #[error("Failed to prepare '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LensError {
    /// Get a stable status code for this error type.
    ///
    /// Returns a string identifier that host layers can match on instead
    /// of parsing messages.
    pub fn status_code(&self) -> String {
        match self {
            Self::Vector(error) => match error {
                VectorError::DimensionMismatch { .. } => "DIMENSION_MISMATCH",
                VectorError::InvalidDimension { .. } => "INVALID_DIMENSION",
                VectorError::CapacityExceeded { .. } => "CAPACITY_EXCEEDED",
                VectorError::InvalidScore { .. } => "INVALID_SCORE",
                VectorError::InvalidParameter { .. } => "INVALID_PARAMETER",
                VectorError::VersionMismatch { .. } | VectorError::IncompatibleMetric { .. } => {
                    "INDEX_INCOMPATIBLE"
                }
                VectorError::InvalidFormat(_)
                | VectorError::ChecksumMismatch
                | VectorError::Serialization(_) => "INDEX_CORRUPTED",
                VectorError::Storage(_) => "STORAGE_ERROR",
            },
            Self::Vectorizer(error) => match error {
                VectorizerError::Read { .. } | VectorizerError::Write { .. } => {
                    "VECTORIZER_IO_ERROR"
                }
                VectorizerError::Parse(_) | VectorizerError::Invalid(_) => "VECTORIZER_CORRUPTED",
                VectorizerError::UnsupportedVersion { .. } => "VECTORIZER_INCOMPATIBLE",
            },
            Self::Config(_) => "CONFIG_ERROR",
            Self::Io { .. } => "IO_ERROR",
        }
        .to_string()
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::Vector(VectorError::CapacityExceeded { .. }) => vec![
                "Raise index.max_elements and reopen the index",
                "Call grow_capacity() on the store to accept more documents",
            ],
            Self::Vector(VectorError::DimensionMismatch { .. }) => vec![
                "Use the same vectorizer for documents and queries",
                "Check that index.dimension matches the existing index file",
            ],
            Self::Vector(
                VectorError::VersionMismatch { .. }
                | VectorError::IncompatibleMetric { .. }
                | VectorError::InvalidFormat(_)
                | VectorError::ChecksumMismatch
                | VectorError::Serialization(_),
            ) => vec![
                "Delete the index file and re-ingest the documentation",
                "Check for disk errors or filesystem corruption",
            ],
            Self::Vector(VectorError::Storage(_)) | Self::Io { .. } => vec![
                "Check disk space and permissions in the storage directory",
            ],
            Self::Vectorizer(_) => vec![
                "Delete the vectorizer state file and re-ingest the documentation",
            ],
            Self::Config(_) => vec![
                "Check .doclens/settings.toml for typos",
                "Check DOCLENS_ environment variables",
            ],
            _ => vec![],
        }
    }
}

/// Result type alias for pipeline operations
pub type LensResult<T> = Result<T, LensError>;
