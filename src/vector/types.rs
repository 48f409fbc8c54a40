//! Type-safe wrappers and core types for the vector index.
//!
//! Newtypes here keep ordinals, dimensions and scores from being mixed up
//! with plain integers and floats at the store boundary.

use bincode::{Decode, Encode};
use thiserror::Error;

/// Standard vector dimension for document vectors.
pub const VECTOR_DIMENSION_384: usize = 384;

/// Position of a document in the store.
///
/// Ordinals are assigned sequentially starting at zero, so the first
/// document is ordinal 0. The same ordinal indexes the graph node and the
/// stored document text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentOrdinal(u32);

impl DocumentOrdinal {
    /// Creates a new `DocumentOrdinal`.
    #[must_use]
    pub const fn new(ordinal: u32) -> Self {
        Self(ordinal)
    }

    /// Returns the underlying u32 value.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Returns the ordinal as a slice index.
    #[must_use]
    pub const fn as_index(&self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for DocumentOrdinal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Cosine similarity of a search hit.
///
/// Derived from the cosine distance as `1.0 - distance`, so it lies in
/// `[-1.0, 1.0]`. TF-IDF vectors are non-negative, which keeps their
/// scores in `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Score(f32);

impl Score {
    /// Creates a new `Score` with validation.
    ///
    /// Returns an error if the value is NaN or outside `[-1.0, 1.0]`.
    pub fn new(value: f32) -> Result<Self, VectorError> {
        if value.is_nan() {
            return Err(VectorError::InvalidScore {
                value,
                reason: "Score cannot be NaN",
            });
        }
        if !(-1.0..=1.0).contains(&value) {
            return Err(VectorError::InvalidScore {
                value,
                reason: "Score must be in range [-1.0, 1.0]",
            });
        }
        Ok(Self(value))
    }

    /// Builds a score from a cosine distance, clamping float drift.
    #[must_use]
    pub fn from_distance(distance: f32) -> Self {
        let similarity = 1.0 - distance;
        if similarity.is_nan() {
            return Self(0.0);
        }
        Self(similarity.clamp(-1.0, 1.0))
    }

    /// Returns the underlying f32 value.
    #[must_use]
    pub fn get(&self) -> f32 {
        self.0
    }
}

impl Eq for Score {}

impl PartialOrd for Score {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Score {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Type-safe wrapper for vector dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub struct VectorDimension(usize);

impl VectorDimension {
    /// Creates a new `VectorDimension` with validation.
    ///
    /// Returns an error if the dimension is zero.
    pub fn new(dim: usize) -> Result<Self, VectorError> {
        if dim == 0 {
            return Err(VectorError::InvalidDimension {
                dimension: 0,
                reason: "Vector dimension cannot be zero",
            });
        }
        Ok(Self(dim))
    }

    /// Creates a standard 384-dimensional vector dimension.
    #[must_use]
    pub const fn dimension_384() -> Self {
        Self(VECTOR_DIMENSION_384)
    }

    /// Returns the underlying dimension value.
    #[must_use]
    pub const fn get(&self) -> usize {
        self.0
    }

    /// Validates that a vector has the expected dimension.
    pub fn validate_vector(&self, vector: &[f32]) -> Result<(), VectorError> {
        if vector.len() != self.0 {
            return Err(VectorError::DimensionMismatch {
                expected: self.0,
                actual: vector.len(),
            });
        }
        Ok(())
    }
}

/// Errors that can occur during vector operations.
///
/// All error messages include actionable suggestions for resolution.
#[derive(Error, Debug)]
pub enum VectorError {
    #[error(
        "Vector dimension mismatch: expected {expected}, got {actual}\nSuggestion: Vectorize documents and queries with the same vectorizer configuration"
    )]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid vector dimension: {dimension}\nReason: {reason}")]
    InvalidDimension {
        dimension: usize,
        reason: &'static str,
    },

    #[error(
        "Index capacity exceeded: the index holds at most {capacity} documents\nSuggestion: Grow the capacity with grow_capacity() or raise index.max_elements and rebuild"
    )]
    CapacityExceeded { capacity: usize },

    #[error("Invalid score value: {value}\nReason: {reason}")]
    InvalidScore { value: f32, reason: &'static str },

    #[error("Invalid index parameter '{name}': {reason}")]
    InvalidParameter {
        name: &'static str,
        reason: &'static str,
    },

    #[error(
        "Invalid index format version: expected {expected}, got {actual}\nSuggestion: Delete the index file and re-ingest the documentation"
    )]
    VersionMismatch { expected: u32, actual: u32 },

    #[error(
        "Index was built with distance metric id {actual}, expected {expected} (cosine)\nSuggestion: Delete the index file and re-ingest the documentation"
    )]
    IncompatibleMetric { expected: u32, actual: u32 },

    #[error("Invalid index format: {0}\nSuggestion: The index file may be truncated or was not written by this library")]
    InvalidFormat(String),

    #[error(
        "Index checksum mismatch\nSuggestion: The index file is corrupted. Delete it and re-ingest the documentation"
    )]
    ChecksumMismatch,

    #[error(
        "Serialization error: {0}\nSuggestion: Check that vector data is valid and not corrupted"
    )]
    Serialization(String),

    #[error("Storage error: {0}\nSuggestion: Check disk space and file permissions")]
    Storage(#[from] std::io::Error),
}
