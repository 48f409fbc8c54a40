//! On-disk format for the persisted vector index.
//!
//! One file holds the whole index: the HNSW graph with its vectors and the
//! ordinal-to-text document list, so a reload restores both sides.
//!
//! # Storage Format
//!
//! - Header (64 bytes): magic, format version, dimension, metric id,
//!   payload length, SHA-256 of the payload, reserved padding
//! - Payload: bincode encoding of [`PersistedIndex`]
//!
//! The header is checked before the payload is decoded, so a file built for
//! another dimension or metric is rejected without touching its contents.
//! Writes go to a temporary file in the same directory and are renamed over
//! the target, so a crash mid-write leaves the previous index intact.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use bincode::{Decode, Encode};
use memmap2::{Mmap, MmapOptions};
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::vector::hnsw::HnswGraph;
use crate::vector::types::{VectorDimension, VectorError};

/// Current storage format version.
pub const STORAGE_VERSION: u32 = 2;

/// Metric id written to the header. Only cosine exists today.
pub const METRIC_COSINE: u32 = 1;

/// Size of the storage header in bytes.
const HEADER_SIZE: usize = 64;

/// Magic bytes to identify index files.
const MAGIC_BYTES: &[u8; 4] = b"DLIX";

/// Length of the SHA-256 digest stored in the header.
const CHECKSUM_SIZE: usize = 32;

/// Everything that survives a save/load cycle.
#[derive(Debug, Clone, Encode, Decode)]
pub struct PersistedIndex {
    pub graph: HnswGraph,
    pub documents: Vec<String>,
}

/// Decoded header fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Header {
    version: u32,
    dimension: u32,
    metric: u32,
    payload_len: u64,
    checksum: [u8; CHECKSUM_SIZE],
}

/// Handle to the index file at a fixed path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexFile {
    path: PathBuf,
}

impl IndexFile {
    /// Creates a handle; nothing is read or written yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the index file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Checks if the index file exists on disk.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Loads the index if the file exists.
    ///
    /// Returns `Ok(None)` when there is no file. A file that exists but is
    /// truncated, corrupted, or built for another dimension, metric or
    /// format version is an error.
    pub fn load(&self, expected: VectorDimension) -> Result<Option<PersistedIndex>, VectorError> {
        if !self.exists() {
            debug!("No index file at {}", self.path.display());
            return Ok(None);
        }

        let file = File::open(&self.path)?;
        if file.metadata()?.len() < HEADER_SIZE as u64 {
            return Err(VectorError::InvalidFormat(
                "File too small to contain header".to_string(),
            ));
        }
        let mmap = unsafe { MmapOptions::new().map(&file)? };

        let header = Self::read_header(&mmap)?;
        Self::check_compatibility(&header, expected)?;

        let payload_end = (HEADER_SIZE as u64).saturating_add(header.payload_len);
        if (mmap.len() as u64) < payload_end {
            return Err(VectorError::InvalidFormat(format!(
                "payload truncated: header declares {} bytes, file holds {}",
                header.payload_len,
                mmap.len() - HEADER_SIZE
            )));
        }
        let payload = &mmap[HEADER_SIZE..payload_end as usize];

        if Sha256::digest(payload).as_slice() != header.checksum {
            return Err(VectorError::ChecksumMismatch);
        }

        let (index, _): (PersistedIndex, usize) =
            bincode::decode_from_slice(payload, bincode::config::standard())
                .map_err(|e| VectorError::Serialization(e.to_string()))?;

        index.graph.validate()?;
        if index.graph.dimension() != expected {
            return Err(VectorError::DimensionMismatch {
                expected: expected.get(),
                actual: index.graph.dimension().get(),
            });
        }
        if index.graph.len() != index.documents.len() {
            return Err(VectorError::InvalidFormat(format!(
                "graph holds {} vectors but {} documents were stored",
                index.graph.len(),
                index.documents.len()
            )));
        }

        info!(
            "Loaded vector index from {} ({} documents)",
            self.path.display(),
            index.documents.len()
        );
        Ok(Some(index))
    }

    /// Writes the index, replacing any existing file.
    pub fn write(&self, index: &PersistedIndex) -> Result<(), VectorError> {
        let payload = bincode::encode_to_vec(index, bincode::config::standard())
            .map_err(|e| VectorError::Serialization(e.to_string()))?;

        let dimension = u32::try_from(index.graph.dimension().get()).map_err(|_| {
            VectorError::InvalidDimension {
                dimension: index.graph.dimension().get(),
                reason: "Dimension does not fit the index header",
            }
        })?;
        let mut checksum = [0u8; CHECKSUM_SIZE];
        checksum.copy_from_slice(Sha256::digest(&payload).as_slice());
        let header = Header {
            version: STORAGE_VERSION,
            dimension,
            metric: METRIC_COSINE,
            payload_len: payload.len() as u64,
            checksum,
        };

        let parent = self.ensure_parent()?;
        let mut tmp = NamedTempFile::new_in(parent)?;
        Self::write_header(tmp.as_file_mut(), &header)?;
        tmp.write_all(&payload)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| VectorError::Storage(e.error))?;

        info!(
            "Saved vector index to {} ({} documents, {} bytes)",
            self.path.display(),
            index.documents.len(),
            HEADER_SIZE + payload.len()
        );
        Ok(())
    }

    // Private helper methods

    fn ensure_parent(&self) -> Result<&Path, io::Error> {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                std::fs::create_dir_all(parent)?;
                Ok(parent)
            }
            _ => Ok(Path::new(".")),
        }
    }

    fn write_header(file: &mut File, header: &Header) -> Result<(), io::Error> {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0..4].copy_from_slice(MAGIC_BYTES);
        bytes[4..8].copy_from_slice(&header.version.to_le_bytes());
        bytes[8..12].copy_from_slice(&header.dimension.to_le_bytes());
        bytes[12..16].copy_from_slice(&header.metric.to_le_bytes());
        bytes[16..24].copy_from_slice(&header.payload_len.to_le_bytes());
        bytes[24..24 + CHECKSUM_SIZE].copy_from_slice(&header.checksum);
        file.write_all(&bytes)
    }

    fn read_header(mmap: &Mmap) -> Result<Header, VectorError> {
        if mmap.len() < HEADER_SIZE {
            return Err(VectorError::InvalidFormat(
                "File too small to contain header".to_string(),
            ));
        }

        if &mmap[0..4] != MAGIC_BYTES {
            return Err(VectorError::InvalidFormat(
                "Invalid magic bytes".to_string(),
            ));
        }

        let read_u32 =
            |at: usize| u32::from_le_bytes([mmap[at], mmap[at + 1], mmap[at + 2], mmap[at + 3]]);

        let mut payload_len = [0u8; 8];
        payload_len.copy_from_slice(&mmap[16..24]);
        let mut checksum = [0u8; CHECKSUM_SIZE];
        checksum.copy_from_slice(&mmap[24..24 + CHECKSUM_SIZE]);

        Ok(Header {
            version: read_u32(4),
            dimension: read_u32(8),
            metric: read_u32(12),
            payload_len: u64::from_le_bytes(payload_len),
            checksum,
        })
    }

    fn check_compatibility(header: &Header, expected: VectorDimension) -> Result<(), VectorError> {
        if header.version != STORAGE_VERSION {
            return Err(VectorError::VersionMismatch {
                expected: STORAGE_VERSION,
                actual: header.version,
            });
        }
        if header.metric != METRIC_COSINE {
            return Err(VectorError::IncompatibleMetric {
                expected: METRIC_COSINE,
                actual: header.metric,
            });
        }
        if header.dimension as usize != expected.get() {
            return Err(VectorError::DimensionMismatch {
                expected: expected.get(),
                actual: header.dimension as usize,
            });
        }
        Ok(())
    }
}
