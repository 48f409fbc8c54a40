//! Configuration module for the documentation index.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file
//! - Environment variable overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `DOCLENS_` and use double
//! underscores to separate nested levels:
//! - `DOCLENS_INDEX__MAX_ELEMENTS=20000` sets `index.max_elements`
//! - `DOCLENS_QUERY__DEFAULT_K=3` sets `query.default_k`
//! - `DOCLENS_LOGGING__LEVEL=debug` sets `logging.level`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::vector::{HnswParams, VectorDimension, VectorError};

/// Directory searched for `settings.toml`, from the current directory upwards.
pub const CONFIG_DIR: &str = ".doclens";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Directory holding the index file and vectorizer state
    #[serde(default = "default_storage_dir")]
    pub storage_dir: PathBuf,

    /// Vector index settings
    #[serde(default)]
    pub index: IndexConfig,

    /// Vectorizer settings
    #[serde(default)]
    pub vectorizer: VectorizerConfig,

    /// Query settings
    #[serde(default)]
    pub query: QueryConfig,

    /// Ingestion settings
    #[serde(default)]
    pub ingestion: IngestionConfig,

    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct IndexConfig {
    /// Index file name inside `storage_dir`
    #[serde(default = "default_index_file")]
    pub file_name: String,

    /// Vector dimension
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    /// Maximum number of indexed documents
    #[serde(default = "default_max_elements")]
    pub max_elements: usize,

    /// Links per node on the upper graph layers
    #[serde(default = "default_m")]
    pub m: usize,

    /// Candidate list size while building
    #[serde(default = "default_ef_construction")]
    pub ef_construction: usize,

    /// Candidate list size while searching
    #[serde(default = "default_ef_search")]
    pub ef_search: usize,

    /// Seed for node level assignment
    #[serde(default = "default_seed")]
    pub seed: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct VectorizerConfig {
    /// Vectorizer snapshot file name inside `storage_dir`
    #[serde(default = "default_state_file")]
    pub state_file: String,

    /// Save a snapshot at every ingestion checkpoint
    #[serde(default = "default_true")]
    pub persist: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct QueryConfig {
    /// Results returned when the caller does not pass `k`
    #[serde(default = "default_k")]
    pub default_k: usize,

    /// Neighbors used for the similar questions list
    #[serde(default = "default_k")]
    pub similar_questions_k: usize,

    /// Maximum words per similar question excerpt
    #[serde(default = "default_excerpt_words")]
    pub excerpt_words: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct IngestionConfig {
    /// Documents per chunk; the index is saved after each chunk
    #[serde(default = "default_checkpoint_interval")]
    pub checkpoint_interval: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Filter directive, e.g. "info" or "doclens=debug"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Colored output
    #[serde(default = "default_true")]
    pub ansi: bool,
}

// Default value functions
fn default_storage_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("doclens"))
        .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join("data"))
}
fn default_true() -> bool {
    true
}
fn default_index_file() -> String {
    "vector_index.bin".to_string()
}
fn default_dimension() -> usize {
    crate::vector::VECTOR_DIMENSION_384
}
fn default_max_elements() -> usize {
    10_000
}
fn default_m() -> usize {
    16
}
fn default_ef_construction() -> usize {
    200
}
fn default_ef_search() -> usize {
    50
}
fn default_seed() -> u64 {
    100
}
fn default_state_file() -> String {
    "vectorizer.json".to_string()
}
fn default_k() -> usize {
    5
}
fn default_excerpt_words() -> usize {
    10
}
fn default_checkpoint_interval() -> usize {
    50
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            storage_dir: default_storage_dir(),
            index: IndexConfig::default(),
            vectorizer: VectorizerConfig::default(),
            query: QueryConfig::default(),
            ingestion: IngestionConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            file_name: default_index_file(),
            dimension: default_dimension(),
            max_elements: default_max_elements(),
            m: default_m(),
            ef_construction: default_ef_construction(),
            ef_search: default_ef_search(),
            seed: default_seed(),
        }
    }
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        Self {
            state_file: default_state_file(),
            persist: true,
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_k: default_k(),
            similar_questions_k: default_k(),
            excerpt_words: default_excerpt_words(),
        }
    }
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            checkpoint_interval: default_checkpoint_interval(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            ansi: true,
        }
    }
}

impl IndexConfig {
    /// Validated vector dimension.
    pub fn vector_dimension(&self) -> Result<VectorDimension, VectorError> {
        VectorDimension::new(self.dimension)
    }

    /// Graph parameters for a new index.
    pub fn hnsw_params(&self) -> HnswParams {
        HnswParams {
            max_elements: self.max_elements,
            m: self.m,
            ef_construction: self.ef_construction,
            ef_search: self.ef_search,
            seed: self.seed,
        }
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join("settings.toml"));
        Self::load_from(config_path)
    }

    /// Load configuration from a specific file, still honoring env overrides
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path.as_ref()))
            // Double underscore separates nesting levels, single underscores
            // stay inside field names
            .merge(Env::prefixed("DOCLENS_").map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
            .extract()
            .map_err(Box::new)
    }

    /// Find `.doclens/settings.toml` from the current directory up to root
    fn find_workspace_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        current
            .ancestors()
            .map(|ancestor| ancestor.join(CONFIG_DIR))
            .find(|dir| dir.is_dir())
            .map(|dir| dir.join("settings.toml"))
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Full path of the vector index file.
    pub fn index_path(&self) -> PathBuf {
        self.storage_dir.join(&self.index.file_name)
    }

    /// Full path of the vectorizer snapshot.
    pub fn vectorizer_state_path(&self) -> PathBuf {
        self.storage_dir.join(&self.vectorizer.state_file)
    }

    /// Default settings storing everything under `storage_dir`.
    pub fn with_storage_dir(storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            storage_dir: storage_dir.into(),
            ..Self::default()
        }
    }
}
