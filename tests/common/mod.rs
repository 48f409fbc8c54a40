#![allow(dead_code)]

use doclens::{DocumentLens, Settings};
use tempfile::TempDir;

/// A lens with its own storage directory, removed when dropped.
pub struct TestLens {
    pub dir: TempDir,
    pub lens: DocumentLens,
}

impl TestLens {
    pub fn new() -> Self {
        Self::with_settings(|_| {})
    }

    /// Starts from test defaults and lets the caller adjust them.
    pub fn with_settings(adjust: impl FnOnce(&mut Settings)) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let settings = test_settings(&dir, adjust);
        let lens = DocumentLens::open(settings).expect("Failed to open lens");
        Self { dir, lens }
    }

    /// Opens a second lens over the same storage directory.
    pub fn reopen(&self) -> DocumentLens {
        DocumentLens::open(self.lens.settings().clone()).expect("Failed to reopen lens")
    }
}

pub fn test_settings(dir: &TempDir, adjust: impl FnOnce(&mut Settings)) -> Settings {
    let mut settings = Settings::with_storage_dir(dir.path().join("storage"));
    settings.index.max_elements = 1_000;
    settings.ingestion.checkpoint_interval = 10;
    settings.logging.ansi = false;
    adjust(&mut settings);
    settings
}

pub mod sample_docs {
    pub const PROVIDER: &str = "flutter provider state management";
    pub const HTTP: &str = "http networking client for dart";
    pub const JSON: &str = "json serialization codegen";

    pub fn basic() -> Vec<&'static str> {
        vec![PROVIDER, HTTP, JSON]
    }

    /// Package descriptions with a README-like second sentence.
    pub fn packages() -> Vec<String> {
        [
            ("provider", "A wrapper around InheritedWidget for state management"),
            ("riverpod", "Reactive caching and data-binding framework for state"),
            ("bloc", "Predictable state management library using streams"),
            ("http", "Composable future-based library for making HTTP requests"),
            ("dio", "Powerful HTTP networking client with interceptors and retries"),
            ("json_serializable", "Generates code for converting to and from JSON"),
            ("freezed", "Code generation for immutable classes and unions"),
            ("sqflite", "SQLite plugin for persistent relational storage"),
            ("hive", "Lightweight key-value database written in pure dart"),
            ("go_router", "Declarative routing package using the router API"),
            ("shared_preferences", "Persistent storage for simple key value data"),
            ("flutter_hooks", "React style hooks for managing widget lifecycle"),
        ]
        .iter()
        .map(|(name, description)| {
            format!("{name} {description}. Install it with pub add {name} and import the library.")
        })
        .collect()
    }
}
