//! Saving and reloading the index and the vectorizer.

use crate::common::{TestLens, sample_docs};
use doclens::{DocumentOrdinal, HnswParams, VectorDimension, VectorError, VectorStore};
use tempfile::TempDir;

fn spread_vectors(count: usize, dim: usize) -> Vec<Vec<f32>> {
    (0..count)
        .map(|i| {
            (0..dim)
                .map(|j| (((i * 31 + j * 17) % 23) as f32 / 23.0) - 0.5)
                .collect()
        })
        .collect()
}

#[test]
fn test_store_search_is_identical_after_reload() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("vector_index.bin");
    let dimension = VectorDimension::new(32).unwrap();
    let vectors = spread_vectors(200, 32);
    let queries = spread_vectors(10, 32);

    let before: Vec<Vec<String>> = {
        let mut store = VectorStore::open(&path, dimension, HnswParams::default()).unwrap();
        for (i, vector) in vectors.iter().enumerate() {
            store.add_document(format!("document {i}"), vector).unwrap();
        }
        store.save_index().unwrap();
        queries.iter().map(|q| store.search(q, 5).unwrap()).collect()
    };

    let reloaded = VectorStore::open(&path, dimension, HnswParams::default()).unwrap();
    assert_eq!(reloaded.len(), 200);
    assert_eq!(reloaded.document(DocumentOrdinal::new(199)), Some("document 199"));

    let after: Vec<Vec<String>> = queries.iter().map(|q| reloaded.search(q, 5).unwrap()).collect();
    assert_eq!(before, after);
}

#[test]
fn test_unsaved_inserts_are_not_persisted() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("vector_index.bin");
    let dimension = VectorDimension::new(4).unwrap();

    {
        let mut store = VectorStore::open(&path, dimension, HnswParams::default()).unwrap();
        store.add_document("saved", &[1.0, 0.0, 0.0, 0.0]).unwrap();
        store.save_index().unwrap();
        store.add_document("lost", &[0.0, 1.0, 0.0, 0.0]).unwrap();
    }

    let reloaded = VectorStore::open(&path, dimension, HnswParams::default()).unwrap();
    assert_eq!(reloaded.len(), 1);
    assert_eq!(reloaded.search(&[0.0, 1.0, 0.0, 0.0], 5).unwrap(), vec!["saved"]);
}

#[test]
fn test_lens_answers_survive_restart() {
    let test = TestLens::new();
    test.lens
        .ingestor()
        .ingest_batch(&sample_docs::packages())
        .unwrap();

    let queries = ["state management", "http client", "json code generation", "storage"];
    let before: Vec<_> = queries
        .iter()
        .map(|q| test.lens.query_pipeline().answer(q, 3).unwrap())
        .collect();

    let reopened = test.reopen();
    assert_eq!(reopened.document_count(), sample_docs::packages().len());

    let after: Vec<_> = queries
        .iter()
        .map(|q| reopened.query_pipeline().answer(q, 3).unwrap())
        .collect();
    assert_eq!(before, after);
}

#[test]
fn test_ingestion_continues_after_restart() {
    let test = TestLens::new();
    test.lens
        .ingestor()
        .ingest_batch(&sample_docs::basic())
        .unwrap();

    let reopened = test.reopen();
    let ordinal = reopened
        .ingestor()
        .ingest_one("routing package for deep links")
        .unwrap();
    assert_eq!(ordinal.get(), 3);

    let state = reopened.state();
    let state = state.read();
    assert_eq!(state.vectorizer.document_count(), 4);
    assert_eq!(state.store.len(), 4);
}

#[test]
fn test_incompatible_index_is_fatal() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("vector_index.bin");

    {
        let mut store =
            VectorStore::open(&path, VectorDimension::new(8).unwrap(), HnswParams::default())
                .unwrap();
        store.add_document("eight", &[1.0; 8]).unwrap();
        store.save_index().unwrap();
    }

    let result = VectorStore::open(&path, VectorDimension::dimension_384(), HnswParams::default());
    assert!(matches!(
        result,
        Err(VectorError::DimensionMismatch {
            expected: 384,
            actual: 8
        })
    ));

    // Corrupt one payload byte
    let mut bytes = std::fs::read(&path).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;
    std::fs::write(&path, bytes).unwrap();

    let result = VectorStore::open(&path, VectorDimension::new(8).unwrap(), HnswParams::default());
    assert!(matches!(result, Err(VectorError::ChecksumMismatch)));
}
