//! Capacity limits on the vector store and the ingestion pipeline.

use crate::common::TestLens;
use doclens::{HnswParams, VectorDimension, VectorError, VectorStore};
use tempfile::TempDir;

fn unit(dim: usize, hot: usize) -> Vec<f32> {
    let mut v = vec![0.0; dim];
    v[hot % dim] = 1.0;
    v
}

#[test]
fn test_one_past_capacity_fails_and_keeps_sizes_in_sync() {
    let temp_dir = TempDir::new().unwrap();
    let params = HnswParams {
        max_elements: 3,
        ..HnswParams::default()
    };
    let mut store = VectorStore::open(
        temp_dir.path().join("vector_index.bin"),
        VectorDimension::dimension_384(),
        params,
    )
    .unwrap();

    for i in 0..3 {
        store.add_document(format!("doc {i}"), &unit(384, i)).unwrap();
    }

    match store.add_document("doc 3", &unit(384, 3)) {
        Err(VectorError::CapacityExceeded { capacity }) => assert_eq!(capacity, 3),
        other => panic!("Expected capacity error, got {other:?}"),
    }
    assert_eq!(store.len(), 3);
    assert_eq!(store.search(&unit(384, 3), 10).unwrap().len(), 3);

    // The saved file holds the same three documents
    store.save_index().unwrap();
    let reloaded = VectorStore::open(store.path(), VectorDimension::dimension_384(), params)
        .unwrap();
    assert_eq!(reloaded.len(), 3);
    assert_eq!(reloaded.search(&unit(384, 0), 10).unwrap().len(), 3);
}

#[test]
fn test_grow_capacity_accepts_more_documents() {
    let temp_dir = TempDir::new().unwrap();
    let params = HnswParams {
        max_elements: 2,
        ..HnswParams::default()
    };
    let mut store = VectorStore::open(
        temp_dir.path().join("vector_index.bin"),
        VectorDimension::new(8).unwrap(),
        params,
    )
    .unwrap();

    store.add_document("a", &unit(8, 0)).unwrap();
    store.add_document("b", &unit(8, 1)).unwrap();
    assert!(store.add_document("c", &unit(8, 2)).is_err());

    // Shrinking below the current size is refused
    assert!(store.grow_capacity(1).is_err());
    assert_eq!(store.capacity(), 2);

    store.grow_capacity(4).unwrap();
    store.add_document("c", &unit(8, 2)).unwrap();
    assert_eq!(store.search(&unit(8, 2), 1).unwrap(), vec!["c"]);
}

#[test]
fn test_ingestion_reports_capacity_failures() {
    let test = TestLens::with_settings(|settings| {
        settings.index.max_elements = 4;
        settings.ingestion.checkpoint_interval = 2;
    });
    let documents: Vec<String> = (0..6).map(|i| format!("package number{i} docs")).collect();

    let stats = test.lens.ingestor().ingest_batch(&documents).unwrap();
    assert_eq!(stats.indexed, 4);
    assert_eq!(stats.failed, 2);

    let err = test.lens.ingestor().ingest_one("one more").unwrap_err();
    assert_eq!(err.status_code(), "CAPACITY_EXCEEDED");

    let reopened = test.reopen();
    assert_eq!(reopened.document_count(), 4);
}

#[test]
fn test_dimension_mismatch_is_rejected_not_padded() {
    let temp_dir = TempDir::new().unwrap();
    let mut store = VectorStore::open(
        temp_dir.path().join("vector_index.bin"),
        VectorDimension::dimension_384(),
        HnswParams::default(),
    )
    .unwrap();

    assert!(matches!(
        store.add_document("short", &[1.0; 383]),
        Err(VectorError::DimensionMismatch {
            expected: 384,
            actual: 383
        })
    ));
    assert!(matches!(
        store.search(&[1.0; 385], 1),
        Err(VectorError::DimensionMismatch {
            expected: 384,
            actual: 385
        })
    ));
    assert!(store.is_empty());
}
