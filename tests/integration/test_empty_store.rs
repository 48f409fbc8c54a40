//! Queries against an index with nothing in it.

use crate::common::TestLens;
use doclens::{HnswParams, LensEvent, TfIdfVectorizer, VectorDimension, VectorStore};
use tempfile::TempDir;

#[test]
fn test_empty_store_search_returns_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let store = VectorStore::open(
        temp_dir.path().join("vector_index.bin"),
        VectorDimension::dimension_384(),
        HnswParams::default(),
    )
    .unwrap();

    let query = TfIdfVectorizer::default().transform("anything");
    assert!(store.search(&query, 5).unwrap().is_empty());
    assert!(store.search_scored(&query, 0).unwrap().is_empty());
}

#[test]
fn test_empty_lens_answer_is_empty_not_error() {
    let test = TestLens::new();
    let events = test.lens.subscribe();

    let answer = test
        .lens
        .query_pipeline()
        .answer("how do I manage state", 5)
        .unwrap();

    assert!(answer.is_empty());
    assert!(answer.results.is_empty());
    assert!(answer.similar_questions.is_empty());
    assert_eq!(
        events.try_recv().unwrap(),
        LensEvent::QueryAnswered {
            query: "how do I manage state".to_string(),
            results: 0,
            similar_questions: 0,
        }
    );
}

#[test]
fn test_empty_batch_writes_no_checkpoint() {
    let test = TestLens::new();
    let documents: Vec<String> = Vec::new();

    let stats = test.lens.ingestor().ingest_batch(&documents).unwrap();

    assert_eq!(stats.indexed, 0);
    assert_eq!(stats.checkpoints, 0);
    assert!(!test.lens.settings().index_path().exists());
}

#[test]
fn test_saved_empty_index_reloads_empty() {
    let test = TestLens::new();
    test.lens.save().unwrap();
    assert!(test.lens.settings().index_path().exists());

    let reopened = test.reopen();
    assert_eq!(reopened.document_count(), 0);
    assert!(reopened.query_pipeline().answer("state", 3).unwrap().is_empty());
}
