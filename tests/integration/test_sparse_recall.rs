//! Self-queries over documents whose vocabularies never overlap.

use crate::common::TestLens;
use doclens::{HnswParams, VectorDimension, VectorStore};
use tempfile::TempDir;

fn disjoint_docs(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| format!("alpha{i} beta{i} gamma{i}"))
        .collect()
}

#[test]
fn test_disjoint_documents_find_themselves() {
    let test = TestLens::with_settings(|settings| {
        settings.ingestion.checkpoint_interval = 50;
    });
    let documents = disjoint_docs(200);
    let stats = test.lens.ingestor().ingest_batch(&documents).unwrap();
    assert_eq!(stats.indexed, 200);

    // The first 128 documents fill the 384 vocabulary slots
    let pipeline = test.lens.query_pipeline();
    for (i, document) in documents.iter().take(120).enumerate() {
        let answer = pipeline.answer(document, 1).unwrap();
        assert_eq!(
            answer.results,
            vec![document.clone()],
            "document {i} did not come back for its own text"
        );
    }

    let everything = pipeline.answer(&documents[7], 200).unwrap();
    assert_eq!(everything.results.len(), 200);
    assert_eq!(everything.results[0], documents[7]);
}

#[test]
fn test_one_hot_vectors_are_their_own_top_hit() {
    let temp_dir = TempDir::new().unwrap();
    let dimension = VectorDimension::dimension_384();
    let mut store = VectorStore::open(
        temp_dir.path().join("vector_index.bin"),
        dimension,
        HnswParams::default(),
    )
    .unwrap();

    let one_hot = |hot: usize| {
        let mut v = vec![0.0; dimension.get()];
        v[hot] = 1.0;
        v
    };
    let n = 300;
    for i in 0..n {
        store.add_document(format!("doc {i}"), &one_hot(i)).unwrap();
    }
    store.save_index().unwrap();

    let reloaded = VectorStore::open(store.path(), dimension, HnswParams::default()).unwrap();
    for store in [&store, &reloaded] {
        for i in (0..n).step_by(7) {
            let hits = store.search_scored(&one_hot(i), 1).unwrap();
            assert_eq!(hits[0].text, format!("doc {i}"));
        }
        assert_eq!(store.search(&one_hot(0), n).unwrap().len(), n);
    }
}
