//! Readers and a writer sharing one index.

use std::thread;

use crate::common::{TestLens, sample_docs};

#[test]
fn test_queries_run_while_ingesting() {
    let test = TestLens::with_settings(|settings| {
        settings.ingestion.checkpoint_interval = 5;
    });
    test.lens
        .ingestor()
        .ingest_batch(&sample_docs::packages())
        .unwrap();

    let extra: Vec<String> = (0..40)
        .map(|i| format!("generated package{i} for topic{} utilities", i % 4))
        .collect();

    thread::scope(|scope| {
        let ingestor = test.lens.ingestor();
        let writer = scope.spawn(move || ingestor.ingest_batch(&extra).unwrap());

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let pipeline = test.lens.query_pipeline();
                scope.spawn(move || {
                    for _ in 0..25 {
                        let answer = pipeline.answer("state management", 3).unwrap();
                        assert_eq!(answer.results.len(), 3);
                        assert!(answer.similar_questions.len() <= 5);
                    }
                })
            })
            .collect();

        let stats = writer.join().unwrap();
        assert_eq!(stats.indexed, 40);
        for reader in readers {
            reader.join().unwrap();
        }
    });

    let total = sample_docs::packages().len() + 40;
    assert_eq!(test.lens.document_count(), total);

    let state = test.lens.state();
    let state = state.read();
    assert_eq!(state.vectorizer.document_count(), total);
    assert!(!state.store.has_unsaved_changes());
}

#[test]
fn test_query_handles_are_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<doclens::QueryPipeline>();
    assert_send_sync::<doclens::DocumentIngestor>();
    assert_send_sync::<doclens::DocumentLens>();
}
