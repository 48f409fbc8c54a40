//! Ingest documents and answer questions through the public API.

use crate::common::{TestLens, sample_docs};
use doclens::{
    LensEvent, TfIdfVectorizer, VectorDimension, VectorStore, VECTOR_DIMENSION_384,
};
use tempfile::TempDir;

#[test]
fn test_state_management_query_returns_provider_doc() {
    let test = TestLens::new();
    test.lens
        .ingestor()
        .ingest_batch(&sample_docs::basic())
        .unwrap();

    let answer = test
        .lens
        .query_pipeline()
        .answer("state management", 1)
        .unwrap();

    assert_eq!(answer.results, vec![sample_docs::PROVIDER.to_string()]);
    assert!(!answer.similar_questions.is_empty());
    for question in &answer.similar_questions {
        assert!(!question.is_empty());
        assert!(question.split_whitespace().count() <= 10);
    }
}

#[test]
fn test_components_compose_without_the_facade() {
    let temp_dir = TempDir::new().unwrap();
    let mut vectorizer = TfIdfVectorizer::default();
    for doc in sample_docs::basic() {
        vectorizer.add_document(doc);
    }
    vectorizer.fit();

    let mut store = VectorStore::open(
        temp_dir.path().join("vector_index.bin"),
        VectorDimension::dimension_384(),
        doclens::HnswParams::default(),
    )
    .unwrap();
    for doc in sample_docs::basic() {
        let vector = vectorizer.transform(doc);
        assert_eq!(vector.len(), VECTOR_DIMENSION_384);
        store.add_document(doc, &vector).unwrap();
    }

    let query = vectorizer.transform("state management");
    assert_eq!(store.search(&query, 1).unwrap(), vec![sample_docs::PROVIDER]);

    let hits = store.search_scored(&vectorizer.transform("dart http client"), 3).unwrap();
    assert_eq!(hits[0].text, sample_docs::HTTP);
    assert!(hits.windows(2).all(|pair| pair[0].score >= pair[1].score));
}

#[test]
fn test_results_follow_similarity_order() {
    let test = TestLens::new();
    test.lens
        .ingestor()
        .ingest_batch(&sample_docs::packages())
        .unwrap();

    let hits = test
        .lens
        .query_pipeline()
        .search_scored("http networking client", 3)
        .unwrap();

    assert_eq!(hits.len(), 3);
    assert!(hits[0].text.starts_with("dio "));
    assert!(hits.windows(2).all(|pair| pair[0].score >= pair[1].score));

    let answer = test
        .lens
        .query_pipeline()
        .answer("state management", 2)
        .unwrap();
    assert_eq!(answer.results.len(), 2);
    assert!(
        answer.results[0].starts_with("provider ") || answer.results[0].starts_with("bloc "),
        "unexpected top result: {}",
        answer.results[0]
    );
}

#[test]
fn test_similar_questions_use_first_sentence() {
    let test = TestLens::new();
    test.lens
        .ingestor()
        .ingest_batch(&sample_docs::packages())
        .unwrap();

    let answer = test.lens.query_pipeline().answer("routing", 1).unwrap();
    assert_eq!(answer.similar_questions.len(), 5);
    for question in &answer.similar_questions {
        assert!(!question.contains("Install it with"));
        let words = question.split_whitespace().count();
        assert!(words <= 10, "too many words in {question:?}");
    }
    assert!(
        answer
            .similar_questions
            .contains(&"go_router Declarative routing package using the router API".to_string())
    );
}

#[test]
fn test_query_events_are_published() {
    let test = TestLens::new();
    test.lens
        .ingestor()
        .ingest_batch(&sample_docs::basic())
        .unwrap();
    let events = test.lens.subscribe();

    test.lens
        .query_pipeline()
        .answer_default("json codegen")
        .unwrap();

    assert_eq!(
        events.try_recv().unwrap(),
        LensEvent::QueryAnswered {
            query: "json codegen".to_string(),
            results: 3,
            similar_questions: 3,
        }
    );
}

#[test]
fn test_stale_vectorizer_still_answers() {
    let test = TestLens::new();
    let ingestor = test.lens.ingestor();
    for doc in sample_docs::basic() {
        ingestor.ingest_one(doc).unwrap();
    }

    // New documents registered without a refit leave the IDF table stale
    test.lens
        .state()
        .write()
        .vectorizer
        .add_document("completely unrelated words");

    let answer = test.lens.query_pipeline().answer("unrelated", 2).unwrap();
    assert_eq!(answer.results.len(), 2);
}
