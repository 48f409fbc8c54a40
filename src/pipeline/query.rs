//! Answering natural-language questions against the index.

use tracing::debug;

use crate::config::QueryConfig;
use crate::error::LensResult;
use crate::pipeline::events::{EventBus, LensEvent};
use crate::pipeline::SharedState;
use crate::vector::SearchHit;

/// Result of [`QueryPipeline::answer`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Answer {
    /// Nearest documents, closest first
    pub results: Vec<String>,

    /// Short excerpts of the nearest documents
    pub similar_questions: Vec<String>,
}

impl Answer {
    /// Whether nothing matched, e.g. because the index is empty.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty() && self.similar_questions.is_empty()
    }
}

/// Read-only query handle.
///
/// Queries use whatever IDF table the vectorizer was last fitted with.
#[derive(Debug, Clone)]
pub struct QueryPipeline {
    state: SharedState,
    config: QueryConfig,
    events: EventBus,
}

impl QueryPipeline {
    pub(crate) fn new(state: SharedState, config: QueryConfig, events: EventBus) -> Self {
        Self {
            state,
            config,
            events,
        }
    }

    /// Finds the `k` documents nearest to `query` plus a list of similar
    /// question excerpts.
    ///
    /// An empty index yields an empty [`Answer`], not an error.
    pub fn answer(&self, query: &str, k: usize) -> LensResult<Answer> {
        let answer = {
            let state = self.state.read();
            if state.store.is_empty() {
                Answer::default()
            } else {
                let vector = state.vectorizer.transform(query);
                let results = state.store.search(&vector, k)?;
                let similar_questions = state
                    .store
                    .search(&vector, self.config.similar_questions_k)?
                    .iter()
                    .map(|document| excerpt(document, self.config.excerpt_words))
                    .filter(|excerpt| !excerpt.is_empty())
                    .collect();
                Answer {
                    results,
                    similar_questions,
                }
            }
        };

        debug!(
            "Answered '{query}' with {} results and {} similar questions",
            answer.results.len(),
            answer.similar_questions.len()
        );
        self.events.publish(LensEvent::QueryAnswered {
            query: query.to_string(),
            results: answer.results.len(),
            similar_questions: answer.similar_questions.len(),
        });

        Ok(answer)
    }

    /// [`answer`](Self::answer) with the configured default `k`.
    pub fn answer_default(&self, query: &str) -> LensResult<Answer> {
        self.answer(query, self.config.default_k)
    }

    /// Nearest documents with their ordinals and similarity scores.
    pub fn search_scored(&self, query: &str, k: usize) -> LensResult<Vec<SearchHit>> {
        let state = self.state.read();
        let vector = state.vectorizer.transform(query);
        Ok(state.store.search_scored(&vector, k)?)
    }
}

/// Short preview of a document for the similar questions list.
///
/// Takes the text before the first `.`, or the whole document when that is
/// blank, and keeps at most `max_words` words. `...` marks a cut.
pub fn excerpt(document: &str, max_words: usize) -> String {
    let first_sentence = document.split('.').next().unwrap_or_default().trim();
    let source = if first_sentence.is_empty() {
        document
    } else {
        first_sentence
    };

    let words: Vec<&str> = source.split_whitespace().collect();
    if words.len() > max_words {
        format!("{}...", words[..max_words].join(" "))
    } else {
        words.join(" ")
    }
}
