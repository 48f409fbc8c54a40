//! TF-IDF vectorizer with a fixed output dimension.
//!
//! The vocabulary is an append-only list. A term's position in that list is
//! its vector slot, so only the first `max_features` terms ever seen are
//! represented and later terms never reach a vector.

use std::collections::HashMap;

use rayon::prelude::*;
use tracing::debug;

use crate::semantic::tokenizer::{distinct_terms, tokenize};
use crate::vector::VectorDimension;

/// Term-frequency / inverse-document-frequency vectorizer.
///
/// Documents are registered with [`add_document`](Self::add_document), the
/// IDF table is rebuilt by [`fit`](Self::fit), and any text is projected by
/// [`transform`](Self::transform). IDF values are only refreshed by `fit`;
/// until then, `transform` keeps using the previous table. Terms added since
/// the last fit have no IDF entry and contribute zero.
#[derive(Debug, Clone)]
pub struct TfIdfVectorizer {
    /// Output vector length
    max_features: VectorDimension,

    /// Documents registered so far
    document_count: usize,

    /// Terms in first-seen order; the index is the vector slot
    vocabulary: Vec<String>,

    /// Term to vocabulary position
    positions: HashMap<String, usize>,

    /// Document frequency per vocabulary position
    document_frequency: Vec<u32>,

    /// IDF per vocabulary position, covering the vocabulary as of the last fit
    idf: Vec<f64>,

    /// Document count used by the last fit
    fitted_documents: Option<usize>,
}

impl Default for TfIdfVectorizer {
    fn default() -> Self {
        Self::new(VectorDimension::dimension_384())
    }
}

impl TfIdfVectorizer {
    /// Creates an empty vectorizer producing vectors of length `max_features`.
    pub fn new(max_features: VectorDimension) -> Self {
        Self {
            max_features,
            document_count: 0,
            vocabulary: Vec::new(),
            positions: HashMap::new(),
            document_frequency: Vec::new(),
            idf: Vec::new(),
            fitted_documents: None,
        }
    }

    /// Builds a vectorizer over `documents` in order and fits it.
    ///
    /// Registering the same texts in the same order reproduces the slot
    /// assignment of the vectorizer that first saw them.
    pub fn from_documents<'a>(
        max_features: VectorDimension,
        documents: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        let mut vectorizer = Self::new(max_features);
        for document in documents {
            vectorizer.add_document(document);
        }
        vectorizer.fit();
        vectorizer
    }

    /// Registers a document, counting each distinct term once.
    ///
    /// New terms are appended to the vocabulary with a frequency of one.
    /// The IDF table is not touched.
    pub fn add_document(&mut self, text: &str) {
        self.document_count += 1;

        for term in distinct_terms(text) {
            match self.positions.get(&term) {
                Some(&position) => self.document_frequency[position] += 1,
                None => {
                    let position = self.vocabulary.len();
                    self.positions.insert(term.clone(), position);
                    self.vocabulary.push(term);
                    self.document_frequency.push(1);
                }
            }
        }
    }

    /// Rebuilds the IDF table as `ln(N / df)` for every vocabulary term.
    pub fn fit(&mut self) {
        let n = self.document_count as f64;
        self.idf = self
            .document_frequency
            .iter()
            .map(|&df| (n / f64::from(df)).ln())
            .collect();
        self.fitted_documents = Some(self.document_count);

        debug!(
            "Fitted IDF over {} documents and {} terms",
            self.document_count,
            self.vocabulary.len()
        );
    }

    /// Projects `text` into a vector of exactly `max_features` values.
    ///
    /// Slot `i` holds `tf * idf` for the `i`-th vocabulary term, where `tf`
    /// is the raw count of that term in `text`.
    pub fn transform(&self, text: &str) -> Vec<f32> {
        let dimension = self.max_features.get();
        let mut counts = vec![0u32; dimension];

        for token in tokenize(text) {
            if let Some(slot) = self.slot_of(&token) {
                counts[slot] += 1;
            }
        }

        counts
            .iter()
            .enumerate()
            .map(|(slot, &tf)| match (tf, self.idf.get(slot)) {
                (0, _) | (_, None) => 0.0,
                (tf, Some(idf)) => (f64::from(tf) * idf) as f32,
            })
            .collect()
    }

    /// Transforms many texts in parallel. Output order matches input order.
    pub fn transform_batch<S>(&self, texts: &[S]) -> Vec<Vec<f32>>
    where
        S: AsRef<str> + Sync,
    {
        texts
            .par_iter()
            .map(|text| self.transform(text.as_ref()))
            .collect()
    }

    /// Vector slot of `term`, if it falls within the first `max_features`
    /// vocabulary entries.
    pub fn slot_of(&self, term: &str) -> Option<usize> {
        self.positions
            .get(term)
            .copied()
            .filter(|&position| position < self.max_features.get())
    }

    /// IDF of `term` from the last fit.
    pub fn idf(&self, term: &str) -> Option<f64> {
        let position = *self.positions.get(term)?;
        self.idf.get(position).copied()
    }

    /// Number of documents `term` appeared in.
    pub fn document_frequency(&self, term: &str) -> Option<u32> {
        let position = *self.positions.get(term)?;
        self.document_frequency.get(position).copied()
    }

    /// Vocabulary in slot order, including terms past `max_features`.
    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn document_count(&self) -> usize {
        self.document_count
    }

    pub fn max_features(&self) -> VectorDimension {
        self.max_features
    }

    /// Whether `fit` has been called at least once.
    pub fn is_fitted(&self) -> bool {
        self.fitted_documents.is_some()
    }

    /// Whether documents were added since the last fit.
    pub fn is_stale(&self) -> bool {
        self.fitted_documents != Some(self.document_count)
    }

    /// Document count the current IDF table was computed from.
    pub(crate) fn fitted_documents(&self) -> Option<usize> {
        self.fitted_documents
    }

    /// IDF values per vocabulary position from the last fit.
    pub(crate) fn idf_table(&self) -> &[f64] {
        &self.idf
    }

    /// Document frequencies per vocabulary position.
    pub(crate) fn document_frequencies(&self) -> &[u32] {
        &self.document_frequency
    }

    /// Rebuilds a vectorizer from already-validated parts.
    pub(crate) fn from_parts(
        max_features: VectorDimension,
        document_count: usize,
        vocabulary: Vec<(String, u32)>,
        idf: Vec<f64>,
        fitted_documents: Option<usize>,
    ) -> Self {
        let mut positions = HashMap::with_capacity(vocabulary.len());
        let mut terms = Vec::with_capacity(vocabulary.len());
        let mut document_frequency = Vec::with_capacity(vocabulary.len());

        for (position, (term, df)) in vocabulary.into_iter().enumerate() {
            positions.insert(term.clone(), position);
            terms.push(term);
            document_frequency.push(df);
        }

        Self {
            max_features,
            document_count,
            vocabulary: terms,
            positions,
            document_frequency,
            idf,
            fitted_documents,
        }
    }
}
