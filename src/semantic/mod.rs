//! Text-to-vector conversion for documentation snippets.
//!
//! Text is tokenized into lowercase words and projected onto a fixed-length
//! TF-IDF vector whose slots follow vocabulary insertion order.

mod state;
mod tokenizer;
mod vectorizer;

pub use state::{TermEntry, VectorizerError, VectorizerState};
pub use tokenizer::{distinct_terms, tokenize};
pub use vectorizer::TfIdfVectorizer;
