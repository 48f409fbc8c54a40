//! Word tokenizer for documents and queries.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Runs of characters that are not ASCII letters, digits or underscore.
static SEPARATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^A-Za-z0-9_]+").expect("separator pattern is valid")
});

/// Splits `text` into lowercase word tokens.
///
/// Tokens are maximal runs of `[a-z0-9_]` after lowercasing. Everything
/// else, including non-ASCII letters, separates tokens. Empty pieces are
/// dropped, so leading or trailing punctuation yields no tokens.
///
/// # Examples
/// ```
/// use doclens::semantic::tokenize;
///
/// assert_eq!(tokenize("Hello, World!"), vec!["hello", "world"]);
/// assert!(tokenize("...").is_empty());
/// ```
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    SEPARATOR
        .split(&lowered)
        .filter(|token| !token.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Distinct tokens of `text` in order of first appearance.
pub fn distinct_terms(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    tokenize(text)
        .into_iter()
        .filter(|token| seen.insert(token.clone()))
        .collect()
}
