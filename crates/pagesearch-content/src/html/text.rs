//! Plain-text helpers.

use std::sync::LazyLock;

use regex::Regex;

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Invalid whitespace regex"));

/// Collapse every whitespace run to a single space and trim both ends.
///
/// # Example
///
/// ```rust
/// use pagesearch_content::normalize_whitespace;
///
/// assert_eq!(normalize_whitespace("  a \n\t b  "), "a b");
/// ```
pub fn normalize_whitespace(text: &str) -> String {
    WHITESPACE_RUN.replace_all(text, " ").trim().to_string()
}
