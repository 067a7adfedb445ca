//! Search term preprocessing.
//!
//! User input is split into terms and every term is escaped so that nothing
//! typed into a search box can change the structure of the query built from
//! it. Double-quoted spans survive as single exact-phrase terms.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static QUOTED_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\s*"([^"]+)"\s*"#).expect("Invalid quoted span regex"));

/// Characters with meaning in the query syntax.
const RESERVED: &[char] = &[
    '\\', '+', '-', '!', '(', ')', ':', '^', '[', ']', '"', '{', '}', '~', '*', '?', '|', '&',
    '/',
];

/// Words the query parser treats as boolean operators.
const OPERATORS: &[&str] = &["AND", "OR", "NOT"];

/// Escape a term for use inside a query string.
///
/// Reserved characters are backslash-escaped and bare boolean operator words
/// are lower-cased so the parser reads them as ordinary terms.
///
/// # Example
///
/// ```rust
/// use pagesearch_fts::terms::escape;
///
/// assert_eq!(escape("c++"), r"c\+\+");
/// assert_eq!(escape("title:x"), r"title\:x");
/// assert_eq!(escape("OR"), "or");
/// ```
pub fn escape(term: &str) -> String {
    if OPERATORS.contains(&term) {
        return term.to_ascii_lowercase();
    }
    let mut out = String::with_capacity(term.len() + 4);
    for c in term.chars() {
        if RESERVED.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Split raw input into escaped terms.
///
/// Quoted spans come first, each as one escaped and re-quoted phrase; the
/// remaining text is split on whitespace.
///
/// # Example
///
/// ```rust
/// use pagesearch_fts::terms::split_terms;
///
/// let terms = split_terms(r#"red "fire engine" truck"#);
/// assert_eq!(terms, vec![r#""fire engine""#, "red", "truck"]);
/// ```
pub fn split_terms(raw: &str) -> Vec<String> {
    let mut terms = Vec::new();
    let rest = QUOTED_SPAN.replace_all(raw, |caps: &Captures<'_>| {
        terms.push(format!("\"{}\"", escape(&caps[1])));
        " "
    });
    terms.extend(rest.split_whitespace().map(escape));
    terms
}

/// The whole input as a single escaped phrase term.
///
/// Blank input yields no terms.
pub fn quoted_term(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    vec![format!("\"{}\"", escape(trimmed))]
}
