//! Field-name normalization.
//!
//! Index field names are restricted to ASCII letters, digits and `_`.
//! Property aliases typed by editors ("Page Title", "body-text") are mapped
//! onto that alphabet before they reach a query string or an index document.

/// Map a property name onto the index field alphabet.
///
/// Performs the following transformations:
/// 1. Trims leading/trailing whitespace
/// 2. Drops characters outside `[A-Za-z0-9_]`, treating each dropped run as
///    a word break
/// 3. Upper-cases the first letter of every word after the first
/// 4. Drops leading digits so the result starts with a letter or `_`
///
/// Names that are already valid pass through unchanged.
///
/// # Examples
///
/// ```
/// use pagesearch_core::safe_alias;
///
/// assert_eq!(safe_alias("nodeName"), "nodeName");
/// assert_eq!(safe_alias("FullTextSearch"), "FullTextSearch");
/// assert_eq!(safe_alias("page title"), "pageTitle");
/// assert_eq!(safe_alias("__IndexType"), "__IndexType");
/// assert_eq!(safe_alias("2nd-heading"), "ndHeading");
/// ```
pub fn safe_alias(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut word_break = false;

    for c in name.trim().chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            if out.is_empty() && c.is_ascii_digit() {
                continue;
            }
            if word_break && !out.is_empty() {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
            word_break = false;
        } else {
            word_break = true;
        }
    }

    out
}

/// Returns whether a name is already in the index field alphabet.
pub fn is_safe_alias(name: &str) -> bool {
    !name.is_empty() && safe_alias(name) == name
}
