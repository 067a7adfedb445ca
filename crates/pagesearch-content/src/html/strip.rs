//! Configurable HTML to text extraction.
//!
//! The document is parsed with an HTML5 parser, so broken markup, stray `<`
//! characters and entity references are handled the way a browser would.
//! Text nodes are joined with single spaces; elements whose tag or id is
//! listed for removal are skipped together with everything inside them.

use pagesearch_core::SearchConfig;
use scraper::{ElementRef, Html};

use super::text::normalize_whitespace;

/// Extracts indexable text from rendered HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlStrip {
    tags_to_remove: Vec<String>,
    ids_to_remove: Vec<String>,
}

impl Default for HtmlStrip {
    /// Removes `<head>` and `<script>`.
    fn default() -> Self {
        Self::new(["head", "script"], Vec::<String>::new())
    }
}

impl HtmlStrip {
    /// Create an extractor that removes the given tags and element ids.
    ///
    /// Tag names are matched case-insensitively, ids exactly.
    pub fn new<T, I>(tags: T, ids: I) -> Self
    where
        T: IntoIterator,
        T::Item: AsRef<str>,
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        Self {
            tags_to_remove: tags
                .into_iter()
                .map(|t| t.as_ref().trim().to_ascii_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
            ids_to_remove: ids
                .into_iter()
                .map(|i| i.as_ref().trim().to_string())
                .filter(|i| !i.is_empty())
                .collect(),
        }
    }

    /// Build from the `tags_to_remove` / `ids_to_remove` settings.
    pub fn from_config(config: &SearchConfig) -> Self {
        Self::new(&config.tags_to_remove, &config.ids_to_remove)
    }

    /// Tags whose contents are removed.
    pub fn tags_to_remove(&self) -> &[String] {
        &self.tags_to_remove
    }

    /// Element ids whose contents are removed.
    pub fn ids_to_remove(&self) -> &[String] {
        &self.ids_to_remove
    }

    /// Extract plain text from a full HTML document or fragment.
    ///
    /// The result has entities decoded, no markup, and whitespace runs
    /// collapsed to single spaces. Empty or text-free input gives an empty
    /// string.
    pub fn text_from_html(&self, html: &str) -> String {
        if html.trim().is_empty() {
            return String::new();
        }

        let document = Html::parse_document(html);
        let mut raw = String::with_capacity(html.len() / 2);
        self.collect_text(document.root_element(), &mut raw);

        let text = normalize_whitespace(&raw);
        log::trace!(
            "Extracted {} chars of text from {} chars of HTML",
            text.len(),
            html.len()
        );
        text
    }

    fn collect_text(&self, element: ElementRef<'_>, out: &mut String) {
        if self.is_removed(element) {
            return;
        }
        for child in element.children() {
            if let Some(text) = child.value().as_text() {
                out.push_str(text);
                out.push(' ');
            } else if let Some(child_element) = ElementRef::wrap(child) {
                self.collect_text(child_element, out);
            }
        }
    }

    fn is_removed(&self, element: ElementRef<'_>) -> bool {
        let el = element.value();
        if self
            .tags_to_remove
            .iter()
            .any(|tag| el.name().eq_ignore_ascii_case(tag))
        {
            return true;
        }
        el.id()
            .is_some_and(|id| self.ids_to_remove.iter().any(|remove| remove == id))
    }
}

// ============================================================================
// Tests
// ============================================================================
