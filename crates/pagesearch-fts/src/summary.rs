//! Result titles and summaries.
//!
//! Two strategies share the [`Summarizer`] contract:
//!
//! - [`PlainSummarizer`]: first non-empty stored value, summary cut back to a
//!   word boundary
//! - [`HighlightSummarizer`]: best highlighted fragment from the provider,
//!   falling back to plain output when no fragment is found
//!
//! A summarizer lives for one result set and is never shared between
//! concurrent queries, so the highlighter cache needs no locking.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::backend::SearchProvider;
use crate::highlight::{HighlightOptions, Highlighter};
use crate::property::SearchProperty;
use crate::terms::split_terms;
use crate::types::SummaryRequest;

/// Default title when no title property has a value.
pub const DEFAULT_NO_TITLE: &str = "Unknown Page";

/// Default summary when no summary property has a value.
pub const DEFAULT_NO_SUMMARY: &str = "Read More";

/// Produces a title and summary for each result.
pub trait Summarizer: Send {
    /// Title for a result's stored fields.
    fn title(&mut self, fields: &BTreeMap<String, String>) -> String;

    /// Summary for a result's stored fields.
    fn summary(&mut self, fields: &BTreeMap<String, String>) -> String;
}

/// Cut `value` to at most `max_chars` characters, backing up to the last
/// whitespace so no word is split. Values that fit are returned unchanged.
pub fn truncate_at_word(value: &str, max_chars: usize) -> String {
    match value.char_indices().nth(max_chars) {
        None => value.to_string(),
        Some((cut, _)) => value[..cut]
            .trim_end_matches(|c: char| !c.is_whitespace())
            .to_string(),
    }
}

/// Stored values as they are, with summary truncation.
#[derive(Debug, Clone)]
pub struct PlainSummarizer {
    request: SummaryRequest,
    no_title: String,
    no_summary: String,
}

impl PlainSummarizer {
    /// Create a plain summarizer with the default placeholders.
    pub fn new(request: SummaryRequest) -> Self {
        Self {
            request,
            no_title: DEFAULT_NO_TITLE.to_string(),
            no_summary: DEFAULT_NO_SUMMARY.to_string(),
        }
    }

    /// Override the "no title" / "no summary" placeholders.
    pub fn with_placeholders(mut self, no_title: impl Into<String>, no_summary: impl Into<String>) -> Self {
        self.no_title = no_title.into();
        self.no_summary = no_summary.into();
        self
    }

    /// The request this summarizer was built for.
    pub fn request(&self) -> &SummaryRequest {
        &self.request
    }
}

impl Summarizer for PlainSummarizer {
    fn title(&mut self, fields: &BTreeMap<String, String>) -> String {
        self.request
            .title_link_properties
            .iter()
            .filter_map(|p| fields.get(&p.name))
            .find(|v| !v.is_empty())
            .cloned()
            .unwrap_or_else(|| self.no_title.clone())
    }

    fn summary(&mut self, fields: &BTreeMap<String, String>) -> String {
        let length = self.request.summary_length;
        self.request
            .body_summary_properties
            .iter()
            .filter_map(|p| fields.get(&p.name))
            .map(|v| truncate_at_word(v, length))
            .find(|v| !v.is_empty())
            .unwrap_or_else(|| self.no_summary.clone())
    }
}

/// Highlighted fragments from the provider, one highlighter per field.
pub struct HighlightSummarizer {
    provider: Arc<dyn SearchProvider>,
    options: HighlightOptions,
    highlighters: HashMap<String, Option<Box<dyn Highlighter>>>,
    plain: PlainSummarizer,
}

impl HighlightSummarizer {
    /// Wrap a plain summarizer, highlighting through `provider`.
    pub fn new(plain: PlainSummarizer, provider: Arc<dyn SearchProvider>) -> Self {
        let request = plain.request();
        let options = HighlightOptions::new(
            request.highlight_pre_tag.clone(),
            request.highlight_post_tag.clone(),
            request.summary_length,
        );
        Self {
            provider,
            options,
            highlighters: HashMap::new(),
            plain,
        }
    }

    /// Number of highlighters built so far.
    pub fn cached_highlighters(&self) -> usize {
        self.highlighters.len()
    }

    fn first_fragment(
        &mut self,
        properties: &[SearchProperty],
        fields: &BTreeMap<String, String>,
    ) -> Option<String> {
        for property in properties {
            let Some(text) = fields.get(&property.name).filter(|t| !t.is_empty()) else {
                continue;
            };
            if let Some(fragment) = self.fragment(property, text) {
                return Some(fragment);
            }
        }
        None
    }

    fn fragment(&mut self, property: &SearchProperty, text: &str) -> Option<String> {
        if !self.highlighters.contains_key(&property.name) {
            let query = highlight_query(property, &self.plain.request.search_term);
            let built = match self.provider.highlighter(&property.name, &query, &self.options) {
                Ok(highlighter) => Some(highlighter),
                Err(e) => {
                    log::warn!("No highlighter for field {}: {e}", property.name);
                    None
                }
            };
            self.highlighters.insert(property.name.clone(), built);
        }

        self.highlighters
            .get(&property.name)?
            .as_ref()?
            .best_fragment(text)
            .filter(|f| !f.trim().is_empty())
    }
}

impl Summarizer for HighlightSummarizer {
    fn title(&mut self, fields: &BTreeMap<String, String>) -> String {
        let properties = self.plain.request.title_link_properties.clone();
        match self.first_fragment(&properties, fields) {
            Some(fragment) => fragment,
            None => self.plain.title(fields),
        }
    }

    fn summary(&mut self, fields: &BTreeMap<String, String>) -> String {
        let properties = self.plain.request.body_summary_properties.clone();
        match self.first_fragment(&properties, fields) {
            Some(fragment) => fragment,
            None => self.plain.summary(fields),
        }
    }
}

impl std::fmt::Debug for HighlightSummarizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HighlightSummarizer")
            .field("provider", &self.provider.name())
            .field("cached_highlighters", &self.highlighters.len())
            .finish()
    }
}

/// Field-less query used to highlight one property.
///
/// Wildcard terms contribute a half-weight prefix term; quoted terms never
/// get a fuzzy suffix.
pub fn highlight_query(property: &SearchProperty, search_term: &str) -> String {
    let mut query = String::new();
    for term in split_terms(search_term) {
        let exact = term.contains('"');
        let mut fuzzy = String::new();
        if !exact {
            if property.wildcard {
                query.push_str(&format!("{term}*^0.5 "));
            } else if property.is_fuzzy() {
                fuzzy = format!("~{}", property.fuzzy_multiplier);
            }
        }
        query.push_str(&format!("{term}{fuzzy} "));
    }
    query
}

// ============================================================================
// Tests
// ============================================================================
