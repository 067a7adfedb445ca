//! Common types for query building and summarizing.
//!
//! These types are used across all search providers and are always available
//! regardless of feature flags.

use pagesearch_core::NodeId;
use serde::{Deserialize, Serialize};

use crate::property::SearchProperty;

/// Index type searched when a request does not name one.
pub const DEFAULT_INDEX_TYPE: &str = "content";

/// Ranking strategy used to turn a search term into a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// Exact phrase boosted above the individual words.
    #[default]
    MultiRelevance,
    /// Like `MultiRelevance`, but every word must match.
    MultiAnd,
    /// Any word in any property, with simplified clauses.
    SimpleOr,
    /// The whole input as one phrase in every property.
    AsEntered,
}

impl SearchMode {
    /// Parse a mode name as used by templates.
    ///
    /// Matching is case-insensitive; unknown names select `MultiRelevance`.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "multiand" | "multi_and" => SearchMode::MultiAnd,
            "simpleor" | "simple_or" => SearchMode::SimpleOr,
            "asentered" | "as_entered" => SearchMode::AsEntered,
            _ => SearchMode::MultiRelevance,
        }
    }
}

/// Parameters for one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Unescaped user input.
    pub search_term: String,

    /// Restrict results to these subtrees. Empty or containing `-1` means
    /// no restriction.
    #[serde(default)]
    pub root_nodes: Vec<NodeId>,

    /// Logical content categories to search.
    #[serde(default = "default_index_types")]
    pub index_types: Vec<String>,

    /// Properties matched against, in order.
    #[serde(default)]
    pub search_properties: Vec<SearchProperty>,

    /// Key of the provider that executes the query.
    pub search_provider: String,
}

fn default_index_types() -> Vec<String> {
    vec![DEFAULT_INDEX_TYPE.to_string()]
}

impl SearchRequest {
    /// Create a request for a term against the given provider.
    pub fn new(search_term: impl Into<String>, search_provider: impl Into<String>) -> Self {
        Self {
            search_term: search_term.into(),
            root_nodes: Vec::new(),
            index_types: default_index_types(),
            search_properties: Vec::new(),
            search_provider: search_provider.into(),
        }
    }

    /// Set the properties matched against.
    pub fn with_properties(mut self, properties: Vec<SearchProperty>) -> Self {
        self.search_properties = properties;
        self
    }

    /// Set the subtree restriction.
    pub fn with_root_nodes(mut self, root_nodes: Vec<NodeId>) -> Self {
        self.root_nodes = root_nodes;
        self
    }

    /// Set the index types.
    pub fn with_index_types(mut self, index_types: Vec<String>) -> Self {
        self.index_types = index_types;
        self
    }
}

/// Parameters for rendering one result's title and summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRequest {
    /// Unescaped user input, used to build highlight queries.
    pub search_term: String,

    /// Title candidates; the first non-empty one wins.
    pub title_link_properties: Vec<SearchProperty>,

    /// Summary candidates; the first non-empty one wins.
    pub body_summary_properties: Vec<SearchProperty>,

    /// Markup inserted before each highlighted match.
    pub highlight_pre_tag: String,

    /// Markup inserted after each highlighted match.
    pub highlight_post_tag: String,

    /// Maximum summary length in characters.
    pub summary_length: usize,

    /// Key of the provider whose highlighter is used.
    pub search_provider: String,
}

/// Slice of a result set requested from a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SearchWindow {
    /// Number of leading hits to skip.
    pub offset: usize,
    /// Maximum hits to return; `None` returns everything after `offset`.
    pub limit: Option<usize>,
}

impl SearchWindow {
    /// Window covering the whole result set.
    pub fn all() -> Self {
        Self::default()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_search_mode_default() {
        assert_eq!(SearchMode::default(), SearchMode::MultiRelevance);
    }

    #[test]
    fn test_search_mode_parse() {
        assert_eq!(SearchMode::parse("MultiAnd"), SearchMode::MultiAnd);
        assert_eq!(SearchMode::parse("SimpleOr"), SearchMode::SimpleOr);
        assert_eq!(SearchMode::parse("AsEntered"), SearchMode::AsEntered);
        assert_eq!(SearchMode::parse("simple_or"), SearchMode::SimpleOr);
        assert_eq!(SearchMode::parse("MultiRelevance"), SearchMode::MultiRelevance);
        assert_eq!(SearchMode::parse("bogus"), SearchMode::MultiRelevance);
        assert_eq!(SearchMode::parse(""), SearchMode::MultiRelevance);
    }

    #[test]
    fn test_search_mode_serialization() {
        let json = serde_json::to_string(&SearchMode::AsEntered).unwrap();
        assert_eq!(json, "\"as_entered\"");
    }

    #[test]
    fn test_search_request_defaults() {
        let request = SearchRequest::new("hello", "default");
        assert_eq!(request.index_types, vec!["content"]);
        assert!(request.root_nodes.is_empty());
    }

    #[test]
    fn test_search_request_deserialize_defaults() {
        let request: SearchRequest =
            serde_json::from_str(r#"{"search_term":"x","search_provider":"p"}"#).unwrap();
        assert_eq!(request.index_types, vec!["content"]);
    }
}
