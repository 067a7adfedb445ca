//! Query string construction.
//!
//! Provides `QueryBuilder`, which turns a [`SearchRequest`] and a
//! [`SearchMode`] into a query string in the common Lucene-style syntax
//! (`field:term~0.8^10`, `+(...)`, `AND`/`OR`). Providers parse that string
//! with their own query parser.
//!
//! # Clause shape
//!
//! For each term and property the full clause is
//!
//! ```text
//! field:term[~fuzzy][^boost] [field:term*^(boost*0.5) ]
//! ```
//!
//! - the boost suffix is omitted when the effective boost is exactly `1`
//! - a term containing `"` is already exact and never gets `~` or `*`
//! - wildcard properties get the extra prefix clause instead of a fuzzy suffix
//!
//! # Example
//!
//! ```rust
//! use pagesearch_fts::{QueryBuilder, SearchMode, SearchProperty, SearchRequest};
//!
//! let request = SearchRequest::new("guitar", "default")
//!     .with_properties(vec![SearchProperty::new("nodeName").with_boost(10.0)]);
//! let query = QueryBuilder::new(&request, "FullTextPath").build(SearchMode::MultiRelevance);
//! assert_eq!(
//!     query,
//!     "+(__IndexType:\"content\") AND ( (nodeName:guitar^10 ) )"
//! );
//! ```

use pagesearch_core::ROOT_NODE_ID;

use crate::property::SearchProperty;
use crate::terms::{escape, quoted_term, split_terms};
use crate::types::{SearchMode, SearchRequest};

pub use pagesearch_core::INDEX_TYPE_FIELD;

/// Boost factor of the exact-phrase branch relative to the word branch.
pub const PHRASE_BOOST: f64 = 2.0;

/// Builds query strings for one request.
#[derive(Debug, Clone)]
pub struct QueryBuilder<'a> {
    request: &'a SearchRequest,
    path_field: &'a str,
}

impl<'a> QueryBuilder<'a> {
    /// Create a builder for a request. `path_field` names the field holding
    /// each document's ancestor ids.
    pub fn new(request: &'a SearchRequest, path_field: &'a str) -> Self {
        Self {
            request,
            path_field,
        }
    }

    /// Build the complete query string for a mode, including the index-type
    /// and root-node restrictions.
    pub fn build(&self, mode: SearchMode) -> String {
        let inner = self.build_inner(mode);
        let query = self.wrap(&inner);
        log::debug!("Built {mode:?} query: {query}");
        query
    }

    /// Build the mode-specific part of the query without any restriction.
    pub fn build_inner(&self, mode: SearchMode) -> String {
        let raw = &self.request.search_term;
        match mode {
            SearchMode::MultiRelevance => {
                if is_single_branch(raw) {
                    self.or_all(&split_terms(raw), 1.0)
                } else {
                    format!(
                        "({} OR {})",
                        self.or_all(&quoted_term(raw), PHRASE_BOOST),
                        self.or_all(&split_terms(raw), 1.0)
                    )
                }
            }
            SearchMode::MultiAnd => {
                if is_single_branch(raw) {
                    self.and_all(&split_terms(raw), 1.0)
                } else {
                    format!(
                        "{} OR {}",
                        self.and_all(&quoted_term(raw), PHRASE_BOOST),
                        self.and_all(&split_terms(raw), 1.0)
                    )
                }
            }
            SearchMode::SimpleOr => self.all_properties(&split_terms(raw), 1.0, "OR", true),
            SearchMode::AsEntered => self.and_all(&quoted_term(raw), 1.0),
        }
    }

    /// Prefix a built query with the index-type and root-node restrictions.
    pub fn wrap(&self, inner: &str) -> String {
        let mut query = String::new();
        if let Some(index_types) = self.index_types_clause() {
            query.push_str(&index_types);
            query.push_str(" AND ");
        }
        match self.root_nodes_clause() {
            Some(root_nodes) => {
                query.push_str(&root_nodes);
                query.push_str(" AND (");
            }
            None => query.push('('),
        }
        query.push_str(inner);
        query.push(')');
        query
    }

    /// `+(__IndexType:"a" OR __IndexType:"b")`, or `None` without index types.
    pub fn index_types_clause(&self) -> Option<String> {
        let clauses: Vec<String> = self
            .request
            .index_types
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(|t| format!("{INDEX_TYPE_FIELD}:\"{}\"", escape(t)))
            .collect();
        if clauses.is_empty() {
            None
        } else {
            Some(format!("+({})", clauses.join(" OR ")))
        }
    }

    /// `+(Path:1050 OR Path:1060)`, or `None` when unrestricted.
    pub fn root_nodes_clause(&self) -> Option<String> {
        let roots = &self.request.root_nodes;
        if roots.is_empty() || roots.contains(&ROOT_NODE_ID) {
            return None;
        }
        let clauses: Vec<String> = roots
            .iter()
            .map(|id| format!("{}:{id}", self.path_field))
            .collect();
        Some(format!("+({})", clauses.join(" OR ")))
    }

    fn or_all(&self, terms: &[String], boost_all: f64) -> String {
        self.all_properties(terms, boost_all, "OR", false)
    }

    fn and_all(&self, terms: &[String], boost_all: f64) -> String {
        self.all_properties(terms, boost_all, "AND", false)
    }

    /// One parenthesized group per term, each group holding a clause per
    /// property, groups joined with `join`.
    fn all_properties(&self, terms: &[String], boost_all: f64, join: &str, simple: bool) -> String {
        let groups: Vec<String> = terms
            .iter()
            .map(|term| {
                self.request
                    .search_properties
                    .iter()
                    .map(|property| {
                        if simple {
                            simple_clause(term, property)
                        } else {
                            full_clause(term, property, boost_all)
                        }
                    })
                    .collect::<String>()
            })
            .filter(|group| !group.is_empty())
            .map(|group| format!(" ({group}) "))
            .collect();
        groups.join(&format!("{join} "))
    }
}

/// A term with no whitespace, or one that already carries quotes, has no
/// separate phrase branch.
fn is_single_branch(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.contains('"') || !trimmed.contains(char::is_whitespace)
}

/// `field:term[~fuzzy][^boost] [field:term*^(boost*0.5) ]`
pub(crate) fn full_clause(term: &str, property: &SearchProperty, boost_all: f64) -> String {
    let name = &property.name;
    let boost = property.boost_multiplier * boost_all;
    let boost_suffix = if boost == 1.0 {
        String::new()
    } else {
        format!("^{boost}")
    };

    let mut fuzzy_suffix = String::new();
    let mut wildcard_clause = String::new();
    if !term.contains('"') {
        if property.wildcard {
            wildcard_clause = format!("{name}:{term}*^{} ", boost * 0.5);
        } else if property.is_fuzzy() {
            fuzzy_suffix = format!("~{}", property.fuzzy_multiplier);
        }
    }

    format!("{name}:{term}{fuzzy_suffix}{boost_suffix} {wildcard_clause}")
}

/// `field:term[~fuzzy][*] ` with no boosting.
pub(crate) fn simple_clause(term: &str, property: &SearchProperty) -> String {
    let name = &property.name;
    let mut suffix = String::new();
    if !term.contains('"') {
        if property.wildcard {
            suffix.push('*');
        } else if property.is_fuzzy() {
            suffix = format!("~{}", property.fuzzy_multiplier);
        }
    }
    format!("{name}:{term}{suffix} ")
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn request(term: &str, properties: Vec<SearchProperty>) -> SearchRequest {
        SearchRequest::new(term, "default").with_properties(properties)
    }

    fn title_and_body() -> Vec<SearchProperty> {
        vec![
            SearchProperty::new("nodeName").with_boost(10.0),
            SearchProperty::new("FullTextSearch"),
        ]
    }

    #[test]
    fn test_full_clause_plain() {
        let prop = SearchProperty::new("body");
        assert_eq!(full_clause("cat", &prop, 1.0), "body:cat ");
    }

    #[test]
    fn test_full_clause_boost() {
        let prop = SearchProperty::new("title").with_boost(10.0);
        assert_eq!(full_clause("cat", &prop, 1.0), "title:cat^10 ");
        assert_eq!(full_clause("cat", &prop, 2.0), "title:cat^20 ");
        let half = SearchProperty::new("title").with_boost(0.5);
        assert_eq!(full_clause("cat", &half, 2.0), "title:cat ");
    }

    #[test]
    fn test_full_clause_fuzzy() {
        let prop = SearchProperty::new("body").with_fuzzy(0.8);
        assert_eq!(full_clause("cat", &prop, 1.0), "body:cat~0.8 ");
    }

    #[test]
    fn test_full_clause_wildcard() {
        let prop = SearchProperty::new("body")
            .with_fuzzy(0.8)
            .with_wildcard(true);
        assert_eq!(full_clause("cat", &prop, 1.0), "body:cat body:cat*^0.5 ");
        let boosted = prop.clone().with_boost(10.0);
        assert_eq!(full_clause("cat", &boosted, 1.0), "body:cat^10 body:cat*^5 ");
    }

    #[test]
    fn test_full_clause_quoted_term_is_exact() {
        let prop = SearchProperty::new("body")
            .with_fuzzy(0.8)
            .with_wildcard(true)
            .with_boost(3.0);
        assert_eq!(
            full_clause("\"big cat\"", &prop, 1.0),
            "body:\"big cat\"^3 "
        );
    }

    #[test]
    fn test_simple_clause() {
        let plain = SearchProperty::new("body").with_boost(10.0);
        assert_eq!(simple_clause("cat", &plain), "body:cat ");
        let fuzzy = SearchProperty::new("body").with_fuzzy(0.7);
        assert_eq!(simple_clause("cat", &fuzzy), "body:cat~0.7 ");
        let wild = SearchProperty::new("body").with_wildcard(true);
        assert_eq!(simple_clause("cat", &wild), "body:cat* ");
        assert_eq!(simple_clause("\"a b\"", &wild), "body:\"a b\" ");
    }

    #[test]
    fn test_multi_relevance_single_word() {
        let req = request("guitar", title_and_body());
        let inner = QueryBuilder::new(&req, "FullTextPath").build_inner(SearchMode::MultiRelevance);
        assert_eq!(inner, " (nodeName:guitar^10 FullTextSearch:guitar ) ");
    }

    #[test]
    fn test_multi_relevance_phrase_and_words() {
        let req = request("hello world", title_and_body());
        let inner = QueryBuilder::new(&req, "FullTextPath").build_inner(SearchMode::MultiRelevance);
        assert_eq!(
            inner,
            "( (nodeName:\"hello world\"^20 FullTextSearch:\"hello world\"^2 )  OR  \
             (nodeName:hello^10 FullTextSearch:hello ) OR  \
             (nodeName:world^10 FullTextSearch:world ) )"
        );
    }

    #[test]
    fn test_multi_relevance_quoted_input_has_no_phrase_branch() {
        let req = request("\"hello world\" tour", title_and_body());
        let inner = QueryBuilder::new(&req, "FullTextPath").build_inner(SearchMode::MultiRelevance);
        assert!(!inner.contains("^20"));
        assert!(inner.contains("nodeName:\"hello world\"^10"));
        assert!(inner.contains("FullTextSearch:tour"));
    }

    #[test]
    fn test_multi_and() {
        let req = request("red car", vec![SearchProperty::new("body")]);
        let inner = QueryBuilder::new(&req, "FullTextPath").build_inner(SearchMode::MultiAnd);
        assert_eq!(
            inner,
            " (body:\"red car\"^2 )  OR  (body:red ) AND  (body:car ) "
        );
    }

    #[test]
    fn test_simple_or() {
        let props = vec![
            SearchProperty::new("title").with_boost(10.0),
            SearchProperty::new("body").with_wildcard(true),
        ];
        let req = request("red car", props);
        let inner = QueryBuilder::new(&req, "FullTextPath").build_inner(SearchMode::SimpleOr);
        assert_eq!(
            inner,
            " (title:red body:red* ) OR  (title:car body:car* ) "
        );
    }

    #[test]
    fn test_as_entered() {
        let req = request("red car", title_and_body());
        let inner = QueryBuilder::new(&req, "FullTextPath").build_inner(SearchMode::AsEntered);
        assert_eq!(
            inner,
            " (nodeName:\"red car\"^10 FullTextSearch:\"red car\" ) "
        );
    }

    #[test]
    fn test_wrap_with_roots_and_types() {
        let req = request("x", vec![SearchProperty::new("body")])
            .with_root_nodes(vec![1050, 1060])
            .with_index_types(vec!["content".to_string(), "media item".to_string()]);
        let query = QueryBuilder::new(&req, "FullTextPath").wrap("INNER");
        assert_eq!(
            query,
            "+(__IndexType:\"content\" OR __IndexType:\"media item\") AND \
             +(FullTextPath:1050 OR FullTextPath:1060) AND (INNER)"
        );
    }

    #[test]
    fn test_wrap_without_types() {
        let req = request("x", vec![]).with_index_types(vec![]);
        assert_eq!(QueryBuilder::new(&req, "P").wrap("q"), "(q)");
    }

    #[test]
    fn test_root_sentinel_disables_restriction() {
        let req = request("x", vec![]).with_root_nodes(vec![1050, -1]);
        assert!(QueryBuilder::new(&req, "P").root_nodes_clause().is_none());
    }

    #[test]
    fn test_escaped_input_in_query() {
        let req = request("a:b", vec![SearchProperty::new("body")]);
        let inner = QueryBuilder::new(&req, "P").build_inner(SearchMode::MultiRelevance);
        assert_eq!(inner, " (body:a\\:b ) ");
    }

    #[test]
    fn test_no_properties_gives_empty_inner() {
        let req = request("hello", vec![]);
        let inner = QueryBuilder::new(&req, "P").build_inner(SearchMode::SimpleOr);
        assert_eq!(inner, "");
    }

    proptest! {
        #[test]
        fn prop_single_token_has_no_phrase_branch(term in "[a-z0-9]{1,12}") {
            let req = request(&term, title_and_body());
            let builder = QueryBuilder::new(&req, "P");
            for mode in [SearchMode::MultiRelevance, SearchMode::MultiAnd] {
                let inner = builder.build_inner(mode);
                prop_assert!(!inner.contains('"'));
                prop_assert!(!inner.contains("^20"));
            }
        }

        #[test]
        fn prop_root_sentinel_never_restricts(
            roots in proptest::collection::vec(1i32..100_000, 0..5),
            insert_root in any::<bool>(),
        ) {
            let mut roots = roots;
            if insert_root || roots.is_empty() {
                roots.push(-1);
                let req = request("x", vec![]).with_root_nodes(roots);
                let query = QueryBuilder::new(&req, "FullTextPath").build(SearchMode::MultiRelevance);
                prop_assert!(!query.contains("FullTextPath"));
            }
        }

        #[test]
        fn prop_boost_suffix(boost in 0.1f64..50.0) {
            let prop = SearchProperty::new("f").with_boost(boost);
            let clause = full_clause("t", &prop, 1.0);
            if boost == 1.0 {
                prop_assert!(!clause.contains('^'));
            } else {
                let expected = format!("^{boost}");
                prop_assert!(clause.contains(&expected));
            }
        }

        #[test]
        fn prop_quoted_term_never_fuzzy_or_wild(
            word in "[a-z]{1,8}",
            fuzzy in 0.01f64..1.0,
            wildcard in any::<bool>(),
        ) {
            let prop = SearchProperty::new("f").with_fuzzy(fuzzy).with_wildcard(wildcard);
            let term = format!("\"{word}\"");
            let full = full_clause(&term, &prop, 1.0);
            let simple = simple_clause(&term, &prop);
            for clause in [full, simple] {
                prop_assert!(!clause.contains('~'));
                prop_assert!(!clause.contains('*'));
            }
        }
    }
}
