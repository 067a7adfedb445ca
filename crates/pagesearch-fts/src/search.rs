//! Search façade used by templates and endpoints.
//!
//! [`FullTextSearch`] takes the loosely typed arguments a template passes
//! (comma-separated property lists, a fuzziness string, a root-node list),
//! builds the query and summary requests, runs the query on the configured
//! provider and formats one page of results as a [`SearchOutput`].

use std::sync::Arc;
use std::time::Instant;

use pagesearch_core::{NODE_NAME_FIELD, NodeId, Result, SearchConfig};
use serde::{Deserialize, Serialize};

use crate::backend::{ProviderRegistry, ResultSet};
use crate::format::{Paging, ResultFormatter, ResultObserver, SearchOutput};
use crate::property::SearchProperty;
use crate::query::QueryBuilder;
use crate::summary::{HighlightSummarizer, PlainSummarizer, Summarizer};
use crate::types::{SearchMode, SearchRequest, SearchWindow, SummaryRequest};

/// Fuzziness used by the short-form search variants.
pub const SHORT_FORM_FUZZINESS: &str = "0.8";

/// Arguments of one search call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    /// Ranking strategy.
    pub mode: SearchMode,
    /// Raw user input.
    pub search_term: String,
    /// Comma-separated properties searched as the page title.
    pub title_properties: String,
    /// Comma-separated properties searched as the page body.
    pub body_properties: String,
    /// Comma-separated node ids; blank or `-1` searches everything.
    pub root_nodes: String,
    /// Comma-separated properties used to form the title.
    pub title_link_properties: String,
    /// Comma-separated properties used to form the summary.
    pub summary_properties: String,
    /// Highlight matches in titles and summaries.
    pub use_highlighting: bool,
    /// Summary length in characters; 0 uses the configured default.
    pub summary_length: usize,
    /// 1-based page number.
    pub page_number: usize,
    /// Results per page; 0 returns everything.
    pub page_length: usize,
    /// Fuzziness between 0 and 1 as text; blank or invalid means exact.
    pub fuzziness: String,
    /// Append a prefix-match clause to every term.
    pub wildcard: bool,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            mode: SearchMode::default(),
            search_term: String::new(),
            title_properties: String::new(),
            body_properties: String::new(),
            root_nodes: String::new(),
            title_link_properties: String::new(),
            summary_properties: String::new(),
            use_highlighting: false,
            summary_length: 0,
            page_number: 0,
            page_length: 0,
            fuzziness: "1.0".to_string(),
            wildcard: false,
        }
    }
}

impl SearchParams {
    /// Parameters for a term with every other argument defaulted.
    pub fn new(mode: SearchMode, search_term: impl Into<String>) -> Self {
        Self {
            mode,
            search_term: search_term.into(),
            ..Default::default()
        }
    }

    /// The short form: title `nodeName`, body and summary from the full-text
    /// field, highlighting on, fuzziness 0.8.
    pub fn short_form(
        mode: SearchMode,
        search_term: impl Into<String>,
        root_nodes: impl Into<String>,
        page_number: usize,
        page_length: usize,
        full_text_field: &str,
    ) -> Self {
        Self {
            mode,
            search_term: search_term.into(),
            title_properties: NODE_NAME_FIELD.to_string(),
            body_properties: full_text_field.to_string(),
            root_nodes: root_nodes.into(),
            title_link_properties: NODE_NAME_FIELD.to_string(),
            summary_properties: full_text_field.to_string(),
            use_highlighting: true,
            summary_length: 0,
            page_number,
            page_length,
            fuzziness: SHORT_FORM_FUZZINESS.to_string(),
            wildcard: false,
        }
    }

    /// Requested page.
    pub fn paging(&self) -> Paging {
        Paging::new(self.page_number, self.page_length)
    }
}

/// Parse a comma-separated node id list, ignoring items that are not ids.
pub fn parse_root_nodes(list: &str) -> Vec<NodeId> {
    list.split(',')
        .filter_map(|item| item.trim().parse::<NodeId>().ok())
        .collect()
}

/// Parse a fuzziness string; blank or invalid input means exact matching.
pub fn parse_fuzziness(value: &str) -> f64 {
    value.trim().parse::<f64>().unwrap_or(1.0)
}

/// Entry point for searches.
pub struct FullTextSearch {
    config: Arc<SearchConfig>,
    providers: ProviderRegistry,
    formatter: ResultFormatter,
}

impl FullTextSearch {
    /// Create a façade over the given providers.
    pub fn new(config: Arc<SearchConfig>, providers: ProviderRegistry) -> Self {
        let formatter = ResultFormatter::new(config.return_all_fields);
        Self {
            config,
            providers,
            formatter,
        }
    }

    /// Install a hook that sees every record before it is emitted.
    pub fn with_observer(mut self, observer: Arc<dyn ResultObserver>) -> Self {
        self.formatter = self.formatter.with_observer(observer);
        self
    }

    /// Configuration in use.
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Registered providers.
    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    /// Build the query and summary requests for a call.
    pub fn build_requests(&self, params: &SearchParams) -> (SearchRequest, SummaryRequest) {
        let config = &self.config;
        let fuzzy = parse_fuzziness(&params.fuzziness);
        let wildcard = params.wildcard;
        let title_boost = config.search_title_boost;

        let mut properties =
            SearchProperty::parse_list(&params.title_properties, title_boost, fuzzy, wildcard);
        properties.extend(SearchProperty::parse_list(
            &params.body_properties,
            1.0,
            fuzzy,
            wildcard,
        ));
        if properties.is_empty() {
            properties.push(full_text_property(config, fuzzy, wildcard));
        }

        let request = SearchRequest::new(&params.search_term, &config.search_provider)
            .with_properties(properties)
            .with_root_nodes(parse_root_nodes(&params.root_nodes));

        let mut title_link_properties = SearchProperty::parse_list(
            &params.title_link_properties,
            title_boost,
            fuzzy,
            wildcard,
        );
        if title_link_properties.is_empty() {
            title_link_properties.push(
                SearchProperty::new(NODE_NAME_FIELD)
                    .with_boost(title_boost)
                    .with_fuzzy(fuzzy)
                    .with_wildcard(wildcard),
            );
        }
        let mut body_summary_properties =
            SearchProperty::parse_list(&params.summary_properties, 1.0, fuzzy, wildcard);
        if body_summary_properties.is_empty() {
            body_summary_properties.push(full_text_property(config, fuzzy, wildcard));
        }

        let summary = SummaryRequest {
            search_term: params.search_term.clone(),
            title_link_properties,
            body_summary_properties,
            highlight_pre_tag: config.highlight_pre_tag.clone(),
            highlight_post_tag: config.highlight_post_tag.clone(),
            summary_length: config.effective_summary_length(params.summary_length),
            search_provider: config.search_provider.clone(),
        };

        (request, summary)
    }

    /// The complete query string a call would execute.
    pub fn build_query(&self, params: &SearchParams) -> String {
        let (request, _) = self.build_requests(params);
        QueryBuilder::new(&request, &self.config.path_field).build(params.mode)
    }

    /// Run a query string on the provider a request names.
    ///
    /// # Errors
    ///
    /// Returns [`pagesearch_core::Error::ProviderNotFound`] when the provider
    /// key is not registered, or the provider's own error.
    pub async fn execute(
        &self,
        query: &str,
        request: &SearchRequest,
        window: SearchWindow,
    ) -> Result<ResultSet> {
        let provider = self.providers.get(&request.search_provider)?;
        provider.search(query, window).await
    }

    /// Search and format one page of results.
    ///
    /// An empty term, zero results and an out-of-range page come back as
    /// typed error documents, not as `Err`.
    pub async fn search(&self, params: &SearchParams) -> Result<SearchOutput> {
        let started = Instant::now();
        if params.search_term.trim().is_empty() {
            return Ok(SearchOutput::no_terms());
        }

        let (request, summary_request) = self.build_requests(params);
        let provider = self.providers.get(&request.search_provider)?;
        let query = QueryBuilder::new(&request, &self.config.path_field).build(params.mode);
        let paging = params.paging();
        let results = provider.search(&query, paging.window()).await?;

        log::debug!(
            "Search '{}' ({:?}) on '{}': {} results",
            params.search_term,
            params.mode,
            provider.name(),
            results.total
        );

        let plain = PlainSummarizer::new(summary_request)
            .with_placeholders(&self.config.no_title, &self.config.no_summary);
        let mut summarizer: Box<dyn Summarizer> = if params.use_highlighting {
            Box::new(HighlightSummarizer::new(plain, provider))
        } else {
            Box::new(plain)
        };

        Ok(self
            .formatter
            .format(&results, summarizer.as_mut(), paging, started))
    }

    /// Short-form MultiRelevance search.
    pub async fn search_multi_relevance(
        &self,
        search_term: &str,
        root_nodes: &str,
        page_number: usize,
        page_length: usize,
    ) -> Result<SearchOutput> {
        self.short_form(
            SearchMode::MultiRelevance,
            search_term,
            root_nodes,
            page_number,
            page_length,
        )
        .await
    }

    /// Short-form MultiAnd search.
    pub async fn search_multi_and(
        &self,
        search_term: &str,
        root_nodes: &str,
        page_number: usize,
        page_length: usize,
    ) -> Result<SearchOutput> {
        self.short_form(
            SearchMode::MultiAnd,
            search_term,
            root_nodes,
            page_number,
            page_length,
        )
        .await
    }

    /// Short-form SimpleOr search.
    pub async fn search_simple_or(
        &self,
        search_term: &str,
        root_nodes: &str,
        page_number: usize,
        page_length: usize,
    ) -> Result<SearchOutput> {
        self.short_form(
            SearchMode::SimpleOr,
            search_term,
            root_nodes,
            page_number,
            page_length,
        )
        .await
    }

    /// Short-form AsEntered search.
    pub async fn search_as_entered(
        &self,
        search_term: &str,
        root_nodes: &str,
        page_number: usize,
        page_length: usize,
    ) -> Result<SearchOutput> {
        self.short_form(
            SearchMode::AsEntered,
            search_term,
            root_nodes,
            page_number,
            page_length,
        )
        .await
    }

    async fn short_form(
        &self,
        mode: SearchMode,
        search_term: &str,
        root_nodes: &str,
        page_number: usize,
        page_length: usize,
    ) -> Result<SearchOutput> {
        let params = SearchParams::short_form(
            mode,
            search_term,
            root_nodes,
            page_number,
            page_length,
            &self.config.full_text_field,
        );
        self.search(&params).await
    }
}

fn full_text_property(config: &SearchConfig, fuzzy: f64, wildcard: bool) -> SearchProperty {
    SearchProperty::new(&config.full_text_field)
        .with_fuzzy(fuzzy)
        .with_wildcard(wildcard)
}

impl std::fmt::Debug for FullTextSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FullTextSearch")
            .field("search_provider", &self.config.search_provider)
            .field("providers", &self.providers)
            .field("formatter", &self.formatter)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
