//! Search provider trait and registry.
//!
//! This module defines the `SearchProvider` trait that every index
//! implementation satisfies, the result types it returns, and the registry
//! that resolves a provider from the key named in a request.
//!
//! # Providers
//!
//! - `TantivySearch`: Full-text search with Tantivy (requires `fts-tantivy` feature)
//! - `SimpleSearch`: In-memory linear scan, for tests and small sites
//!
//! # Example
//!
//! ```rust,ignore
//! use pagesearch_fts::{ProviderRegistry, SearchWindow, SimpleSearch};
//!
//! let mut registry = ProviderRegistry::new();
//! registry.register("default", Arc::new(SimpleSearch::new("default")));
//!
//! let provider = registry.get("default")?;
//! let results = provider.search("(body:guitar)", SearchWindow::all()).await?;
//! println!("Found {} results", results.total);
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use pagesearch_core::{Error, Result, SearchConfig};
use serde::{Deserialize, Serialize};

use crate::highlight::{HighlightOptions, Highlighter, TermHighlighter};
use crate::simple::SimpleSearch;
use crate::types::SearchWindow;

/// A single scored hit with its stored fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Document identifier (the node id).
    pub id: String,

    /// Provider-assigned relevance.
    pub score: f32,

    /// Stored field values.
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

/// Hits for one query, possibly a window of a larger result set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    /// Total number of matching documents.
    pub total: usize,

    /// Position of `hits[0]` in the full result set.
    pub offset: usize,

    /// Hits ordered by relevance, highest first.
    pub hits: Vec<SearchHit>,

    /// Provider that executed the search.
    pub provider: String,
}

impl ResultSet {
    /// Create an empty result set.
    pub fn empty(provider: &str) -> Self {
        Self {
            total: 0,
            offset: 0,
            hits: Vec::new(),
            provider: provider.to_string(),
        }
    }

    /// Hits that fall inside `window`, given the hits this set holds.
    ///
    /// Works whether the provider already applied the window or returned
    /// every hit from the start.
    pub fn window(&self, window: SearchWindow) -> &[SearchHit] {
        let start = window.offset.saturating_sub(self.offset).min(self.hits.len());
        let end = match window.limit {
            Some(limit) => start.saturating_add(limit).min(self.hits.len()),
            None => self.hits.len(),
        };
        &self.hits[start..end]
    }
}

/// Abstract search provider.
///
/// Implementations execute query strings produced by
/// [`QueryBuilder`](crate::QueryBuilder) and return scored hits with their
/// stored fields.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Execute a query string and return the hits inside `window`.
    ///
    /// Returns hits ordered by relevance (highest first); `total` counts every
    /// match regardless of the window.
    async fn search(&self, query: &str, window: SearchWindow) -> Result<ResultSet>;

    /// Provider name for diagnostics.
    fn name(&self) -> &str;

    /// Build a highlighter for one stored field.
    ///
    /// `query` is a field-less query string in the same syntax as search
    /// queries. The default uses [`TermHighlighter`].
    fn highlighter(
        &self,
        field: &str,
        query: &str,
        options: &HighlightOptions,
    ) -> Result<Box<dyn Highlighter>> {
        log::trace!("Default highlighter for field {field}");
        Ok(Box::new(TermHighlighter::from_query(query, options.clone())))
    }

    /// Check if the provider is ready to handle queries.
    fn is_ready(&self) -> bool {
        true
    }
}

/// Providers keyed by the name used in configuration.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn SearchProvider>>,
}

impl ProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider, replacing any previous one with the same key.
    pub fn register(&mut self, key: impl Into<String>, provider: Arc<dyn SearchProvider>) {
        self.providers.insert(key.into(), provider);
    }

    /// Resolve a provider by key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProviderNotFound`] for an unknown key.
    pub fn get(&self, key: &str) -> Result<Arc<dyn SearchProvider>> {
        self.providers
            .get(key)
            .cloned()
            .ok_or_else(|| Error::provider_not_found(key))
    }

    /// Returns whether a key is registered.
    pub fn contains(&self, key: &str) -> bool {
        self.providers.contains_key(key)
    }

    /// Registered keys, sorted.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.providers.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

/// Create the search provider for a configuration.
///
/// Selection logic:
/// 1. If `fts-tantivy` feature enabled and an index exists at `index_path` → `TantivySearch`
/// 2. Otherwise → an empty `SimpleSearch`
///
/// The provider is named after `config.search_provider`.
pub fn create_search_provider(
    config: &SearchConfig,
    index_path: Option<&Path>,
) -> Result<Arc<dyn SearchProvider>> {
    let name = config.search_provider.as_str();

    #[cfg(feature = "fts-tantivy")]
    if let Some(path) = index_path {
        if crate::tantivy_search::TantivySearch::index_exists(path) {
            let schema = crate::schema::PageSchema::from_config(config);
            match crate::tantivy_search::TantivySearch::open(path, &schema, name) {
                Ok(provider) => return Ok(Arc::new(provider)),
                Err(e) => {
                    log::warn!("Failed to open Tantivy index: {e}, falling back to simple search");
                }
            }
        }
    }

    #[cfg(not(feature = "fts-tantivy"))]
    if let Some(path) = index_path {
        log::debug!(
            "Ignoring index path {} without the fts-tantivy feature",
            path.display()
        );
    }

    Ok(Arc::new(SimpleSearch::new(name)))
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.keys())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
