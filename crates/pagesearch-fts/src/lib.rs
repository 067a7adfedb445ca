//! Query building, summarizing and result formatting for Pagesearch.
//!
//! This crate turns what a visitor typed into a search box into a ranked,
//! paged and highlighted result document. Query execution is delegated to a
//! [`SearchProvider`]; a Tantivy provider ships behind a feature flag.
//!
//! # Features
//!
//! - `fts-tantivy`: Enable the Tantivy-based provider and index writer
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      pagesearch-fts                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  FullTextSearch (façade: comma lists → requests → output)   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  QueryBuilder (MultiRelevance, MultiAnd, SimpleOr,          │
//! │                AsEntered; index-type and root restriction)  │
//! │  Summarizer   (PlainSummarizer, HighlightSummarizer)        │
//! │  ResultFormatter (paging, hook, XML / JSON output)          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  SearchProvider trait + ProviderRegistry                    │
//! │  ├── SimpleSearch (in-memory linear scan)                   │
//! │  └── TantivySearch (full-text with Tantivy)                 │
//! │  TantivyIndex (DocumentIndex over an IndexWriter)           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use pagesearch_fts::{FullTextSearch, ProviderRegistry, SearchMode, SearchParams};
//!
//! let search = FullTextSearch::new(config, providers);
//! let output = search.search_multi_relevance("electric guitars", "1050", 1, 10).await?;
//! println!("{}", output.to_xml());
//! ```

// Core modules (always available)
pub mod backend;
pub mod format;
pub mod highlight;
pub mod property;
pub mod query;
pub mod search;
pub mod simple;
pub mod summary;
mod syntax;
pub mod terms;
pub mod types;

// Feature-gated Tantivy modules
#[cfg(feature = "fts-tantivy")]
pub mod schema;

#[cfg(feature = "fts-tantivy")]
pub mod indexer;

#[cfg(feature = "fts-tantivy")]
pub mod tantivy_search;

// Re-exports
pub use backend::{
    ProviderRegistry, ResultSet, SearchHit, SearchProvider, create_search_provider,
};
pub use format::{
    Paging, ResultFormatter, ResultObserver, ResultOutput, ResultSummary, SearchErrorKind,
    SearchOutput, SearchResultRecord,
};
pub use highlight::{HighlightOptions, Highlighter, TermHighlighter};
pub use property::SearchProperty;
pub use query::QueryBuilder;
pub use search::{FullTextSearch, SearchParams, parse_fuzziness, parse_root_nodes};
pub use simple::SimpleSearch;
pub use summary::{HighlightSummarizer, PlainSummarizer, Summarizer, truncate_at_word};
pub use types::{SearchMode, SearchRequest, SearchWindow, SummaryRequest};

#[cfg(feature = "fts-tantivy")]
pub use schema::{PROPERTIES_FIELD, PageSchema};

#[cfg(feature = "fts-tantivy")]
pub use indexer::TantivyIndex;

#[cfg(feature = "fts-tantivy")]
pub use tantivy_search::{TantivyHighlighter, TantivySearch};
