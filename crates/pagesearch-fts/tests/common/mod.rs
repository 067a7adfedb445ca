//! Shared fixtures: a small site indexed into `SimpleSearch`.

use std::sync::Arc;

use pagesearch_core::{DocumentIndex, FieldMap, SearchConfig};
use pagesearch_fts::{FullTextSearch, ProviderRegistry, SearchMode, SearchParams, SimpleSearch};

/// Pages as (id, name, body, path).
pub const PAGES: &[(&str, &str, &str, &str)] = &[
    (
        "1",
        "Electric Guitars",
        "We sell electric guitars and basses",
        "1050",
    ),
    (
        "2",
        "Acoustic Guitars",
        "Acoustic guitars for beginners. Not electric.",
        "1050",
    ),
    ("3", "Pianos", "Grand pianos, upright pianos", "1060"),
    (
        "4",
        "Guitar Lessons",
        "Lessons for guitars of every kind, electric or acoustic",
        "1060,1070",
    ),
];

/// Field map for one page, as the indexing pipeline would emit it.
pub fn page(id: &str, name: &str, body: &str, path: &str) -> FieldMap {
    [
        ("id", id),
        ("__IndexType", "content"),
        ("nodeName", name),
        ("nodeTypeAlias", "textPage"),
        ("FullTextSearch", body),
        ("FullTextPath", path),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// A provider holding every page in [`PAGES`].
pub async fn site() -> Arc<SimpleSearch> {
    let provider = Arc::new(SimpleSearch::new("default"));
    for (id, name, body, path) in PAGES {
        provider
            .add_or_replace(page(id, name, body, path))
            .await
            .unwrap();
    }
    provider
}

/// Façade over [`site`] with default configuration.
pub async fn facade() -> FullTextSearch {
    facade_with(SearchConfig::default()).await
}

/// Façade over [`site`] with the given configuration.
pub async fn facade_with(config: SearchConfig) -> FullTextSearch {
    let mut providers = ProviderRegistry::new();
    providers.register(config.search_provider.clone(), site().await);
    FullTextSearch::new(Arc::new(config), providers)
}

/// Parameters searching title `nodeName` and body `FullTextSearch` exactly.
pub fn params(mode: SearchMode, term: &str) -> SearchParams {
    SearchParams {
        title_properties: "nodeName".to_string(),
        body_properties: "FullTextSearch".to_string(),
        ..SearchParams::new(mode, term)
    }
}

/// Ids of the records on the returned page.
pub fn ids(output: &pagesearch_fts::SearchOutput) -> Vec<&str> {
    output.nodes().iter().map(|n| n.id.as_str()).collect()
}
