//! Handlers for the `query` and `search` commands.

use std::path::Path;
use std::sync::Arc;

use pagesearch_core::{Error, Result, SearchConfig};
use pagesearch_fts::{
    FullTextSearch, ProviderRegistry, SearchParams, TantivySearch, create_search_provider,
};

use crate::cli::{OutputFormat, QueryShape};

/// Build search parameters the way a site search box would.
pub fn search_params(
    config: &SearchConfig,
    term: &str,
    shape: &QueryShape,
    page_number: usize,
    page_length: usize,
) -> SearchParams {
    let mut params = SearchParams::short_form(
        shape.mode.into(),
        term,
        shape.roots.as_str(),
        page_number,
        page_length,
        &config.full_text_field,
    );
    params.fuzziness = shape.fuzziness.clone();
    params.wildcard = shape.wildcard;
    params
}

/// Render the query a search would execute.
pub fn cmd_query(config: SearchConfig, term: &str, shape: &QueryShape) -> Result<String> {
    if term.trim().is_empty() {
        return Err(Error::operation("No search terms given"));
    }
    let params = search_params(&config, term, shape, 1, 0);
    let search = FullTextSearch::new(Arc::new(config), ProviderRegistry::new());
    Ok(search.build_query(&params))
}

/// Run a search against an index directory and format the output document.
pub async fn cmd_search(
    config: SearchConfig,
    index_path: &Path,
    term: &str,
    shape: &QueryShape,
    page_number: usize,
    page_length: usize,
    format: OutputFormat,
) -> Result<String> {
    if !TantivySearch::index_exists(index_path) {
        return Err(Error::config(format!(
            "No index at {}; run `{} index rebuild` first",
            index_path.display(),
            SearchConfig::project_name()
        )));
    }

    let provider = create_search_provider(&config, Some(index_path))?;
    let mut providers = ProviderRegistry::new();
    providers.register(config.search_provider.clone(), provider);

    let params = search_params(&config, term, shape, page_number, page_length);
    let search = FullTextSearch::new(Arc::new(config), providers);
    let output = search.search(&params).await?;
    if let Some(kind) = output.error_kind() {
        log::info!("Search for '{term}' returned {}", kind.as_str());
    }

    match format {
        OutputFormat::Xml => Ok(output.to_xml()),
        OutputFormat::Json => output.to_json(),
    }
}

// ============================================================================
// Tests
// ============================================================================
