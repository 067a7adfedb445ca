//! Handlers for the `index` and `cache` commands.
//!
//! Both work from a JSON site export (see [`crate::site`]). Rendering uses
//! the configured default renderer; `--cache-only` skips rendering and
//! indexes whatever HTML an earlier `cache render` stored.

use std::path::Path;
use std::sync::Arc;

use pagesearch_core::{Error, Result, SearchConfig};
use pagesearch_fts::{PageSchema, SimpleSearch, TantivyIndex};
use pagesearch_index::{
    CachedRenderer, ContentTree, HtmlCache, IndexReport, IndexingPipeline, Manager,
    MemoryHtmlCache, RedbHtmlCache, RenderReport, RendererRegistry,
};

use crate::cli::{CacheAction, IndexAction, SiteSource};
use crate::site::load_site;

/// Handle an index subcommand.
pub async fn handle_index_command(config: SearchConfig, action: IndexAction) -> Result<IndexReport> {
    match action {
        IndexAction::Rebuild { source } => {
            let target = IndexTarget::open(config, &source)?;
            if source.cache_only {
                target.pipeline().rebuild().await
            } else {
                target.manager()?.admin().rebuild_index().await
            }
        }
        IndexAction::Reindex {
            source,
            descendants,
            ids,
        } => {
            let target = IndexTarget::open(config, &source)?;
            match (source.cache_only, descendants) {
                (true, false) => target.pipeline().reindex_nodes(&ids).await,
                (true, true) => target.pipeline().reindex_subtrees(&ids).await,
                (false, false) => target.manager()?.admin().reindex_nodes(&ids).await,
                (false, true) => {
                    target
                        .manager()?
                        .admin()
                        .reindex_nodes_and_descendants(&ids)
                        .await
                }
            }
        }
    }
}

/// Everything an index command writes to or reads from.
struct IndexTarget {
    config: SearchConfig,
    tree: Arc<dyn ContentTree>,
    index: Arc<TantivyIndex>,
    cache: Arc<dyn HtmlCache>,
}

impl IndexTarget {
    fn open(config: SearchConfig, source: &SiteSource) -> Result<Self> {
        let tree = Arc::new(load_site(Path::new(&source.site))?);
        let schema = PageSchema::from_config(&config);
        let index = TantivyIndex::open(Path::new(&source.index), &schema, &config.index_provider)?;
        let cache: Arc<dyn HtmlCache> = match &source.cache {
            Some(path) => Arc::new(RedbHtmlCache::open(path)?),
            None => Arc::new(MemoryHtmlCache::new()),
        };
        Ok(Self {
            config,
            tree,
            index: Arc::new(index),
            cache,
        })
    }

    /// A pipeline whose only HTML source is the cache.
    fn pipeline(self) -> IndexingPipeline {
        let sources = RendererRegistry::new(Arc::new(CachedRenderer::new(self.cache)));
        IndexingPipeline::new(Arc::new(self.config), self.tree, self.index, sources)
    }

    fn manager(self) -> Result<Manager> {
        Manager::builder(self.config)
            .tree(self.tree)
            .index(self.index)
            .cache(self.cache)
            .build()
    }
}

/// What a cache command produced.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheOutcome {
    /// Counts from a render run.
    Rendered(RenderReport),
    /// Stored HTML, if any.
    Html(Option<String>),
    /// Number of cached pages.
    Count(u64),
}

/// Handle a cache subcommand.
pub async fn handle_cache_command(config: SearchConfig, action: CacheAction) -> Result<CacheOutcome> {
    match action {
        CacheAction::Render { site, cache, node } => {
            let tree = Arc::new(load_site(Path::new(&site))?);
            // Render runs never touch the index.
            let index = Arc::new(SimpleSearch::new(config.index_provider.clone()));
            let manager = Manager::builder(config)
                .tree(tree)
                .index(index)
                .cache(Arc::new(RedbHtmlCache::open(&cache)?))
                .build()?;
            let report = match node {
                Some(id) => manager.admin().render_subtree_to_cache(id).await?,
                None => manager.admin().render_all_to_cache().await?,
            };
            Ok(CacheOutcome::Rendered(report))
        }
        CacheAction::Get { cache, id } => {
            let cache = open_existing_cache(&cache)?;
            Ok(CacheOutcome::Html(cache.get(id).await?))
        }
        CacheAction::Count { cache } => Ok(CacheOutcome::Count(open_existing_cache(&cache)?.len()?)),
    }
}

fn open_existing_cache(path: &str) -> Result<RedbHtmlCache> {
    if !Path::new(path).exists() {
        return Err(Error::config(format!("No cache file at {path}")));
    }
    RedbHtmlCache::open(path)
}

/// One-line summary of an index run.
pub fn describe_index_report(report: &IndexReport) -> String {
    format!(
        "Indexed {} pages ({} skipped, {} failed)",
        report.indexed, report.skipped, report.failed
    )
}

// ============================================================================
// Tests
// ============================================================================
