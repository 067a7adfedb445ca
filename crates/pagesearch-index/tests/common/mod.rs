//! Shared fixtures: a small site, a template engine and a wired manager.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use pagesearch_core::{RendererKind, Result, SearchConfig};
use pagesearch_fts::{FullTextSearch, ProviderRegistry, SearchOutput, SimpleSearch};
use pagesearch_index::{
    ContentNode, HtmlCache, Manager, MemoryContentTree, MemoryHtmlCache, TemplateEngine,
};

/// Renders a page from its `bodyText` property, with a navigation block
/// that extraction must drop.
pub struct SiteEngine;

#[async_trait]
impl TemplateEngine for SiteEngine {
    async fn render_template(
        &self,
        node: &ContentNode,
        _template_id: i32,
        _params: &BTreeMap<String, String>,
    ) -> Result<String> {
        Ok(format!(
            "<html><head><title>{name}</title></head><body>\
             <div id=\"nav\">Menu guitars secret</div>\
             <h1>{name}</h1> <p>{body}</p></body></html>",
            name = node.name,
            body = node.property("bodyText").unwrap_or_default()
        ))
    }
}

fn page(id: i32, name: &str, body: &str) -> ContentNode {
    ContentNode::new(id, name, "Page")
        .with_template(1)
        .with_property("bodyText", body)
}

/// Home (1050) with Guitars, Pianos and a hidden Secret section holding
/// one page, plus a second root (1060).
pub fn site_nodes() -> Vec<ContentNode> {
    let home = ContentNode::new(1050, "Home", "Home")
        .with_template(1)
        .with_property("bodyText", "Welcome to the music shop");
    let guitars = page(1051, "Guitars", "Electric guitars and acoustic guitars").with_parent(&home);
    let pianos = page(1052, "Pianos", "Grand pianos").with_parent(&home);
    let secret = page(1053, "Secret", "secret guitars")
        .with_property("hideFromSearch", "1")
        .with_parent(&home);
    let under = page(1054, "Under", "secret guitars under").with_parent(&secret);
    let other = ContentNode::new(1060, "Strings", "Home")
        .with_template(1)
        .with_property("bodyText", "Guitar strings");
    vec![home, guitars, pianos, secret, under, other]
}

/// Programmatic rendering, navigation stripped, `hideFromSearch` honoured.
pub fn config(publish_event_rendering: bool) -> SearchConfig {
    SearchConfig {
        publish_event_rendering,
        default_renderer: RendererKind::Programmatic,
        ids_to_remove: vec!["nav".to_string()],
        disable_search_property_names: vec!["hideFromSearch".to_string()],
        ..SearchConfig::default()
    }
}

/// A manager wired to the site, with the index it writes to.
pub struct Site {
    pub manager: Manager,
    pub tree: Arc<MemoryContentTree>,
    pub index: Arc<SimpleSearch>,
}

impl Site {
    /// Build over the given cache.
    pub fn with_cache(config: SearchConfig, cache: Arc<dyn HtmlCache>) -> Self {
        let tree = Arc::new(MemoryContentTree::from_nodes(site_nodes()));
        let index = Arc::new(SimpleSearch::new("default"));
        let manager = Manager::builder(config)
            .tree(tree.clone())
            .index(index.clone())
            .cache(cache)
            .template_engine(Arc::new(SiteEngine))
            .build()
            .unwrap();
        Self {
            manager,
            tree,
            index,
        }
    }

    /// Build over an in-memory cache.
    pub fn new(config: SearchConfig) -> Self {
        Self::with_cache(config, Arc::new(MemoryHtmlCache::new()))
    }

    /// Search façade over the index.
    pub fn search(&self) -> FullTextSearch {
        let mut providers = ProviderRegistry::new();
        providers.register("default", self.index.clone());
        FullTextSearch::new(self.manager.config().clone(), providers)
    }
}

/// Sorted ids of the records on the returned page.
pub fn ids(output: &SearchOutput) -> Vec<String> {
    let mut ids: Vec<String> = output.nodes().iter().map(|n| n.id.clone()).collect();
    ids.sort_unstable();
    ids
}
