//! Wiring the indexing side together from configuration.
//!
//! The [`Manager`] picks the default renderer (`default_renderer`), the
//! pipeline's content source (the HTML cache when `publish_event_rendering`
//! is on, the renderers otherwise) and the target index
//! (`index_provider`), then exposes the pipeline, publish handlers and
//! admin verbs built on them.
//!
//! # Example
//!
//! ```rust,ignore
//! use pagesearch_index::Manager;
//!
//! let manager = Manager::builder(config)
//!     .tree(tree)
//!     .index(index)
//!     .cache(Arc::new(RedbHtmlCache::open(&cache_path)?))
//!     .build()?;
//! manager.admin().rebuild_index().await?;
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use pagesearch_core::{DocumentIndex, Error, RendererKind, Result, SearchConfig};

use crate::admin::AdminActions;
use crate::cache::{HtmlCache, MemoryHtmlCache};
use crate::eligibility::Eligibility;
use crate::pipeline::IndexingPipeline;
use crate::prerender::PreRenderer;
use crate::publish::PublishHandlers;
use crate::render::{
    CachedRenderer, ContentRenderer, HttpRenderer, ProgrammaticRenderer, RendererRegistry,
    TemplateEngine,
};
use crate::timeout::ScriptTimeout;
use crate::tree::ContentTree;

/// Builder for [`Manager`].
pub struct ManagerBuilder {
    config: SearchConfig,
    tree: Option<Arc<dyn ContentTree>>,
    indexes: HashMap<String, Arc<dyn DocumentIndex>>,
    cache: Option<Arc<dyn HtmlCache>>,
    engine: Option<Arc<dyn TemplateEngine>>,
    renderers: Vec<(String, Arc<dyn ContentRenderer>)>,
    timeout: Option<Arc<dyn ScriptTimeout>>,
}

impl ManagerBuilder {
    /// The host content tree. Required.
    pub fn tree(mut self, tree: Arc<dyn ContentTree>) -> Self {
        self.tree = Some(tree);
        self
    }

    /// Register an index under its own name. The one named by
    /// `index_provider` is used.
    pub fn index(mut self, index: Arc<dyn DocumentIndex>) -> Self {
        self.indexes.insert(index.name().to_string(), index);
        self
    }

    /// HTML cache store. Defaults to an in-memory cache.
    pub fn cache(mut self, cache: Arc<dyn HtmlCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Template engine behind the programmatic renderer.
    pub fn template_engine(mut self, engine: Arc<dyn TemplateEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Use `renderer` for nodes of type `alias`.
    pub fn renderer(mut self, alias: impl Into<String>, renderer: Arc<dyn ContentRenderer>) -> Self {
        self.renderers.push((alias.into(), renderer));
        self
    }

    /// Host script timeout hook.
    pub fn timeout(mut self, timeout: Arc<dyn ScriptTimeout>) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn default_renderer(&self) -> Result<Arc<dyn ContentRenderer>> {
        match self.config.default_renderer {
            RendererKind::Programmatic => {
                let engine = self.engine.clone().ok_or_else(|| {
                    Error::config("default_renderer \"programmatic\" needs a template engine")
                })?;
                Ok(Arc::new(ProgrammaticRenderer::new(engine, &self.config)))
            }
            RendererKind::Http => Ok(Arc::new(HttpRenderer::from_config(&self.config)?)),
        }
    }

    /// Validate the configuration and build the manager.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for invalid settings, a missing tree,
    /// an unregistered `index_provider` or a renderer that cannot be built.
    pub fn build(self) -> Result<Manager> {
        self.config.validate()?;

        let tree = self
            .tree
            .clone()
            .ok_or_else(|| Error::config("a content tree is required"))?;
        let index = self
            .indexes
            .get(&self.config.index_provider)
            .cloned()
            .ok_or_else(|| Error::provider_not_found(&self.config.index_provider))?;
        let cache = self
            .cache
            .clone()
            .unwrap_or_else(|| Arc::new(MemoryHtmlCache::new()));

        let mut renderers = RendererRegistry::new(self.default_renderer()?);
        for (alias, renderer) in &self.renderers {
            renderers.register(alias.clone(), Arc::clone(renderer));
        }

        let sources = if self.config.publish_event_rendering {
            RendererRegistry::new(Arc::new(CachedRenderer::new(Arc::clone(&cache))))
        } else {
            renderers.clone()
        };

        let config = Arc::new(self.config);
        let pipeline = Arc::new(IndexingPipeline::new(
            Arc::clone(&config),
            tree,
            index,
            sources,
        ));
        let prerender = Arc::new(PreRenderer::new(
            renderers,
            Eligibility::from_config(&config),
            cache,
        ));

        let mut publish = PublishHandlers::new(Arc::clone(&config), Arc::clone(&prerender));
        let mut admin = AdminActions::new(
            Arc::clone(&config),
            Arc::clone(&pipeline),
            Arc::clone(&prerender),
        );
        if let Some(timeout) = self.timeout {
            publish = publish.with_timeout(Arc::clone(&timeout));
            admin = admin.with_timeout(timeout);
        }

        log::debug!(
            "Indexing manager ready: source={}, index={}",
            if config.publish_event_rendering { "cache" } else { "renderer" },
            config.index_provider
        );

        Ok(Manager {
            config,
            pipeline,
            publish: Arc::new(publish),
            admin,
        })
    }
}

/// The indexing side, built from configuration.
pub struct Manager {
    config: Arc<SearchConfig>,
    pipeline: Arc<IndexingPipeline>,
    publish: Arc<PublishHandlers>,
    admin: AdminActions,
}

impl Manager {
    /// Start building a manager.
    pub fn builder(config: SearchConfig) -> ManagerBuilder {
        ManagerBuilder {
            config,
            tree: None,
            indexes: HashMap::new(),
            cache: None,
            engine: None,
            renderers: Vec::new(),
            timeout: None,
        }
    }

    /// The configuration everything was built from.
    pub fn config(&self) -> &Arc<SearchConfig> {
        &self.config
    }

    /// The indexing pipeline, for host indexers enriching documents.
    pub fn pipeline(&self) -> &Arc<IndexingPipeline> {
        &self.pipeline
    }

    /// Publish lifecycle handlers.
    pub fn publish_handlers(&self) -> &Arc<PublishHandlers> {
        &self.publish
    }

    /// Admin verbs.
    pub fn admin(&self) -> &AdminActions {
        &self.admin
    }
}

impl std::fmt::Debug for Manager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Manager")
            .field("pipeline", &self.pipeline)
            .field("publish", &self.publish)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::node::ContentNode;
    use crate::pipeline::NodeOutcome;
    use crate::publish::ContentEvent;
    use crate::tree::MemoryContentTree;
    use async_trait::async_trait;
    use pagesearch_core::FieldMap;
    use std::collections::BTreeMap;

    struct NullIndex(&'static str);

    #[async_trait]
    impl DocumentIndex for NullIndex {
        async fn add_or_replace(&self, _fields: FieldMap) -> Result<()> {
            Ok(())
        }

        async fn remove(&self, _id: &str) -> Result<()> {
            Ok(())
        }

        async fn clear(&self) -> Result<()> {
            Ok(())
        }

        fn name(&self) -> &str {
            self.0
        }
    }

    struct Engine;

    #[async_trait]
    impl TemplateEngine for Engine {
        async fn render_template(
            &self,
            node: &ContentNode,
            _template_id: i32,
            _params: &BTreeMap<String, String>,
        ) -> Result<String> {
            Ok(format!("<p>rendered {}</p>", node.name))
        }
    }

    fn tree() -> Arc<dyn ContentTree> {
        Arc::new(MemoryContentTree::from_nodes([
            ContentNode::new(1, "Home", "Home").with_template(1),
        ]))
    }

    fn programmatic(publish_event_rendering: bool) -> SearchConfig {
        SearchConfig {
            default_renderer: RendererKind::Programmatic,
            publish_event_rendering,
            ..SearchConfig::default()
        }
    }

    #[test]
    fn test_missing_tree_is_config_error() {
        let err = Manager::builder(programmatic(false))
            .index(Arc::new(NullIndex("default")))
            .template_engine(Arc::new(Engine))
            .build()
            .unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_unknown_index_provider_fails_fast() {
        let err = Manager::builder(programmatic(false))
            .tree(tree())
            .index(Arc::new(NullIndex("other")))
            .template_engine(Arc::new(Engine))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::ProviderNotFound { .. }));
    }

    #[test]
    fn test_programmatic_needs_engine() {
        let err = Manager::builder(programmatic(false))
            .tree(tree())
            .index(Arc::new(NullIndex("default")))
            .build()
            .unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_http_default_needs_url() {
        let err = Manager::builder(SearchConfig::default())
            .tree(tree())
            .index(Arc::new(NullIndex("default")))
            .build()
            .unwrap_err();
        assert!(err.is_config());

        let config = SearchConfig {
            http_url: Some("http://localhost/default.aspx".to_string()),
            ..SearchConfig::default()
        };
        assert!(
            Manager::builder(config)
                .tree(tree())
                .index(Arc::new(NullIndex("default")))
                .build()
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_direct_render_source() {
        let manager = Manager::builder(programmatic(false))
            .tree(tree())
            .index(Arc::new(NullIndex("default")))
            .template_engine(Arc::new(Engine))
            .build()
            .unwrap();
        let node = ContentNode::new(1, "Home", "Home").with_template(1);
        let NodeOutcome::Emit(fields) = manager.pipeline().document_for(&node).await.unwrap() else {
            panic!("expected a document");
        };
        assert_eq!(fields["FullTextSearch"], "rendered Home");
    }

    #[tokio::test]
    async fn test_cache_source_after_publish() {
        let cache = Arc::new(MemoryHtmlCache::new());
        let manager = Manager::builder(programmatic(true))
            .tree(tree())
            .index(Arc::new(NullIndex("default")))
            .template_engine(Arc::new(Engine))
            .cache(cache.clone())
            .build()
            .unwrap();
        let node = ContentNode::new(1, "Home", "Home").with_template(1);

        let NodeOutcome::Emit(before) = manager.pipeline().document_for(&node).await.unwrap() else {
            panic!("expected a document");
        };
        assert!(!before.contains_key("FullTextSearch"));

        manager
            .publish_handlers()
            .handle(&ContentEvent::Published(node.clone()))
            .await
            .unwrap();
        let NodeOutcome::Emit(after) = manager.pipeline().document_for(&node).await.unwrap() else {
            panic!("expected a document");
        };
        assert_eq!(after["FullTextSearch"], "rendered Home");
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_alias_renderer_override() {
        struct Fixed;

        #[async_trait]
        impl ContentRenderer for Fixed {
            async fn render(&self, _node: &ContentNode) -> Result<Option<String>> {
                Ok(Some("<p>fixed</p>".to_string()))
            }

            fn name(&self) -> &str {
                "fixed"
            }
        }

        let manager = Manager::builder(programmatic(false))
            .tree(tree())
            .index(Arc::new(NullIndex("default")))
            .template_engine(Arc::new(Engine))
            .renderer("Home", Arc::new(Fixed))
            .build()
            .unwrap();
        let node = ContentNode::new(1, "Home", "Home").with_template(1);
        let NodeOutcome::Emit(fields) = manager.pipeline().document_for(&node).await.unwrap() else {
            panic!("expected a document");
        };
        assert_eq!(fields["FullTextSearch"], "fixed");
        assert_eq!(manager.config().index_provider, "default");
        assert!(!manager.publish_handlers().is_active());
    }
}
