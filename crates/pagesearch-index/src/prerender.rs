//! Rendering pages into the HTML cache.
//!
//! Shared by the publish handlers and the render-to-cache admin verbs. A
//! node that renders stores its HTML; a node that should not be indexed or
//! fails to render loses its row, so the indexer never reads stale HTML for
//! it.

use std::sync::Arc;

use pagesearch_core::{NodeId, Result};

use crate::cache::HtmlCache;
use crate::eligibility::{Eligibility, Rejection};
use crate::node::ContentNode;
use crate::render::RendererRegistry;

/// Renders nodes and stores the result in an [`HtmlCache`].
pub struct PreRenderer {
    renderers: RendererRegistry,
    eligibility: Eligibility,
    cache: Arc<dyn HtmlCache>,
}

impl PreRenderer {
    /// Create a pre-renderer.
    pub fn new(
        renderers: RendererRegistry,
        eligibility: Eligibility,
        cache: Arc<dyn HtmlCache>,
    ) -> Self {
        Self {
            renderers,
            eligibility,
            cache,
        }
    }

    /// The cache written to.
    pub fn cache(&self) -> &Arc<dyn HtmlCache> {
        &self.cache
    }

    /// Render one node into the cache. Returns whether HTML was stored.
    ///
    /// Unpublished and trashed nodes are left alone. Every failure other
    /// than a fatal one is logged and reported as `false`.
    pub async fn render_to_cache(&self, node: &ContentNode) -> Result<bool> {
        match self.eligibility.check(node) {
            Err(Rejection::Unpublished | Rejection::Trashed) => return Ok(false),
            Err(reason) => {
                log::debug!("Not caching node {}: {reason}", node.id);
                self.remove(node.id).await?;
                return Ok(false);
            }
            Ok(()) => {}
        }

        let renderer = self.renderers.resolve(&node.node_type_alias);
        let html = match renderer.render(node).await {
            Ok(html) => html,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                log::warn!("Render of node {} with {} failed: {e}", node.id, renderer.name());
                None
            }
        };

        match html {
            Some(html) => match self.cache.put(node.id, &html).await {
                Ok(stored) => Ok(stored),
                Err(e) if e.is_fatal() => Err(e),
                Err(e) => {
                    log::warn!("Failed to cache HTML for node {}: {e}", node.id);
                    Ok(false)
                }
            },
            None => {
                self.remove(node.id).await?;
                Ok(false)
            }
        }
    }

    /// Remove a node's row, logging soft failures.
    pub async fn remove(&self, id: NodeId) -> Result<bool> {
        match self.cache.delete(id).await {
            Ok(removed) => Ok(removed),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                log::warn!("Failed to remove cached HTML for node {id}: {e}");
                Ok(false)
            }
        }
    }
}

impl std::fmt::Debug for PreRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreRenderer")
            .field("renderers", &self.renderers)
            .field("cache", &self.cache.name())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
