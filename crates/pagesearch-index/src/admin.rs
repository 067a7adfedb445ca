//! Coarse rebuild, reindex and render-to-cache verbs.
//!
//! These are what dashboards, web services and the CLI call. With
//! `publish_event_rendering` on, the reindex verbs re-render the affected
//! nodes to the cache first so the indexer reads fresh HTML.

use std::sync::Arc;

use pagesearch_core::{NodeId, Result, SearchConfig};
use serde::Serialize;

use crate::node::ContentNode;
use crate::pipeline::{IndexReport, IndexingPipeline};
use crate::prerender::PreRenderer;
use crate::timeout::{ScriptTimeout, extend_budget};
use crate::tree::ContentTree;

/// Counts from a render-to-cache run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RenderReport {
    /// Nodes whose HTML was stored.
    pub cached: usize,
    /// Nodes visited without storing HTML.
    pub not_cached: usize,
    /// Tree reads that failed; the affected nodes were not rendered.
    pub failed: usize,
}

/// Admin verbs over the pipeline and the HTML cache.
pub struct AdminActions {
    config: Arc<SearchConfig>,
    pipeline: Arc<IndexingPipeline>,
    prerender: Arc<PreRenderer>,
    timeout: Option<Arc<dyn ScriptTimeout>>,
}

impl AdminActions {
    /// Create the admin verbs.
    pub fn new(
        config: Arc<SearchConfig>,
        pipeline: Arc<IndexingPipeline>,
        prerender: Arc<PreRenderer>,
    ) -> Self {
        Self {
            config,
            pipeline,
            prerender,
            timeout: None,
        }
    }

    /// Raise the host's script timeout before long operations.
    pub fn with_timeout(mut self, timeout: Arc<dyn ScriptTimeout>) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn tree(&self) -> &Arc<dyn ContentTree> {
        self.pipeline.tree()
    }

    fn prerenders(&self) -> bool {
        self.config.publish_event_rendering
    }

    fn extend_budget(&self) {
        extend_budget(&self.config, self.timeout.as_deref());
    }

    /// Empty the index and index the whole site again.
    pub async fn rebuild_index(&self) -> Result<IndexReport> {
        if self.prerenders() {
            self.extend_budget();
            self.render_all_to_cache().await?;
        }
        self.pipeline.rebuild().await
    }

    /// Reindex every published node without clearing the index first.
    pub async fn reindex_all(&self) -> Result<IndexReport> {
        if self.prerenders() {
            self.extend_budget();
            self.render_all_to_cache().await?;
        }
        self.pipeline.reindex_all().await
    }

    /// Reindex the listed nodes only.
    pub async fn reindex_nodes(&self, ids: &[NodeId]) -> Result<IndexReport> {
        if self.prerenders() {
            self.extend_budget();
            for &id in ids {
                self.render_node_to_cache(id).await?;
            }
        }
        self.pipeline.reindex_nodes(ids).await
    }

    /// Reindex the listed nodes and all their descendants.
    pub async fn reindex_nodes_and_descendants(&self, ids: &[NodeId]) -> Result<IndexReport> {
        if ids.is_empty() {
            return Ok(IndexReport::default());
        }
        if self.prerenders() {
            self.extend_budget();
            for &id in ids {
                self.render_subtree_to_cache(id).await?;
            }
        }
        self.pipeline.reindex_subtrees(ids).await
    }

    /// Render one node to the cache. Returns whether HTML was stored.
    pub async fn render_node_to_cache(&self, id: NodeId) -> Result<bool> {
        let mut report = RenderReport::default();
        match self.lookup(id, &mut report).await? {
            Some(node) => self.prerender.render_to_cache(&node).await,
            None => Ok(false),
        }
    }

    /// Render a node and its published descendants to the cache.
    pub async fn render_subtree_to_cache(&self, id: NodeId) -> Result<RenderReport> {
        let mut report = RenderReport::default();
        if id < 1 {
            return Ok(report);
        }
        if let Some(node) = self.lookup(id, &mut report).await? {
            self.render_walk(node, &mut report).await?;
        }
        Ok(report)
    }

    /// Render every published node to the cache.
    pub async fn render_all_to_cache(&self) -> Result<RenderReport> {
        let mut report = RenderReport::default();
        let roots = match self.tree().roots().await {
            Ok(roots) => roots,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                log::error!("Failed to list root nodes: {e}");
                report.failed += 1;
                Vec::new()
            }
        };
        for root in roots {
            self.render_walk(root, &mut report).await?;
        }
        log::info!(
            "Rendered {} pages to cache ({} without HTML, {} failed)",
            report.cached,
            report.not_cached,
            report.failed
        );
        Ok(report)
    }

    async fn lookup(&self, id: NodeId, report: &mut RenderReport) -> Result<Option<ContentNode>> {
        match self.tree().get(id).await {
            Ok(Some(node)) => Ok(Some(node)),
            Ok(None) => {
                log::debug!("Node {id} does not exist, nothing to render");
                Ok(None)
            }
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                log::error!("Failed to load node {id} for rendering: {e}");
                report.failed += 1;
                Ok(None)
            }
        }
    }

    async fn render_walk(&self, root: ContentNode, report: &mut RenderReport) -> Result<()> {
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            if !node.published || node.trashed {
                continue;
            }
            if self.prerender.render_to_cache(&node).await? {
                report.cached += 1;
            } else {
                report.not_cached += 1;
            }
            match self.tree().children(node.id).await {
                Ok(children) => stack.extend(children.into_iter().rev()),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    log::error!("Failed to list children of node {} for rendering: {e}", node.id);
                    report.failed += 1;
                }
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for AdminActions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminActions")
            .field("pipeline", &self.pipeline)
            .field("prerender", &self.prerender)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
