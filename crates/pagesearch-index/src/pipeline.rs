//! The indexing pipeline.
//!
//! For each node the pipeline checks eligibility, fetches HTML from its
//! content source (a renderer, or the HTML cache when pages are pre-rendered
//! on publish), strips it to text and hands the host's field map, enriched
//! with the full-text and path fields, to a [`DocumentIndex`].
//!
//! Failures are scoped to one node. A node whose HTML cannot be fetched is
//! still indexed, without text. Only fatal errors abort a batch.

use std::ops::AddAssign;
use std::sync::Arc;

use pagesearch_content::HtmlStrip;
use pagesearch_core::{DocumentIndex, FieldMap, NodeId, Result, SearchConfig};
use serde::Serialize;

use crate::eligibility::{Eligibility, Rejection};
use crate::node::ContentNode;
use crate::render::RendererRegistry;
use crate::tree::ContentTree;

/// What the pipeline decided for one node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeOutcome {
    /// Store this field map.
    Emit(FieldMap),
    /// Leave the node out of the index.
    Skip(Rejection),
}

/// Counts from a reindex run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IndexReport {
    /// Documents handed to the index.
    pub indexed: usize,
    /// Nodes left out as ineligible.
    pub skipped: usize,
    /// Nodes lost to non-fatal errors.
    pub failed: usize,
}

impl AddAssign for IndexReport {
    fn add_assign(&mut self, other: Self) {
        self.indexed += other.indexed;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

/// Produces index documents for content nodes.
pub struct IndexingPipeline {
    config: Arc<SearchConfig>,
    tree: Arc<dyn ContentTree>,
    index: Arc<dyn DocumentIndex>,
    sources: RendererRegistry,
    eligibility: Eligibility,
    strip: HtmlStrip,
}

impl IndexingPipeline {
    /// Create a pipeline. `sources` supplies HTML per node-type alias.
    pub fn new(
        config: Arc<SearchConfig>,
        tree: Arc<dyn ContentTree>,
        index: Arc<dyn DocumentIndex>,
        sources: RendererRegistry,
    ) -> Self {
        let eligibility = Eligibility::from_config(&config);
        let strip = HtmlStrip::from_config(&config);
        Self {
            config,
            tree,
            index,
            sources,
            eligibility,
            strip,
        }
    }

    /// The content tree walked by reindex operations.
    pub fn tree(&self) -> &Arc<dyn ContentTree> {
        &self.tree
    }

    /// The index written to.
    pub fn index(&self) -> &Arc<dyn DocumentIndex> {
        &self.index
    }

    /// Enrich the host's field map for one node.
    ///
    /// With full-text search disabled `fields` comes back unchanged.
    pub async fn process_node(&self, node: &ContentNode, mut fields: FieldMap) -> Result<NodeOutcome> {
        if !self.config.enabled {
            return Ok(NodeOutcome::Emit(fields));
        }
        if let Err(reason) = self.eligibility.check(node) {
            log::debug!("Skipping node {}: {reason}", node.id);
            return Ok(NodeOutcome::Skip(reason));
        }

        fields.insert(self.config.path_field.clone(), node.path_string());
        if let Some(html) = self.fetch_html(node).await? {
            fields.insert(
                self.config.full_text_field.clone(),
                self.strip.text_from_html(&html),
            );
        }
        Ok(NodeOutcome::Emit(fields))
    }

    /// The document for a node, starting from its base fields.
    pub async fn document_for(&self, node: &ContentNode) -> Result<NodeOutcome> {
        self.process_node(node, node.base_fields()).await
    }

    async fn fetch_html(&self, node: &ContentNode) -> Result<Option<String>> {
        let source = self.sources.resolve(&node.node_type_alias);
        match source.render(node).await {
            Ok(html) => Ok(html),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                log::warn!(
                    "No text for node {} from {}: {e}",
                    node.id,
                    source.name()
                );
                Ok(None)
            }
        }
    }

    /// Index or drop one node. Returns whether its children should be
    /// visited.
    async fn index_one(&self, node: &ContentNode, report: &mut IndexReport) -> Result<bool> {
        let outcome = match self.document_for(node).await {
            Ok(outcome) => outcome,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                log::error!("Failed to process node {}: {e}", node.id);
                report.failed += 1;
                return Ok(false);
            }
        };

        match outcome {
            NodeOutcome::Emit(fields) => match self.index.add_or_replace(fields).await {
                Ok(()) => report.indexed += 1,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    log::error!("Failed to index node {}: {e}", node.id);
                    report.failed += 1;
                }
            },
            NodeOutcome::Skip(_) => {
                report.skipped += 1;
                match self.index.remove(&node.id.to_string()).await {
                    Ok(()) => {}
                    Err(e) if e.is_fatal() => return Err(e),
                    Err(e) => log::warn!("Failed to remove node {} from the index: {e}", node.id),
                }
                return Ok(false);
            }
        }
        Ok(true)
    }

    async fn lookup(&self, id: NodeId, report: &mut IndexReport) -> Result<Option<ContentNode>> {
        match self.tree.get(id).await {
            Ok(Some(node)) => Ok(Some(node)),
            Ok(None) => {
                log::debug!("Node {id} does not exist");
                Ok(None)
            }
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                log::error!("Failed to load node {id}: {e}");
                report.failed += 1;
                Ok(None)
            }
        }
    }

    async fn walk(&self, root: ContentNode, report: &mut IndexReport) -> Result<()> {
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            if !self.index_one(&node, report).await? {
                continue;
            }
            match self.tree.children(node.id).await {
                Ok(children) => stack.extend(children.into_iter().rev()),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    log::error!("Failed to list children of node {}: {e}", node.id);
                    report.failed += 1;
                }
            }
        }
        Ok(())
    }

    /// Reindex one node without its descendants.
    pub async fn reindex_node(&self, id: NodeId) -> Result<IndexReport> {
        self.reindex_nodes(&[id]).await
    }

    /// Reindex each listed node without descendants.
    pub async fn reindex_nodes(&self, ids: &[NodeId]) -> Result<IndexReport> {
        let mut report = IndexReport::default();
        for &id in ids {
            if let Some(node) = self.lookup(id, &mut report).await? {
                self.index_one(&node, &mut report).await?;
            }
        }
        self.index.commit().await?;
        Ok(report)
    }

    /// Reindex a node and every descendant, depth first in sibling order.
    ///
    /// A node that is skipped takes its whole subtree with it.
    pub async fn reindex_subtree(&self, id: NodeId) -> Result<IndexReport> {
        self.reindex_subtrees(&[id]).await
    }

    /// Reindex several subtrees.
    pub async fn reindex_subtrees(&self, ids: &[NodeId]) -> Result<IndexReport> {
        let mut report = IndexReport::default();
        for &id in ids {
            if let Some(node) = self.lookup(id, &mut report).await? {
                self.walk(node, &mut report).await?;
            }
        }
        self.index.commit().await?;
        Ok(report)
    }

    /// Reindex every node reachable from the top-level nodes.
    pub async fn reindex_all(&self) -> Result<IndexReport> {
        let mut report = IndexReport::default();
        for root in self.tree.roots().await? {
            self.walk(root, &mut report).await?;
        }
        self.index.commit().await?;
        log::info!(
            "Reindexed {} nodes into '{}' ({} skipped, {} failed)",
            report.indexed,
            self.index.name(),
            report.skipped,
            report.failed
        );
        Ok(report)
    }

    /// Empty the index and reindex everything.
    pub async fn rebuild(&self) -> Result<IndexReport> {
        log::info!("Rebuilding index '{}'", self.index.name());
        self.index.clear().await?;
        self.reindex_all().await
    }
}

impl std::fmt::Debug for IndexingPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexingPipeline")
            .field("index", &self.index.name())
            .field("sources", &self.sources)
            .field("eligibility", &self.eligibility)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
