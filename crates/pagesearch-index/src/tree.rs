//! Read access to the host content tree.
//!
//! The CMS owns the tree; the pipeline and the admin verbs only need to look
//! nodes up and walk children in sibling order. [`MemoryContentTree`] is the
//! in-process implementation used by tests and the CLI.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use pagesearch_core::{NodeId, ROOT_NODE_ID, Result};
use tokio::sync::RwLock;

use crate::node::ContentNode;

/// The host's content tree.
#[async_trait]
pub trait ContentTree: Send + Sync {
    /// Look a node up. Unknown ids yield `Ok(None)`.
    async fn get(&self, id: NodeId) -> Result<Option<ContentNode>>;

    /// Direct children of `id` in sibling order.
    async fn children(&self, id: NodeId) -> Result<Vec<ContentNode>>;

    /// Top-level nodes in sibling order.
    async fn roots(&self) -> Result<Vec<ContentNode>> {
        self.children(ROOT_NODE_ID).await
    }
}

#[derive(Debug, Default)]
struct TreeState {
    nodes: BTreeMap<NodeId, ContentNode>,
    children: HashMap<NodeId, Vec<NodeId>>,
}

impl TreeState {
    fn upsert(&mut self, node: ContentNode) {
        if let Some(previous) = self.nodes.get(&node.id)
            && previous.parent_id != node.parent_id
            && let Some(siblings) = self.children.get_mut(&previous.parent_id)
        {
            siblings.retain(|id| *id != node.id);
        }
        let siblings = self.children.entry(node.parent_id).or_default();
        if !siblings.contains(&node.id) {
            siblings.push(node.id);
        }
        self.nodes.insert(node.id, node);
    }
}

/// Content tree held in memory. Siblings keep insertion order.
#[derive(Debug, Default)]
pub struct MemoryContentTree {
    state: RwLock<TreeState>,
}

impl MemoryContentTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from nodes given parents first.
    pub fn from_nodes(nodes: impl IntoIterator<Item = ContentNode>) -> Self {
        let mut state = TreeState::default();
        for node in nodes {
            state.upsert(node);
        }
        Self {
            state: RwLock::new(state),
        }
    }

    /// Insert a node or replace the node with the same id.
    pub async fn upsert(&self, node: ContentNode) {
        self.state.write().await.upsert(node);
    }

    /// Number of nodes.
    pub async fn len(&self) -> usize {
        self.state.read().await.nodes.len()
    }

    /// Whether the tree has no nodes.
    pub async fn is_empty(&self) -> bool {
        self.state.read().await.nodes.is_empty()
    }
}

#[async_trait]
impl ContentTree for MemoryContentTree {
    async fn get(&self, id: NodeId) -> Result<Option<ContentNode>> {
        Ok(self.state.read().await.nodes.get(&id).cloned())
    }

    async fn children(&self, id: NodeId) -> Result<Vec<ContentNode>> {
        let state = self.state.read().await;
        Ok(state
            .children
            .get(&id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|child| state.nodes.get(child).cloned())
                    .collect()
            })
            .unwrap_or_default())
    }
}

// ============================================================================
// Tests
// ============================================================================
