//! Content nodes as the indexing pipeline sees them.

use std::collections::BTreeMap;

use pagesearch_core::{
    FieldMap, ID_FIELD, INDEX_TYPE_FIELD, NODE_NAME_FIELD, NODE_TYPE_ALIAS_FIELD, NodeId,
    ROOT_NODE_ID,
};
use serde::{Deserialize, Serialize};

/// Logical content category written to every page document.
pub const CONTENT_INDEX_TYPE: &str = "content";

/// A page in the host CMS content tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentNode {
    /// Node id. Real nodes are positive.
    pub id: NodeId,

    /// Parent id, [`ROOT_NODE_ID`] for top-level pages.
    pub parent_id: NodeId,

    /// Ancestor chain from the virtual root down to and including this node.
    pub path: Vec<NodeId>,

    /// Page name.
    pub name: String,

    /// Document type alias.
    pub node_type_alias: String,

    /// Assigned template, `None` or zero when the page cannot be rendered.
    pub template_id: Option<i32>,

    /// Whether the current version is published.
    pub published: bool,

    /// Whether the node sits in the recycle bin.
    pub trashed: bool,

    /// Property values by alias.
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl ContentNode {
    /// Create a published, untrashed top-level node without a template.
    pub fn new(id: NodeId, name: impl Into<String>, node_type_alias: impl Into<String>) -> Self {
        Self {
            id,
            parent_id: ROOT_NODE_ID,
            path: vec![ROOT_NODE_ID, id],
            name: name.into(),
            node_type_alias: node_type_alias.into(),
            template_id: None,
            published: true,
            trashed: false,
            properties: BTreeMap::new(),
        }
    }

    /// Place the node under `parent`, deriving the ancestor chain from it.
    pub fn with_parent(mut self, parent: &ContentNode) -> Self {
        self.parent_id = parent.id;
        self.path = parent.path.iter().copied().chain([self.id]).collect();
        self
    }

    /// Assign a template.
    pub fn with_template(mut self, template_id: i32) -> Self {
        self.template_id = Some(template_id);
        self
    }

    /// Set a property value.
    pub fn with_property(mut self, alias: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(alias.into(), value.into());
        self
    }

    /// Mark the node unpublished.
    pub fn unpublished(mut self) -> Self {
        self.published = false;
        self
    }

    /// Mark the node trashed.
    pub fn trashed(mut self) -> Self {
        self.trashed = true;
        self
    }

    /// Whether the node has a usable template.
    pub fn has_template(&self) -> bool {
        self.template_id.is_some_and(|id| id > 0)
    }

    /// Property value by alias.
    pub fn property(&self, alias: &str) -> Option<&str> {
        self.properties.get(alias).map(String::as_str)
    }

    /// Ancestor path as space separated ids with the virtual root removed.
    pub fn path_string(&self) -> String {
        let mut ids = self.path.iter().peekable();
        if ids.peek() == Some(&&ROOT_NODE_ID) {
            ids.next();
        }
        ids.map(ToString::to_string).collect::<Vec<_>>().join(" ")
    }

    /// The fields a host indexer stores for any node before full-text
    /// enrichment.
    pub fn base_fields(&self) -> FieldMap {
        let mut fields = FieldMap::new();
        fields.insert(ID_FIELD.to_string(), self.id.to_string());
        fields.insert(INDEX_TYPE_FIELD.to_string(), CONTENT_INDEX_TYPE.to_string());
        fields.insert(NODE_NAME_FIELD.to_string(), self.name.clone());
        fields.insert(
            NODE_TYPE_ALIAS_FIELD.to_string(),
            self.node_type_alias.clone(),
        );
        fields
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_string_strips_root() {
        let home = ContentNode::new(1050, "Home", "Home");
        let child = ContentNode::new(1060, "Shop", "Page").with_parent(&home);
        assert_eq!(child.path, vec![-1, 1050, 1060]);
        assert_eq!(child.path_string(), "1050 1060");
        assert_eq!(home.path_string(), "1050");
    }

    #[test]
    fn test_path_string_without_root_marker() {
        let mut node = ContentNode::new(7, "Orphan", "Page");
        node.path = vec![3, 7];
        assert_eq!(node.path_string(), "3 7");
    }

    #[test]
    fn test_has_template() {
        let node = ContentNode::new(1, "A", "Page");
        assert!(!node.has_template());
        assert!(!node.clone().with_template(0).has_template());
        assert!(node.with_template(12).has_template());
    }

    #[test]
    fn test_base_fields() {
        let fields = ContentNode::new(1050, "Home", "Home").base_fields();
        assert_eq!(fields["id"], "1050");
        assert_eq!(fields["__IndexType"], "content");
        assert_eq!(fields["nodeName"], "Home");
        assert_eq!(fields["nodeTypeAlias"], "Home");
    }
}
