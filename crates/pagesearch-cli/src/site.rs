//! Content tree exports.
//!
//! The index and cache commands work offline from a JSON export of the CMS
//! content tree: an array of pages, each naming its parent. Ancestor paths
//! are derived on load.
//!
//! ```json
//! [
//!   { "id": 1050, "name": "Home", "node_type_alias": "Home", "template_id": 1 },
//!   { "id": 1051, "parent_id": 1050, "name": "Guitars", "node_type_alias": "Page",
//!     "template_id": 1, "properties": { "bodyText": "<p>Strings</p>" } }
//! ]
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use pagesearch_core::{Error, NodeId, ROOT_NODE_ID, Result};
use pagesearch_index::{ContentNode, MemoryContentTree};
use serde::Deserialize;

/// One page as it appears in an export.
#[derive(Debug, Clone, Deserialize)]
pub struct SitePage {
    pub id: NodeId,
    #[serde(default = "root_id")]
    pub parent_id: NodeId,
    pub name: String,
    pub node_type_alias: String,
    #[serde(default)]
    pub template_id: Option<i32>,
    #[serde(default = "published")]
    pub published: bool,
    #[serde(default)]
    pub trashed: bool,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

fn root_id() -> NodeId {
    ROOT_NODE_ID
}

fn published() -> bool {
    true
}

/// Read an export file into a content tree.
pub fn load_site(path: &Path) -> Result<MemoryContentTree> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::io_with_path(e, path))?;
    let pages: Vec<SitePage> = serde_json::from_str(&content)
        .map_err(|e| Error::config(format!("Failed to parse {}: {e}", path.display())))?;
    let nodes = build_nodes(pages)?;
    log::info!("Loaded {} pages from {}", nodes.len(), path.display());
    Ok(MemoryContentTree::from_nodes(nodes))
}

/// Turn export pages into content nodes with full ancestor paths.
pub fn build_nodes(pages: Vec<SitePage>) -> Result<Vec<ContentNode>> {
    let parents: HashMap<NodeId, NodeId> = pages.iter().map(|p| (p.id, p.parent_id)).collect();
    if parents.len() != pages.len() {
        return Err(Error::config("Site export contains duplicate page ids"));
    }

    pages
        .into_iter()
        .map(|page| {
            let path = ancestor_path(page.id, &parents)?;
            Ok(ContentNode {
                id: page.id,
                parent_id: page.parent_id,
                path,
                name: page.name,
                node_type_alias: page.node_type_alias,
                template_id: page.template_id,
                published: page.published,
                trashed: page.trashed,
                properties: page.properties,
            })
        })
        .collect()
}

fn ancestor_path(id: NodeId, parents: &HashMap<NodeId, NodeId>) -> Result<Vec<NodeId>> {
    let mut path = vec![id];
    let mut current = id;
    loop {
        let parent = parents.get(&current).copied().unwrap_or(ROOT_NODE_ID);
        if parent == ROOT_NODE_ID {
            break;
        }
        if !parents.contains_key(&parent) {
            return Err(Error::config(format!(
                "Page {current} names missing parent {parent}"
            )));
        }
        if path.contains(&parent) || path.len() > parents.len() {
            return Err(Error::config(format!("Page {id} is part of a parent cycle")));
        }
        path.push(parent);
        current = parent;
    }
    path.push(ROOT_NODE_ID);
    path.reverse();
    Ok(path)
}

// ============================================================================
// Tests
// ============================================================================
