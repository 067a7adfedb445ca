//! Seams shared by the indexing pipeline and index backends.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::Result;

/// Field name to value map handed to an index backend.
///
/// Ordered so that documents serialize and log deterministically.
pub type FieldMap = BTreeMap<String, String>;

/// Field holding the document id (the node id).
pub const ID_FIELD: &str = "id";

/// Field holding a document's logical content category.
pub const INDEX_TYPE_FIELD: &str = "__IndexType";

/// Field holding the node name.
pub const NODE_NAME_FIELD: &str = "nodeName";

/// Field holding the node's document type alias.
pub const NODE_TYPE_ALIAS_FIELD: &str = "nodeTypeAlias";

/// Write side of a search index.
///
/// The indexing pipeline produces one [`FieldMap`] per node; an implementation
/// stores it keyed by its `id` field, replacing any earlier document with the
/// same id.
#[async_trait]
pub trait DocumentIndex: Send + Sync {
    /// Add a document, replacing any document with the same id.
    async fn add_or_replace(&self, fields: FieldMap) -> Result<()>;

    /// Remove the document with the given id. Missing ids are not an error.
    async fn remove(&self, id: &str) -> Result<()>;

    /// Remove every document.
    async fn clear(&self) -> Result<()>;

    /// Make staged changes visible to searchers.
    async fn commit(&self) -> Result<()> {
        Ok(())
    }

    /// Index name for diagnostics.
    fn name(&self) -> &str;
}
