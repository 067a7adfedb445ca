//! Tantivy index writer.
//!
//! `TantivyIndex` wraps an `IndexWriter` behind the [`DocumentIndex`] seam:
//! documents are keyed by their `id` field, so adding a document first
//! deletes any earlier one with the same id. Changes become searchable on
//! [`commit`](DocumentIndex::commit).
//!
//! # Usage
//!
//! ```rust,ignore
//! use pagesearch_fts::{PageSchema, TantivyIndex};
//!
//! let schema = PageSchema::from_config(&config);
//! let index = TantivyIndex::open(&index_path, &schema, "default")?;
//! index.add_or_replace(fields).await?;
//! index.commit().await?;
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use pagesearch_core::{DocumentIndex, Error, FieldMap, ID_FIELD, Result};
use tantivy::schema::OwnedValue;
use tantivy::{Index, IndexWriter, TantivyDocument, Term};
use tokio::sync::Mutex;

use crate::schema::PageSchema;

/// Index writer buffer size (50MB).
const WRITER_BUFFER_SIZE: usize = 50_000_000;

/// Write side of a Tantivy page index.
pub struct TantivyIndex {
    name: String,
    index: Index,
    writer: Mutex<IndexWriter>,
    schema: PageSchema,
}

impl TantivyIndex {
    /// Create or open a Tantivy index at the given path.
    ///
    /// If the directory doesn't exist, creates a new index.
    /// If the directory exists, opens the existing index.
    pub fn open(index_path: &Path, schema: &PageSchema, name: &str) -> Result<Self> {
        if !index_path.exists() {
            std::fs::create_dir_all(index_path).map_err(|e| Error::io_with_path(e, index_path))?;
        }

        let index = if index_path.join("meta.json").exists() {
            Index::open_in_dir(index_path)
                .map_err(|e| Error::index(format!("Failed to open index: {e}")))?
        } else {
            Index::create_in_dir(index_path, schema.schema().clone())
                .map_err(|e| Error::index(format!("Failed to create index: {e}")))?
        };

        Self::from_index(index, schema, name)
    }

    /// Create an in-memory index (for testing).
    pub fn in_memory(schema: &PageSchema, name: &str) -> Result<Self> {
        Self::from_index(Index::create_in_ram(schema.schema().clone()), schema, name)
    }

    fn from_index(index: Index, schema: &PageSchema, name: &str) -> Result<Self> {
        let writer = index
            .writer(WRITER_BUFFER_SIZE)
            .map_err(|e| Error::index(format!("Failed to create index writer: {e}")))?;
        Ok(Self {
            name: name.to_string(),
            index,
            writer: Mutex::new(writer),
            schema: schema.clone(),
        })
    }

    /// Get reference to the underlying Tantivy index.
    pub fn index(&self) -> &Index {
        &self.index
    }

    /// Get the schema.
    pub fn schema(&self) -> &PageSchema {
        &self.schema
    }

    fn to_tantivy_doc(&self, fields: &FieldMap) -> TantivyDocument {
        let mut doc = TantivyDocument::new();
        let mut properties = BTreeMap::new();
        for (name, value) in fields {
            match self.schema.field(name) {
                Some(field) => doc.add_text(field, value),
                None => {
                    properties.insert(name.clone(), OwnedValue::Str(value.clone()));
                }
            }
        }
        if !properties.is_empty() {
            log::trace!("Storing {} extra properties", properties.len());
            doc.add_object(self.schema.properties, properties);
        }
        doc
    }
}

#[async_trait]
impl DocumentIndex for TantivyIndex {
    async fn add_or_replace(&self, fields: FieldMap) -> Result<()> {
        let id = fields
            .get(ID_FIELD)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::index("document has no id field"))?;
        let doc = self.to_tantivy_doc(&fields);

        let writer = self.writer.lock().await;
        writer.delete_term(Term::from_field_text(self.schema.id, id));
        writer
            .add_document(doc)
            .map_err(|e| Error::index(format!("Failed to add document {id}: {e}")))?;
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<()> {
        let writer = self.writer.lock().await;
        writer.delete_term(Term::from_field_text(self.schema.id, id));
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let writer = self.writer.lock().await;
        writer
            .delete_all_documents()
            .map_err(|e| Error::index(format!("Failed to clear index: {e}")))?;
        Ok(())
    }

    async fn commit(&self) -> Result<()> {
        let mut writer = self.writer.lock().await;
        writer
            .commit()
            .map_err(|e| Error::index(format!("Failed to commit index: {e}")))?;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for TantivyIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TantivyIndex")
            .field("name", &self.name)
            .field("index", &"<tantivy::Index>")
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
    use tantivy::schema::Value;
    use tempfile::tempdir;

    fn schema() -> PageSchema {
        PageSchema::build("FullTextSearch", "FullTextPath")
    }

    fn doc(id: &str, body: &str) -> FieldMap {
        [
            ("id", id),
            ("__IndexType", "content"),
            ("FullTextSearch", body),
            ("pageTitle", "Extra title"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    fn num_docs(index: &TantivyIndex) -> u64 {
        index.index().reader().unwrap().searcher().num_docs()
    }

    #[tokio::test]
    async fn test_add_and_commit() {
        let index = TantivyIndex::in_memory(&schema(), "default").unwrap();
        index.add_or_replace(doc("1", "hello")).await.unwrap();
        index.add_or_replace(doc("2", "world")).await.unwrap();
        index.commit().await.unwrap();
        assert_eq!(num_docs(&index), 2);
    }

    #[test]
    fn test_extra_fields_go_to_properties() {
        let index = TantivyIndex::in_memory(&schema(), "default").unwrap();
        let tantivy_doc = index.to_tantivy_doc(&doc("1", "hello"));
        let stored = tantivy_doc.get_first(index.schema().properties).unwrap();
        let entries: Vec<(String, String)> = stored
            .as_object()
            .unwrap()
            .map(|(key, value)| (key.to_string(), value.as_str().unwrap().to_string()))
            .collect();
        assert_eq!(
            entries,
            vec![("pageTitle".to_string(), "Extra title".to_string())]
        );
    }

    #[tokio::test]
    async fn test_replace_keeps_one_document_per_id() {
        let index = TantivyIndex::in_memory(&schema(), "default").unwrap();
        index.add_or_replace(doc("1", "first")).await.unwrap();
        index.commit().await.unwrap();
        index.add_or_replace(doc("1", "second")).await.unwrap();
        index.commit().await.unwrap();
        assert_eq!(num_docs(&index), 1);
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let index = TantivyIndex::in_memory(&schema(), "default").unwrap();
        for id in ["1", "2", "3"] {
            index.add_or_replace(doc(id, "text")).await.unwrap();
        }
        index.commit().await.unwrap();

        index.remove("2").await.unwrap();
        index.commit().await.unwrap();
        assert_eq!(num_docs(&index), 2);

        index.clear().await.unwrap();
        index.commit().await.unwrap();
        assert_eq!(num_docs(&index), 0);
    }

    #[tokio::test]
    async fn test_missing_id_rejected() {
        let index = TantivyIndex::in_memory(&schema(), "default").unwrap();
        let err = index.add_or_replace(FieldMap::new()).await.unwrap_err();
        assert!(matches!(err, Error::Index { .. }));
    }

    #[tokio::test]
    async fn test_open_creates_and_reopens() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index");
        {
            let index = TantivyIndex::open(&path, &schema(), "default").unwrap();
            index.add_or_replace(doc("1", "persisted")).await.unwrap();
            index.commit().await.unwrap();
        }
        assert!(path.join("meta.json").exists());
        let reopened = TantivyIndex::open(&path, &schema(), "default").unwrap();
        assert_eq!(num_docs(&reopened), 1);
    }
}
