//! Last-rendered HTML per node.
//!
//! When pages are pre-rendered on publish, the indexer reads their HTML from
//! here instead of rendering again. A store holds at most one row per node
//! id. Ids below 1 are never stored: writes and deletes report `false` and
//! reads miss.
//!
//! # Stores
//!
//! - [`MemoryHtmlCache`]: process-local map, for tests and single-shot runs
//! - [`RedbHtmlCache`]: embedded redb database, table `fullTextCache`

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use pagesearch_core::{Error, NodeId, Result};
use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};
use tokio::sync::RwLock;

const CACHE_TABLE: TableDefinition<i32, &str> = TableDefinition::new("fullTextCache");

fn is_cacheable(id: NodeId) -> bool {
    id >= 1
}

/// Persistent map from node id to rendered HTML.
#[async_trait]
pub trait HtmlCache: Send + Sync {
    /// Cached HTML for a node.
    async fn get(&self, id: NodeId) -> Result<Option<String>>;

    /// Store HTML for a node, replacing any earlier row. Returns `false`
    /// when the id cannot be cached.
    async fn put(&self, id: NodeId, html: &str) -> Result<bool>;

    /// Remove a node's row. Returns whether a row was removed.
    async fn delete(&self, id: NodeId) -> Result<bool>;

    /// Store name for diagnostics.
    fn name(&self) -> &str;
}

/// HTML cache held in memory.
#[derive(Debug, Default)]
pub struct MemoryHtmlCache {
    rows: RwLock<BTreeMap<NodeId, String>>,
}

impl MemoryHtmlCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached pages.
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    /// Whether nothing is cached.
    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl HtmlCache for MemoryHtmlCache {
    async fn get(&self, id: NodeId) -> Result<Option<String>> {
        if !is_cacheable(id) {
            return Ok(None);
        }
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn put(&self, id: NodeId, html: &str) -> Result<bool> {
        if !is_cacheable(id) {
            return Ok(false);
        }
        self.rows.write().await.insert(id, html.to_string());
        Ok(true)
    }

    async fn delete(&self, id: NodeId) -> Result<bool> {
        if !is_cacheable(id) {
            return Ok(false);
        }
        Ok(self.rows.write().await.remove(&id).is_some())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// HTML cache in an embedded redb database.
///
/// Replacing a row happens inside one write transaction, so a crash never
/// leaves a node without its previous HTML. Transactions run on Tokio's
/// blocking pool.
pub struct RedbHtmlCache {
    db: Arc<Database>,
}

impl RedbHtmlCache {
    /// Open or create the database at `path`, creating the table if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| Error::io_with_path(e, parent))?;
        }

        let db = Database::create(path)
            .map_err(|e| Error::cache(format!("Failed to open {}: {e}", path.display())))?;
        {
            let write_txn = db
                .begin_write()
                .map_err(|e| Error::cache(format!("Failed to begin write transaction: {e}")))?;
            write_txn
                .open_table(CACHE_TABLE)
                .map_err(|e| Error::cache(format!("Failed to create cache table: {e}")))?;
            write_txn
                .commit()
                .map_err(|e| Error::cache(format!("Failed to commit table creation: {e}")))?;
        }

        log::debug!("Opened HTML cache at {}", path.display());
        Ok(Self { db: Arc::new(db) })
    }

    /// Number of cached pages.
    pub fn len(&self) -> Result<u64> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| Error::cache(format!("Failed to begin read transaction: {e}")))?;
        let table = read_txn
            .open_table(CACHE_TABLE)
            .map_err(|e| Error::cache(format!("Failed to open cache table: {e}")))?;
        table
            .len()
            .map_err(|e| Error::cache(format!("Failed to count rows: {e}")))
    }

    /// Whether nothing is cached.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

/// Run a redb transaction on the blocking pool.
async fn run_blocking<T, F>(db: &Arc<Database>, op: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&Database) -> Result<T> + Send + 'static,
{
    let db = Arc::clone(db);
    tokio::task::spawn_blocking(move || op(&db))
        .await
        .map_err(|e| Error::cache(format!("Cache task failed: {e}")))?
}

fn read_row(db: &Database, id: NodeId) -> Result<Option<String>> {
    let read_txn = db
        .begin_read()
        .map_err(|e| Error::cache(format!("Failed to begin read transaction: {e}")))?;
    let table = read_txn
        .open_table(CACHE_TABLE)
        .map_err(|e| Error::cache(format!("Failed to open cache table: {e}")))?;
    match table.get(id) {
        Ok(Some(guard)) => Ok(Some(guard.value().to_string())),
        Ok(None) => Ok(None),
        Err(e) => Err(Error::cache(format!("Failed to read node {id}: {e}"))),
    }
}

fn write_row(db: &Database, id: NodeId, html: &str) -> Result<()> {
    let write_txn = db
        .begin_write()
        .map_err(|e| Error::cache(format!("Failed to begin write transaction: {e}")))?;
    {
        let mut table = write_txn
            .open_table(CACHE_TABLE)
            .map_err(|e| Error::cache(format!("Failed to open cache table: {e}")))?;
        table
            .insert(id, html)
            .map_err(|e| Error::cache(format!("Failed to store node {id}: {e}")))?;
    }
    write_txn
        .commit()
        .map_err(|e| Error::cache(format!("Failed to commit node {id}: {e}")))
}

fn remove_row(db: &Database, id: NodeId) -> Result<bool> {
    let write_txn = db
        .begin_write()
        .map_err(|e| Error::cache(format!("Failed to begin write transaction: {e}")))?;
    let removed = {
        let mut table = write_txn
            .open_table(CACHE_TABLE)
            .map_err(|e| Error::cache(format!("Failed to open cache table: {e}")))?;
        table
            .remove(id)
            .map_err(|e| Error::cache(format!("Failed to delete node {id}: {e}")))?
            .is_some()
    };
    write_txn
        .commit()
        .map_err(|e| Error::cache(format!("Failed to commit delete of node {id}: {e}")))?;
    Ok(removed)
}

#[async_trait]
impl HtmlCache for RedbHtmlCache {
    async fn get(&self, id: NodeId) -> Result<Option<String>> {
        if !is_cacheable(id) {
            return Ok(None);
        }
        run_blocking(&self.db, move |db| read_row(db, id)).await
    }

    async fn put(&self, id: NodeId, html: &str) -> Result<bool> {
        if !is_cacheable(id) {
            return Ok(false);
        }
        let html = html.to_string();
        run_blocking(&self.db, move |db| write_row(db, id, &html)).await?;
        Ok(true)
    }

    async fn delete(&self, id: NodeId) -> Result<bool> {
        if !is_cacheable(id) {
            return Ok(false);
        }
        run_blocking(&self.db, move |db| remove_row(db, id)).await
    }

    fn name(&self) -> &str {
        "redb"
    }
}

impl std::fmt::Debug for RedbHtmlCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbHtmlCache")
            .field("table", &"fullTextCache")
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
