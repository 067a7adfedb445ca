//! In-memory search provider.
//!
//! `SimpleSearch` keeps every document in memory and evaluates query strings
//! by linear scan. It is both a [`SearchProvider`] and a [`DocumentIndex`], so
//! a pipeline can write into it and the search façade can query it without a
//! Tantivy index on disk. Used for tests and small sites.
//!
//! Accepts the query subset [`QueryBuilder`](crate::QueryBuilder) emits:
//! terms, phrases, prefix, fuzzy and boost suffixes, required groups.
//!
//! # Limitations
//!
//! - O(n) search time
//! - No stemming; tokens are lower-cased alphanumeric runs
//! - Score is the sum of matching clause boosts

use std::collections::BTreeMap;

use async_trait::async_trait;
use pagesearch_core::{DocumentIndex, Error, FieldMap, ID_FIELD, Result};
use tokio::sync::RwLock;

use crate::backend::{ResultSet, SearchHit, SearchProvider};
use crate::syntax::{Clause, Matcher, Node, allowed_edits, parse_query, tokenize};
use crate::types::SearchWindow;

/// Linear-scan provider over documents held in memory.
pub struct SimpleSearch {
    name: String,
    documents: RwLock<BTreeMap<String, FieldMap>>,
}

impl SimpleSearch {
    /// Create an empty provider.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            documents: RwLock::new(BTreeMap::new()),
        }
    }

    /// Number of stored documents.
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    /// Returns whether no documents are stored.
    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }

    /// Stored fields of one document.
    pub async fn document(&self, id: &str) -> Option<FieldMap> {
        self.documents.read().await.get(id).cloned()
    }
}

#[async_trait]
impl SearchProvider for SimpleSearch {
    async fn search(&self, query: &str, window: SearchWindow) -> Result<ResultSet> {
        let parsed = parse_query(query)?;
        let documents = self.documents.read().await;

        let mut scored: Vec<(&String, &FieldMap, f32)> = documents
            .iter()
            .filter_map(|(id, fields)| parsed.score(fields).map(|s| (id, fields, s)))
            .collect();
        scored.sort_by(|a, b| b.2.total_cmp(&a.2));

        let total = scored.len();
        let end = match window.limit {
            Some(limit) => window.offset.saturating_add(limit).min(total),
            None => total,
        };
        let hits = scored
            .get(window.offset.min(total)..end)
            .unwrap_or_default()
            .iter()
            .map(|(id, fields, score)| SearchHit {
                id: (*id).clone(),
                score: *score,
                fields: (*fields).clone(),
            })
            .collect();

        log::debug!(
            "SimpleSearch '{}': {total} matches for query '{query}'",
            self.name
        );

        Ok(ResultSet {
            total,
            offset: window.offset,
            hits,
            provider: self.name.clone(),
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl DocumentIndex for SimpleSearch {
    async fn add_or_replace(&self, fields: FieldMap) -> Result<()> {
        let id = fields
            .get(ID_FIELD)
            .filter(|id| !id.is_empty())
            .cloned()
            .ok_or_else(|| Error::index("document has no id field"))?;
        self.documents.write().await.insert(id, fields);
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<()> {
        self.documents.write().await.remove(id);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.documents.write().await.clear();
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for SimpleSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimpleSearch")
            .field("name", &self.name)
            .finish()
    }
}

// ============================================================================
// Matching
// ============================================================================

impl Node {
    /// Score of a document, or `None` when it does not match.
    fn score(&self, fields: &FieldMap) -> Option<f32> {
        match self {
            Node::Clause(clause) => clause.score(fields),
            Node::And(children) => children.iter().map(|c| c.score(fields)).sum(),
            Node::Group(children) => {
                let mut total = 0.0;
                let mut any = false;
                let mut has_required = false;
                for child in children {
                    has_required |= child.required;
                    match child.node.score(fields) {
                        Some(score) => {
                            total += score;
                            any = true;
                        }
                        None if child.required => return None,
                        None => {}
                    }
                }
                (any || has_required).then_some(total)
            }
        }
    }
}

impl Clause {
    fn score(&self, fields: &FieldMap) -> Option<f32> {
        let matched = match &self.field {
            Some(field) => fields.get(field).is_some_and(|v| self.matches(v)),
            None => fields.values().any(|v| self.matches(v)),
        };
        matched.then_some(self.boost)
    }

    fn matches(&self, value: &str) -> bool {
        let tokens = tokenize(value);
        match &self.matcher {
            Matcher::Word {
                text,
                fuzzy,
                prefix,
            } => tokens.iter().any(|token| {
                if *prefix {
                    token.starts_with(text.as_str())
                } else if let Some(similarity) = fuzzy {
                    strsim::levenshtein(token, text) <= allowed_edits(text, *similarity)
                } else {
                    token == text
                }
            }),
            Matcher::Phrase(words) => {
                !words.is_empty()
                    && tokens
                        .windows(words.len())
                        .any(|window| window == words.as_slice())
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
