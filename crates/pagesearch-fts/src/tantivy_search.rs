//! Tantivy search provider.
//!
//! Provides `TantivySearch`, which parses query strings into a clause tree
//! and translates each clause into a Tantivy query: terms and phrases,
//! prefix clauses, fuzzy clauses with an edit distance derived from their
//! similarity, and boosts. Highlighting uses Tantivy's snippet generator.
//! This module is only available with the `fts-tantivy` feature.

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use pagesearch_core::{Error, Result};
use tantivy::collector::{Count, TopDocs};
use tantivy::query::{
    BooleanQuery, BoostQuery, EmptyQuery, FuzzyTermQuery, Occur as TantivyOccur, PhraseQuery,
    Query, TermQuery,
};
use tantivy::schema::{Field, IndexRecordOption, Value};
use tantivy::snippet::SnippetGenerator;
use tantivy::{Index, IndexReader, TantivyDocument, Term};

use crate::backend::{ResultSet, SearchHit, SearchProvider};
use crate::highlight::{HighlightOptions, Highlighter, TermHighlighter};
use crate::schema::PageSchema;
use crate::syntax::{Clause, Matcher, Node, allowed_edits, parse_query};
use crate::types::SearchWindow;

/// Builds Tantivy queries from a parsed query string.
struct QueryTranslator<'a> {
    schema: &'a PageSchema,
    /// Fields searched by clauses without a field name.
    default_fields: &'a [Field],
}

impl QueryTranslator<'_> {
    fn translate(&self, node: &Node) -> Box<dyn Query> {
        match node {
            Node::Clause(clause) => self.clause(clause),
            Node::And(children) => Box::new(BooleanQuery::new(
                children
                    .iter()
                    .map(|child| (TantivyOccur::Must, self.translate(child)))
                    .collect(),
            )),
            Node::Group(items) if items.is_empty() => Box::new(EmptyQuery),
            Node::Group(items) => Box::new(BooleanQuery::new(
                items
                    .iter()
                    .map(|item| {
                        let occur = if item.required {
                            TantivyOccur::Must
                        } else {
                            TantivyOccur::Should
                        };
                        (occur, self.translate(&item.node))
                    })
                    .collect(),
            )),
        }
    }

    fn clause(&self, clause: &Clause) -> Box<dyn Query> {
        let query: Box<dyn Query> = match clause.field.as_deref() {
            Some(name) => match self.schema.field(name) {
                Some(field) => self.field_query(field, None, clause),
                None => self.field_query(self.schema.properties, Some(name), clause),
            },
            None => {
                let mut per_field: Vec<(TantivyOccur, Box<dyn Query>)> = self
                    .default_fields
                    .iter()
                    .map(|field| (TantivyOccur::Should, self.field_query(*field, None, clause)))
                    .collect();
                match per_field.len() {
                    0 => Box::new(EmptyQuery),
                    1 => per_field.remove(0).1,
                    _ => Box::new(BooleanQuery::new(per_field)),
                }
            }
        };
        if clause.boost == 1.0 {
            query
        } else {
            Box::new(BoostQuery::new(query, clause.boost))
        }
    }

    /// Query one field, or one key of the properties object when
    /// `json_path` is set.
    fn field_query(&self, field: Field, json_path: Option<&str>, clause: &Clause) -> Box<dyn Query> {
        let term = |text: &str| match json_path {
            Some(path) => {
                let mut term = Term::from_field_json_path(field, path, false);
                term.append_type_and_str(text);
                term
            }
            None => Term::from_field_text(field, text),
        };

        if json_path.is_none() && self.schema.is_keyword(field) {
            return Box::new(TermQuery::new(
                term(clause.value.trim()),
                IndexRecordOption::Basic,
            ));
        }

        match &clause.matcher {
            Matcher::Word { text, .. } if text.is_empty() => Box::new(EmptyQuery),
            Matcher::Word {
                text, prefix: true, ..
            } => Box::new(FuzzyTermQuery::new_prefix(term(text), 0, false)),
            Matcher::Word {
                text,
                fuzzy: Some(similarity),
                ..
            } => match allowed_edits(text, *similarity) {
                0 => Box::new(TermQuery::new(term(text), IndexRecordOption::WithFreqs)),
                edits => Box::new(FuzzyTermQuery::new(term(text), edits as u8, false)),
            },
            Matcher::Word { text, .. } => {
                Box::new(TermQuery::new(term(text), IndexRecordOption::WithFreqs))
            }
            Matcher::Phrase(words) => match words.as_slice() {
                [] => Box::new(EmptyQuery),
                [word] => Box::new(TermQuery::new(term(word), IndexRecordOption::WithFreqs)),
                _ => Box::new(PhraseQuery::new(words.iter().map(|w| term(w)).collect())),
            },
        }
    }
}

/// Tantivy-based search provider.
pub struct TantivySearch {
    name: String,
    reader: IndexReader,
    schema: PageSchema,
}

impl TantivySearch {
    /// Open an existing index on disk.
    pub fn open(index_path: &Path, schema: &PageSchema, name: &str) -> Result<Self> {
        if !Self::index_exists(index_path) {
            return Err(Error::index(format!(
                "No index found at {}",
                index_path.display()
            )));
        }
        let index = Index::open_in_dir(index_path)
            .map_err(|e| Error::index(format!("Failed to open index: {e}")))?;
        Self::from_index(index, schema, name)
    }

    /// Search an already opened index, such as the one a
    /// [`TantivyIndex`](crate::TantivyIndex) writes to.
    pub fn from_index(index: Index, schema: &PageSchema, name: &str) -> Result<Self> {
        let reader = index
            .reader()
            .map_err(|e| Error::index(format!("Failed to create index reader: {e}")))?;
        Ok(Self {
            name: name.to_string(),
            reader,
            schema: schema.clone(),
        })
    }

    /// Check if an index exists at the given path.
    pub fn index_exists(index_path: &Path) -> bool {
        index_path.join("meta.json").exists()
    }

    /// Number of searchable documents.
    pub fn num_docs(&self) -> u64 {
        self.reader.searcher().num_docs()
    }

    /// Translate a query string against the given default fields.
    fn translate(&self, query: &str, default_fields: &[Field]) -> Result<Box<dyn Query>> {
        let parsed = parse_query(query)?;
        let translator = QueryTranslator {
            schema: &self.schema,
            default_fields,
        };
        Ok(translator.translate(&parsed))
    }

    fn stored_fields(&self, doc: &TantivyDocument) -> BTreeMap<String, String> {
        let mut fields: BTreeMap<String, String> = self
            .schema
            .fields()
            .into_iter()
            .filter_map(|(field, name)| {
                doc.get_first(field)
                    .and_then(|v| v.as_str())
                    .map(|value| (name.to_string(), value.to_string()))
            })
            .collect();
        if let Some(properties) = doc
            .get_first(self.schema.properties)
            .and_then(|v| v.as_object())
        {
            for (name, value) in properties {
                if let Some(text) = value.as_str() {
                    fields
                        .entry(name.to_string())
                        .or_insert_with(|| text.to_string());
                }
            }
        }
        fields
    }

    fn snippet_highlighter(
        &self,
        field: Field,
        query: &dyn Query,
        options: &HighlightOptions,
    ) -> Result<TantivyHighlighter> {
        let searcher = self.reader.searcher();
        let mut generator = SnippetGenerator::create(&searcher, query, field)
            .map_err(|e| Error::index(format!("Failed to create snippet generator: {e}")))?;
        generator.set_max_num_chars(options.fragment_size);
        Ok(TantivyHighlighter {
            generator,
            options: options.clone(),
        })
    }
}

#[async_trait]
impl SearchProvider for TantivySearch {
    async fn search(&self, query: &str, window: SearchWindow) -> Result<ResultSet> {
        self.reader
            .reload()
            .map_err(|e| Error::index(format!("Failed to reload index reader: {e}")))?;

        let parsed = self.translate(query, &self.schema.default_search_fields())?;

        let searcher = self.reader.searcher();
        let total = searcher
            .search(&*parsed, &Count)
            .map_err(|e| Error::index(format!("Search failed: {e}")))?;
        if total == 0 || window.offset >= total {
            return Ok(ResultSet {
                total,
                offset: window.offset,
                hits: Vec::new(),
                provider: self.name.clone(),
            });
        }

        let limit = window
            .limit
            .unwrap_or(total - window.offset)
            .clamp(1, total - window.offset);
        let top_docs = searcher
            .search(
                &*parsed,
                &TopDocs::with_limit(limit)
                    .and_offset(window.offset)
                    .order_by_score(),
            )
            .map_err(|e| Error::index(format!("Search failed: {e}")))?;

        let mut hits = Vec::with_capacity(top_docs.len());
        for (score, address) in top_docs {
            let doc: TantivyDocument = searcher
                .doc(address)
                .map_err(|e| Error::index(format!("Failed to load document: {e}")))?;
            let fields = self.stored_fields(&doc);
            hits.push(SearchHit {
                id: fields.get(pagesearch_core::ID_FIELD).cloned().unwrap_or_default(),
                score,
                fields,
            });
        }

        log::debug!("TantivySearch '{}': {total} matches", self.name);

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

    fn highlighter(
        &self,
        field: &str,
        query: &str,
        options: &HighlightOptions,
    ) -> Result<Box<dyn Highlighter>> {
        let fallback = || -> Box<dyn Highlighter> {
            Box::new(TermHighlighter::from_query(query, options.clone()))
        };
        let Some(field) = self.schema.field(field) else {
            return Ok(fallback());
        };
        match self.translate(query, &[field]) {
            Ok(parsed) => Ok(Box::new(self.snippet_highlighter(field, &*parsed, options)?)),
            Err(e) => {
                log::debug!("Highlighting '{query}' by terms: {e}");
                Ok(fallback())
            }
        }
    }
}

impl std::fmt::Debug for TantivySearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TantivySearch")
            .field("name", &self.name)
            .field("schema", &self.schema)
            .finish()
    }
}

/// Highlighter backed by Tantivy's snippet generator.
pub struct TantivyHighlighter {
    generator: SnippetGenerator,
    options: HighlightOptions,
}

impl Highlighter for TantivyHighlighter {
    fn best_fragment(&self, text: &str) -> Option<String> {
        let snippet = self.generator.snippet(text);
        let highlighted = snippet.highlighted();
        if highlighted.is_empty() {
            return None;
        }

        let fragment = snippet.fragment();
        let mut out = String::with_capacity(fragment.len() + highlighted.len() * 16);
        let mut cursor = 0;
        for range in highlighted {
            out.push_str(&fragment[cursor..range.start]);
            out.push_str(&self.options.pre_tag);
            out.push_str(&fragment[range.start..range.end]);
            out.push_str(&self.options.post_tag);
            cursor = range.end;
        }
        out.push_str(&fragment[cursor..]);
        Some(out.trim().to_string())
    }
}

// ============================================================================
// Tests
// ============================================================================
