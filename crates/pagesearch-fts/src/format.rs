//! Paging and shaping of search results.
//!
//! [`ResultFormatter`] turns a provider's [`ResultSet`] into a
//! [`SearchOutput`]: either a typed error a template can branch on
//! (`NoTerms`, `NoResults`, `NoPage`) or one page of records plus summary
//! metadata. The output renders as XML for templates and serializes as JSON
//! for everything else.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::backend::ResultSet;
use crate::summary::Summarizer;
use crate::types::SearchWindow;

/// Field alias carrying the computed title.
pub const TITLE_ALIAS: &str = "FullTextTitle";

/// Field alias carrying the computed summary.
pub const SUMMARY_ALIAS: &str = "FullTextSummary";

/// User-facing conditions reported instead of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchErrorKind {
    /// The search term was empty.
    NoTerms,
    /// The query matched nothing.
    NoResults,
    /// The requested page is past the last result.
    NoPage,
}

impl SearchErrorKind {
    /// Code used in the XML `type` attribute.
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchErrorKind::NoTerms => "NoTerms",
            SearchErrorKind::NoResults => "NoResults",
            SearchErrorKind::NoPage => "NoPage",
        }
    }
}

impl std::fmt::Display for SearchErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ranked hit as presented to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResultRecord {
    /// Document id.
    pub id: String,

    /// Provider relevance score.
    pub score: f32,

    /// 1-based position across the whole result set.
    pub number: usize,

    /// Stored fields; kept in the output only when configured.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, String>,

    /// Computed (optionally highlighted) title.
    pub title: String,

    /// Computed (optionally highlighted) summary.
    pub summary: String,
}

/// Totals and position of the returned page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSummary {
    /// Total matching documents.
    pub num_results: usize,
    /// Total pages at the requested page length.
    pub num_pages: usize,
    /// Wall-clock seconds for the whole search, rounded to milliseconds.
    pub time_taken: f64,
    /// 1-based number of the first record on this page.
    pub first_result: usize,
    /// 1-based number of the last record on this page.
    pub last_result: usize,
}

/// Outcome of a search as handed to templates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SearchOutput {
    /// A user-facing condition instead of results.
    Error {
        /// Condition code.
        error_type: SearchErrorKind,
        /// Human-readable text.
        message: String,
    },
    /// One page of results.
    Results {
        /// Records on this page, in rank order.
        nodes: Vec<SearchResultRecord>,
        /// Totals and page position.
        summary: ResultSummary,
    },
}

impl SearchOutput {
    /// "You must enter a search term".
    pub fn no_terms() -> Self {
        Self::error(SearchErrorKind::NoTerms, "You must enter a search term")
    }

    /// "Your search returned no results".
    pub fn no_results() -> Self {
        Self::error(SearchErrorKind::NoResults, "Your search returned no results")
    }

    /// "Pagination incorrectly set up, no results on page N".
    pub fn no_page(page_number: usize) -> Self {
        Self::error(
            SearchErrorKind::NoPage,
            format!("Pagination incorrectly set up, no results on page {page_number}"),
        )
    }

    fn error(error_type: SearchErrorKind, message: impl Into<String>) -> Self {
        SearchOutput::Error {
            error_type,
            message: message.into(),
        }
    }

    /// The error kind, if this is an error document.
    pub fn error_kind(&self) -> Option<SearchErrorKind> {
        match self {
            SearchOutput::Error { error_type, .. } => Some(*error_type),
            SearchOutput::Results { .. } => None,
        }
    }

    /// Records on the page; empty for error documents.
    pub fn nodes(&self) -> &[SearchResultRecord] {
        match self {
            SearchOutput::Results { nodes, .. } => nodes,
            SearchOutput::Error { .. } => &[],
        }
    }

    /// Summary metadata, if this is a results document.
    pub fn summary(&self) -> Option<&ResultSummary> {
        match self {
            SearchOutput::Results { summary, .. } => Some(summary),
            SearchOutput::Error { .. } => None,
        }
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> pagesearch_core::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Render the XML document templates consume.
    ///
    /// Errors become `<error type="...">`; results become a `<results>`
    /// element holding one `<node>` per record and a `<summary>` element.
    pub fn to_xml(&self) -> String {
        let mut xml = String::new();
        match self {
            SearchOutput::Error {
                error_type,
                message,
            } => {
                xml.push_str(&format!(
                    "<error type=\"{}\">{}</error>",
                    error_type.as_str(),
                    cdata(message)
                ));
            }
            SearchOutput::Results { nodes, summary } => {
                xml.push_str("<results><nodes>");
                for node in nodes {
                    xml.push_str(&format!(
                        "<node id=\"{}\" score=\"{}\" number=\"{}\">",
                        xml_escape(&node.id),
                        node.score,
                        node.number
                    ));
                    for (alias, value) in &node.fields {
                        push_data(&mut xml, alias, value);
                    }
                    push_data(&mut xml, TITLE_ALIAS, &node.title);
                    push_data(&mut xml, SUMMARY_ALIAS, &node.summary);
                    xml.push_str("</node>");
                }
                xml.push_str(&format!(
                    "</nodes><summary numResults=\"{}\" numPages=\"{}\" timeTaken=\"{}\" \
                     firstResult=\"{}\" lastResult=\"{}\" /></results>",
                    summary.num_results,
                    summary.num_pages,
                    summary.time_taken,
                    summary.first_result,
                    summary.last_result
                ));
            }
        }
        xml
    }
}

fn push_data(xml: &mut String, alias: &str, value: &str) {
    xml.push_str(&format!(
        "<data alias=\"{}\">{}</data>",
        xml_escape(alias),
        cdata(value)
    ));
}

/// Escape the five XML special characters for attribute values.
fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Wrap text in CDATA, splitting any `]]>` it contains.
fn cdata(s: &str) -> String {
    format!("<![CDATA[{}]]>", s.replace("]]>", "]]]]><![CDATA[>"))
}

/// Requested page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Paging {
    /// 1-based page number; 0 and 1 both mean the first page.
    pub page_number: usize,
    /// Results per page; 0 disables paging.
    pub page_length: usize,
}

impl Paging {
    /// Create a paging request.
    pub fn new(page_number: usize, page_length: usize) -> Self {
        Self {
            page_number,
            page_length,
        }
    }

    /// Results skipped before this page.
    pub fn skip(&self) -> usize {
        if self.page_length > 0 && self.page_number > 1 {
            (self.page_number - 1).saturating_mul(self.page_length)
        } else {
            0
        }
    }

    /// Provider window covering this page.
    pub fn window(&self) -> SearchWindow {
        SearchWindow {
            offset: self.skip(),
            limit: (self.page_length > 0).then_some(self.page_length),
        }
    }

    /// Total pages for `total` results.
    pub fn num_pages(&self, total: usize) -> usize {
        if self.page_length == 0 {
            1
        } else {
            total.div_ceil(self.page_length)
        }
    }

    /// Number of the last result on this page.
    pub fn last_result(&self, total: usize) -> usize {
        if self.page_length == 0 {
            total
        } else {
            self.skip().saturating_add(self.page_length).min(total)
        }
    }
}

/// A record about to be emitted, with its position.
#[derive(Debug)]
pub struct ResultOutput<'a> {
    /// The record; title and summary are computed after the hook runs.
    pub record: &'a mut SearchResultRecord,
    /// Requested page number.
    pub page_number: usize,
    /// 1-based position across the whole result set.
    pub result_number: usize,
    /// 1-based position on this page.
    pub number_on_page: usize,
}

/// Hook run once per emitted record; may inspect or change it.
pub trait ResultObserver: Send + Sync {
    /// Called before the record's title and summary are computed.
    fn on_result(&self, output: &mut ResultOutput<'_>);
}

impl<F> ResultObserver for F
where
    F: Fn(&mut ResultOutput<'_>) + Send + Sync,
{
    fn on_result(&self, output: &mut ResultOutput<'_>) {
        self(output)
    }
}

/// Builds [`SearchOutput`] documents from provider results.
#[derive(Clone, Default)]
pub struct ResultFormatter {
    return_all_fields: bool,
    observer: Option<Arc<dyn ResultObserver>>,
}

impl ResultFormatter {
    /// Create a formatter.
    pub fn new(return_all_fields: bool) -> Self {
        Self {
            return_all_fields,
            observer: None,
        }
    }

    /// Install the per-record hook.
    pub fn with_observer(mut self, observer: Arc<dyn ResultObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Page, summarize and shape `results`.
    ///
    /// `started` marks the beginning of the whole search so the reported time
    /// covers query building and execution as well as formatting.
    pub fn format(
        &self,
        results: &ResultSet,
        summarizer: &mut dyn Summarizer,
        paging: Paging,
        started: Instant,
    ) -> SearchOutput {
        if results.total == 0 {
            return SearchOutput::no_results();
        }

        let skip = paging.skip();
        let page = results.window(paging.window());
        if page.is_empty() {
            return SearchOutput::no_page(paging.page_number);
        }

        let mut nodes = Vec::with_capacity(page.len());
        for (i, hit) in page.iter().enumerate() {
            let mut record = SearchResultRecord {
                id: hit.id.clone(),
                score: hit.score,
                number: skip + i + 1,
                fields: hit.fields.clone(),
                title: String::new(),
                summary: String::new(),
            };

            if let Some(observer) = &self.observer {
                let result_number = record.number;
                observer.on_result(&mut ResultOutput {
                    record: &mut record,
                    page_number: paging.page_number,
                    result_number,
                    number_on_page: i + 1,
                });
            }

            record.title = summarizer.title(&record.fields);
            record.summary = summarizer.summary(&record.fields);
            if !self.return_all_fields {
                record.fields.clear();
            }
            nodes.push(record);
        }

        let elapsed = started.elapsed().as_secs_f64();
        let summary = ResultSummary {
            num_results: results.total,
            num_pages: paging.num_pages(results.total),
            time_taken: (elapsed * 1000.0).round() / 1000.0,
            first_result: skip + 1,
            last_result: paging.last_result(results.total),
        };

        SearchOutput::Results { nodes, summary }
    }
}

impl std::fmt::Debug for ResultFormatter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultFormatter")
            .field("return_all_fields", &self.return_all_fields)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
