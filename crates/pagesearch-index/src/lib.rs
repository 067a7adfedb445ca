//! Rendering, caching and indexing of CMS pages for Pagesearch.
//!
//! This crate decides which pages enter the full-text index and what text
//! they carry. It depends on the host only through three seams: a
//! [`ContentTree`] to walk, [`ContentRenderer`]s that produce HTML, and a
//! [`DocumentIndex`](pagesearch_core::DocumentIndex) to write to.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     pagesearch-index                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Manager (wires everything from SearchConfig)               │
//! │  AdminActions (rebuild, reindex, render-to-cache)           │
//! │  PublishHandlers (publish / unpublish / trash / delete)     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  IndexingPipeline (eligibility → HTML → text → fields)      │
//! │  PreRenderer (render → HtmlCache)                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ContentRenderer: Programmatic, Http, Cached                │
//! │  HtmlCache: MemoryHtmlCache, RedbHtmlCache                  │
//! │  ContentTree: MemoryContentTree                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod admin;
pub mod cache;
pub mod eligibility;
pub mod manager;
pub mod node;
pub mod pipeline;
pub mod prerender;
pub mod publish;
pub mod render;
pub mod timeout;
pub mod tree;

pub use admin::{AdminActions, RenderReport};
pub use cache::{HtmlCache, MemoryHtmlCache, RedbHtmlCache};
pub use eligibility::{Eligibility, Rejection, is_truthy};
pub use manager::{Manager, ManagerBuilder};
pub use node::{CONTENT_INDEX_TYPE, ContentNode};
pub use pipeline::{IndexReport, IndexingPipeline, NodeOutcome};
pub use prerender::PreRenderer;
pub use publish::{ContentEvent, ContentEvents, PublishHandlers};
pub use render::{
    CachedRenderer, ContentRenderer, HttpRenderer, ProgrammaticRenderer, RendererRegistry,
    TemplateEngine, search_active_params,
};
pub use timeout::ScriptTimeout;
pub use tree::{ContentTree, MemoryContentTree};
