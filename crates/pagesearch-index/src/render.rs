//! Turning a node into the HTML a visitor would see.
//!
//! # Renderers
//!
//! - [`ProgrammaticRenderer`]: in-process, through the host's [`TemplateEngine`]
//! - [`HttpRenderer`]: fetches the page from the public site
//! - [`CachedRenderer`]: reads HTML stored earlier by a publish handler
//!
//! Renderers only fetch HTML. Whether a node should be rendered at all is
//! decided by [`Eligibility`](crate::Eligibility) before a renderer is
//! called. [`RendererRegistry`] picks a renderer by node-type alias.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pagesearch_core::{Error, NodeId, Result, SearchConfig};
use reqwest::header::{COOKIE, HOST};

use crate::cache::HtmlCache;
use crate::node::ContentNode;

/// User agent sent by [`HttpRenderer`].
pub const USER_AGENT: &str = "FullTextIndexer";

/// Query parameter carrying the node id for [`HttpRenderer`].
pub const PAGE_ID_PARAM: &str = "pageid";

/// Produces the rendered HTML of a node.
#[async_trait]
pub trait ContentRenderer: Send + Sync {
    /// Render a node. `Ok(None)` means there is no HTML to store.
    async fn render(&self, node: &ContentNode) -> Result<Option<String>>;

    /// Renderer name for diagnostics.
    fn name(&self) -> &str;
}

/// The host's in-process template engine.
#[async_trait]
pub trait TemplateEngine: Send + Sync {
    /// Execute `template_id` for `node`. `params` are exposed to the page
    /// as query values.
    async fn render_template(
        &self,
        node: &ContentNode,
        template_id: i32,
        params: &BTreeMap<String, String>,
    ) -> Result<String>;
}

/// Values handed to rendered pages so templates can tell an indexing render
/// from a visitor.
pub fn search_active_params(config: &SearchConfig) -> BTreeMap<String, String> {
    config
        .search_active_string_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| (name.to_string(), "1".to_string()))
        .into_iter()
        .collect()
}

/// Renders through the host's template engine.
pub struct ProgrammaticRenderer {
    engine: Arc<dyn TemplateEngine>,
    params: BTreeMap<String, String>,
}

impl ProgrammaticRenderer {
    /// Create a renderer over `engine`.
    pub fn new(engine: Arc<dyn TemplateEngine>, config: &SearchConfig) -> Self {
        Self {
            engine,
            params: search_active_params(config),
        }
    }
}

#[async_trait]
impl ContentRenderer for ProgrammaticRenderer {
    async fn render(&self, node: &ContentNode) -> Result<Option<String>> {
        let Some(template_id) = node.template_id.filter(|id| *id > 0) else {
            return Ok(None);
        };
        let html = self
            .engine
            .render_template(node, template_id, &self.params)
            .await?;
        Ok(Some(html))
    }

    fn name(&self) -> &str {
        "programmatic"
    }
}

impl std::fmt::Debug for ProgrammaticRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgrammaticRenderer")
            .field("params", &self.params)
            .finish()
    }
}

/// Renders by requesting the page from the public site.
#[derive(Debug)]
pub struct HttpRenderer {
    client: reqwest::Client,
    base_url: String,
    host: Option<String>,
    cookie: Option<String>,
}

impl HttpRenderer {
    /// Create a renderer from the `http_*` settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when `http_url` is not set.
    pub fn from_config(config: &SearchConfig) -> Result<Self> {
        let base_url = config
            .http_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| Error::config("http_url must be set to use the HTTP renderer"))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {e}")))?;

        let cookie = search_active_params(config)
            .into_iter()
            .map(|(name, value)| format!("{name}={value}"))
            .reduce(|a, b| format!("{a}; {b}"));

        Ok(Self {
            client,
            base_url: base_url.to_string(),
            host: config
                .http_host
                .clone()
                .filter(|host| !host.trim().is_empty()),
            cookie,
        })
    }

    /// The URL requested for a node.
    pub fn page_url(&self, id: NodeId) -> String {
        let separator = if self.base_url.contains('?') { '&' } else { '?' };
        format!("{}{separator}{PAGE_ID_PARAM}={id}", self.base_url)
    }
}

#[async_trait]
impl ContentRenderer for HttpRenderer {
    async fn render(&self, node: &ContentNode) -> Result<Option<String>> {
        let url = self.page_url(node.id);
        log::debug!("Rendering node {} from {url}", node.id);

        let mut request = self.client.get(&url);
        if let Some(host) = &self.host {
            request = request.header(HOST, host);
        }
        if let Some(cookie) = &self.cookie {
            request = request.header(COOKIE, cookie);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::render(node.id, format!("HTTP request failed: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::render(node.id, format!("HTTP status {status}")));
        }
        let html = response
            .text()
            .await
            .map_err(|e| Error::render(node.id, format!("Failed to read response: {e}")))?;
        Ok(Some(html))
    }

    fn name(&self) -> &str {
        "http"
    }
}

/// Reads HTML a publish handler stored earlier.
pub struct CachedRenderer {
    cache: Arc<dyn HtmlCache>,
}

impl CachedRenderer {
    /// Create a renderer over `cache`.
    pub fn new(cache: Arc<dyn HtmlCache>) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl ContentRenderer for CachedRenderer {
    async fn render(&self, node: &ContentNode) -> Result<Option<String>> {
        let html = self.cache.get(node.id).await?;
        if html.is_none() {
            log::debug!("No cached HTML for node {}", node.id);
        }
        Ok(html)
    }

    fn name(&self) -> &str {
        "cache"
    }
}

impl std::fmt::Debug for CachedRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedRenderer")
            .field("cache", &self.cache.name())
            .finish()
    }
}

/// Renderers keyed by node-type alias, with a default for every other type.
#[derive(Clone)]
pub struct RendererRegistry {
    default: Arc<dyn ContentRenderer>,
    by_alias: HashMap<String, Arc<dyn ContentRenderer>>,
}

impl RendererRegistry {
    /// Create a registry that resolves every alias to `default`.
    pub fn new(default: Arc<dyn ContentRenderer>) -> Self {
        Self {
            default,
            by_alias: HashMap::new(),
        }
    }

    /// Use `renderer` for nodes of type `alias`.
    pub fn register(&mut self, alias: impl Into<String>, renderer: Arc<dyn ContentRenderer>) {
        self.by_alias.insert(alias.into(), renderer);
    }

    /// The renderer for a node type.
    pub fn resolve(&self, alias: &str) -> Arc<dyn ContentRenderer> {
        self.by_alias
            .get(alias)
            .cloned()
            .unwrap_or_else(|| Arc::clone(&self.default))
    }

    /// The fallback renderer.
    pub fn default_renderer(&self) -> &Arc<dyn ContentRenderer> {
        &self.default
    }
}

impl std::fmt::Debug for RendererRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut aliases: Vec<&str> = self.by_alias.keys().map(String::as_str).collect();
        aliases.sort_unstable();
        f.debug_struct("RendererRegistry")
            .field("default", &self.default.name())
            .field("aliases", &aliases)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
