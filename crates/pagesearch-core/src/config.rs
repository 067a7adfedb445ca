//! Pagesearch settings.
//!
//! `SearchConfig` is loaded once by the host and passed by value (or `Arc`)
//! into the constructors that need it. Every field has a default, so an empty
//! or missing TOML file yields a working configuration.
//!
//! # Example
//!
//! ```toml
//! enabled = true
//! publish_event_rendering = true
//! default_renderer = "programmatic"
//! excluded_node_types = ["Folder", "Redirect"]
//! disable_search_property_names = ["hideFromSearch"]
//! tags_to_remove = ["head", "script", "nav"]
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Environment variable that overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "PAGESEARCH_CONFIG";

/// How pages are turned into HTML when no node-type specific renderer is
/// registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RendererKind {
    /// Render in-process through the host's template engine.
    Programmatic,
    /// Fetch the page from the public site over HTTP.
    #[default]
    Http,
}

/// Settings for indexing, rendering, and searching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Master switch for full-text enrichment and publish handlers.
    pub enabled: bool,

    /// Pre-render pages on publish; indexing then reads the HTML cache.
    pub publish_event_rendering: bool,

    /// Name of the full-text field written by the pipeline.
    pub full_text_field: String,

    /// Name of the field holding a node's ancestor path.
    pub path_field: String,

    /// Key of the search provider used for queries.
    pub search_provider: String,

    /// Key of the index targeted by rebuild and reindex.
    pub index_provider: String,

    /// Boost applied to title properties.
    pub search_title_boost: f64,

    /// Fuzziness used when a request does not supply one.
    pub search_fuzziness: f64,

    /// Host script timeout budget set before long admin operations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script_timeout_secs: Option<u64>,

    /// Node-type aliases that are never indexed.
    pub excluded_node_types: Vec<String>,

    /// Properties whose truthy value hides a node from search.
    pub disable_search_property_names: Vec<String>,

    /// Tags whose whole contents are removed before text extraction.
    pub tags_to_remove: Vec<String>,

    /// Element ids whose whole contents are removed before text extraction.
    pub ids_to_remove: Vec<String>,

    /// Renderer used when no node-type specific renderer matches.
    pub default_renderer: RendererKind,

    /// Base URL for the HTTP renderer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_url: Option<String>,

    /// Host header sent by the HTTP renderer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_host: Option<String>,

    /// HTTP renderer request timeout.
    pub http_timeout_secs: u64,

    /// Marker handed to rendered pages so templates can detect an
    /// indexing render.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_active_string_name: Option<String>,

    /// Attach every stored field to each formatted result.
    pub return_all_fields: bool,

    /// Placeholder title when no title property has a value.
    pub no_title: String,

    /// Placeholder summary when no summary property has a value.
    pub no_summary: String,

    /// Markup inserted before each highlighted match.
    pub highlight_pre_tag: String,

    /// Markup inserted after each highlighted match.
    pub highlight_post_tag: String,

    /// Summary length used when a request passes zero.
    pub summary_length: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            publish_event_rendering: false,
            full_text_field: "FullTextSearch".to_string(),
            path_field: "FullTextPath".to_string(),
            search_provider: "default".to_string(),
            index_provider: "default".to_string(),
            search_title_boost: 10.0,
            search_fuzziness: 1.0,
            script_timeout_secs: None,
            excluded_node_types: Vec::new(),
            disable_search_property_names: Vec::new(),
            tags_to_remove: vec!["head".to_string(), "script".to_string()],
            ids_to_remove: Vec::new(),
            default_renderer: RendererKind::default(),
            http_url: None,
            http_host: None,
            http_timeout_secs: 120,
            search_active_string_name: None,
            return_all_fields: false,
            no_title: "Unknown Page".to_string(),
            no_summary: "Read More".to_string(),
            highlight_pre_tag: "<strong>".to_string(),
            highlight_post_tag: "</strong>".to_string(),
            summary_length: 200,
        }
    }
}

impl SearchConfig {
    /// Project name used for the config directory.
    pub fn project_name() -> &'static str {
        "pagesearch"
    }

    /// Platform default config file path (`<config dir>/pagesearch/config.toml`).
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(Self::project_name()).join("config.toml"))
    }

    /// Resolve the config file path: explicit argument, then
    /// `PAGESEARCH_CONFIG`, then the platform default.
    pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(PathBuf::from(path));
        }
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV)
            && !path.trim().is_empty()
        {
            return Some(PathBuf::from(path));
        }
        Self::default_config_path()
    }

    /// Load configuration. A missing file yields the defaults.
    pub fn load(explicit: Option<&str>) -> Result<Self> {
        match Self::resolve_config_path(explicit) {
            Some(path) if path.exists() => Self::from_file(&path),
            Some(path) => {
                log::debug!("No config file at {}, using defaults", path.display());
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }

    /// Load and validate configuration from a specific file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io_with_path(e, path))?;
        let config = Self::from_toml_str(&content)
            .map_err(|e| Error::config(format!("Failed to parse {}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML text without validating it.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::config(e.to_string()))
    }

    /// Serialize to pretty TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }

    /// Fail fast on settings that would break at first use.
    pub fn validate(&self) -> Result<()> {
        if self.search_provider.trim().is_empty() {
            return Err(Error::config("search_provider must not be empty"));
        }
        if self.index_provider.trim().is_empty() {
            return Err(Error::config("index_provider must not be empty"));
        }
        if self.full_text_field.trim().is_empty() || self.path_field.trim().is_empty() {
            return Err(Error::config(
                "full_text_field and path_field must not be empty",
            ));
        }
        if self.default_renderer == RendererKind::Http
            && self.http_url.as_deref().is_none_or(|u| u.trim().is_empty())
            && self.enabled
        {
            return Err(Error::config(
                "http_url is required when default_renderer is \"http\"",
            ));
        }
        if self.search_title_boost <= 0.0 {
            return Err(Error::config("search_title_boost must be positive"));
        }
        Ok(())
    }

    /// Summary length to use for a request, where zero means "use the default".
    pub fn effective_summary_length(&self, requested: usize) -> usize {
        if requested == 0 {
            self.summary_length
        } else {
            requested
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
