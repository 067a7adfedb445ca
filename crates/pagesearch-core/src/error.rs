//! Error types for Pagesearch.
//!
//! Every crate in the workspace returns [`Result`]. Most failures are soft:
//! the indexing pipeline logs them and moves on to the next node. Only
//! [`Error::Fatal`] is allowed to abort a batch operation.

use std::path::{Path, PathBuf};

use crate::NodeId;

/// Errors that can occur in Pagesearch.
///
/// All error variants are marked with `#[non_exhaustive]` to allow
/// adding new error types without breaking changes.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// I/O error without path context.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// I/O error tied to a specific path.
    #[error("I/O error at {path}: {source}")]
    IoWithPath {
        /// Path involved in the failed operation
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error, including unknown provider or renderer names
    #[error("Configuration error: {message}")]
    Config {
        /// What configuration is problematic
        message: String,
    },

    /// A node could not be rendered to HTML.
    #[error("Render failed for node {node_id}: {message}")]
    Render {
        /// Node that failed to render
        node_id: NodeId,
        /// What went wrong
        message: String,
    },

    /// HTML cache read or write failure.
    #[error("HTML cache error: {message}")]
    Cache {
        /// What went wrong
        message: String,
    },

    /// Index backend failure.
    #[error("Index error: {message}")]
    Index {
        /// What went wrong
        message: String,
    },

    /// A named search provider is not registered.
    #[error("Search provider not found: {name}")]
    ProviderNotFound {
        /// Provider key that was requested
        name: String,
    },

    /// Generic operation failure.
    #[error("Operation failed: {message}")]
    Operation {
        /// What went wrong
        message: String,
    },

    /// Unrecoverable process-level failure. Never swallowed.
    #[error("Fatal error: {message}")]
    Fatal {
        /// What went wrong
        message: String,
    },
}

/// Convenience `Result` type alias for Pagesearch operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns whether this error must abort the surrounding operation.
    ///
    /// Per-node work (render, extract, cache) swallows every other error.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Fatal { .. })
    }

    /// Returns whether retrying the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Io(_) | Error::IoWithPath { .. } => true,
            Error::Render { .. } => true,
            Error::Cache { .. } => true,
            Error::Index { .. } => true,
            Error::Serialization(_) => false,
            Error::Config { .. } => false,
            Error::ProviderNotFound { .. } => false,
            Error::Operation { .. } => false,
            Error::Fatal { .. } => false,
        }
    }

    /// Returns whether this is a configuration problem, including unknown
    /// provider names.
    pub fn is_config(&self) -> bool {
        matches!(self, Error::Config { .. } | Error::ProviderNotFound { .. })
    }

    /// Creates an I/O error carrying the path it occurred at.
    pub fn io_with_path(source: std::io::Error, path: impl AsRef<Path>) -> Self {
        Error::IoWithPath {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Creates a new configuration error.
    pub fn config<S: Into<String>>(message: S) -> Self {
        Error::Config {
            message: message.into(),
        }
    }

    /// Creates a new render error for a node.
    pub fn render<S: Into<String>>(node_id: NodeId, message: S) -> Self {
        Error::Render {
            node_id,
            message: message.into(),
        }
    }

    /// Creates a new HTML cache error.
    pub fn cache<S: Into<String>>(message: S) -> Self {
        Error::Cache {
            message: message.into(),
        }
    }

    /// Creates a new index backend error.
    pub fn index<S: Into<String>>(message: S) -> Self {
        Error::Index {
            message: message.into(),
        }
    }

    /// Creates a provider-not-found error.
    pub fn provider_not_found<S: Into<String>>(name: S) -> Self {
        Error::ProviderNotFound { name: name.into() }
    }

    /// Creates a new generic operation error.
    pub fn operation<S: Into<String>>(message: S) -> Self {
        Error::Operation {
            message: message.into(),
        }
    }

    /// Creates a new fatal error.
    pub fn fatal<S: Into<String>>(message: S) -> Self {
        Error::Fatal {
            message: message.into(),
        }
    }
}
