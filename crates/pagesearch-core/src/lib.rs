//! Pagesearch Core: shared types, traits, errors, and configuration.
//!
//! This crate provides the foundational types used across all Pagesearch
//! crates. It has no internal Pagesearch dependencies (dependency level 0).
//!
//! # Modules
//!
//! - [`error`]: Error types and Result alias
//! - [`config`]: The settings file and its defaults
//! - [`traits`]: Index-side seams shared by the pipeline and backends
//! - [`util`]: Field-name utilities

#![doc = include_str!("../README.md")]

pub mod config;
pub mod error;
pub mod traits;
pub mod util;

// Re-export key types at crate root for convenience
pub use config::{RendererKind, SearchConfig};
pub use error::{Error, Result};
pub use traits::{
    DocumentIndex, FieldMap, ID_FIELD, INDEX_TYPE_FIELD, NODE_NAME_FIELD, NODE_TYPE_ALIAS_FIELD,
};
pub use util::ids::safe_alias;

/// Identifier of a content node in the host CMS.
///
/// The CMS uses `-1` as the virtual root; real nodes are positive.
pub type NodeId = i32;

/// Sentinel id of the virtual root node.
pub const ROOT_NODE_ID: NodeId = -1;
