//! HTML stripping utilities.
//!
//! - [`strip`]: Tag and id aware text extraction
//! - [`text`]: Whitespace normalisation

pub mod strip;
pub mod text;

pub use strip::HtmlStrip;
pub use text::normalize_whitespace;
