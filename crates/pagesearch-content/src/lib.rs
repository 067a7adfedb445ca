//! Markup-to-text extraction for Pagesearch.
//!
//! Rendered pages arrive as full HTML documents. Before they reach the index
//! the markup is removed, configured regions (navigation, scripts, a site
//! header) are cut out entirely, entities are decoded and whitespace is
//! collapsed.
//!
//! # Modules
//!
//! - [`html`]: HTML stripping
//!   - [`html::strip`]: The configurable [`HtmlStrip`] extractor
//!   - [`html::text`]: Whitespace helpers shared with other crates
//!
//! # Example
//!
//! ```rust
//! use pagesearch_content::HtmlStrip;
//!
//! let strip = HtmlStrip::default();
//! let text = strip.text_from_html(
//!     "<html><head><title>T</title></head><body><p>Hello <b>world</b></p></body></html>",
//! );
//! assert_eq!(text, "Hello world");
//! ```

pub mod html;

pub use html::strip::HtmlStrip;
pub use html::text::normalize_whitespace;
