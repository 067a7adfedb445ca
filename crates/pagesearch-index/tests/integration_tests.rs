//! Integration test suite for pagesearch-index.
//!
//! Drives the manager over an in-memory site: publish handlers filling the
//! HTML cache, admin verbs reindexing into `SimpleSearch`, and the search
//! façade reading the result back.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

mod common;
mod integration;
