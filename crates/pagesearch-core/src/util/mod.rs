//! Utility modules.

pub mod ids;
