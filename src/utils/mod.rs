//! Utility functions shared across layers.
//!
//! - [`alias_path`] - Alias path validation and redirect sanitisation

pub mod alias_path;
