//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer.
//!
//! # Modules
//!
//! - [`catalog`] - HTTP client for the remote page catalog
//! - [`persistence`] - Alias store implementations

pub mod catalog;
pub mod persistence;
