//! Remote catalog clients.

pub mod http_catalog;

pub use http_catalog::{HttpCatalog, parse_catalog_body};
