//! Application layer services implementing business logic.
//!
//! This layer orchestrates domain operations: it fetches the catalog, runs
//! the pure reconciliation engine and applies the resulting mutations.
//! Services consume the domain traits and provide a clean API for HTTP
//! handlers and the admin CLI.
//!
//! # Available Services
//!
//! - [`services::sync_service::SyncService`] - Catalog sync runs and dry-run plans
//! - [`services::alias_service::AliasService`] - Reservations and namespace listings
//! - [`services::auth_service::AuthService`] - Admin token authentication
//!
//! [`scheduler::run_sync_scheduler`] drives scheduled runs.

pub mod scheduler;
pub mod services;
