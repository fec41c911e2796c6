//! Domain layer containing the sync model and the reconciliation engine.
//!
//! # Architecture
//!
//! - [`entities`] - Projects, alias records, mutations
//! - [`repositories`] - Alias store trait
//! - [`catalog`] - Remote catalog trait
//! - [`reconcile`] - Pure reconciliation engine
//!
//! # Design Principles
//!
//! - Domain layer has no dependencies on infrastructure or presentation layers
//! - [`reconcile::reconcile`] performs no I/O; the orchestrator in
//!   [`crate::application::services::SyncService`] fetches, reconciles and applies
//!
//! # Sync Flow
//!
//! 1. [`catalog::RemoteCatalog::fetch`] returns the project list (or aborts the run)
//! 2. [`repositories::AliasRepository::find_all_by_source_prefix`] loads the namespace
//! 3. [`reconcile::reconcile`] computes the [`entities::ReconcilePlan`]
//! 4. Mutations are applied one by one; failures are collected, not fatal

pub mod catalog;
pub mod entities;
pub mod reconcile;
pub mod repositories;
