//! Core domain entities representing the sync data model.
//!
//! # Entity Types
//!
//! - [`RemoteProject`] / [`Project`] - A page in the remote catalog, raw and validated
//! - [`AliasRecord`] - A stored path alias
//! - [`AliasSource`] - Decoded `/lndr/...` source of a namespace record
//! - [`Mutation`] / [`ReconcilePlan`] - Output of the reconciliation engine
//!
//! # Design Pattern
//!
//! As elsewhere in the crate, write inputs get their own structs:
//! [`SaveAlias`] is what the store receives, [`AliasRecord`] is what it returns.

pub mod alias;
pub mod mutation;
pub mod project;

pub use alias::{AliasRecord, AliasSource, NAMESPACE_PREFIX, RESERVED_SOURCE, SaveAlias};
pub use mutation::{
    AliasConflict, AliasOccupant, DeleteReason, Mutation, ReconcilePlan, SaveKind, SkippedProject,
    StaleAlias,
};
pub use project::{Project, ProjectId, RemoteProject, SkipReason};
