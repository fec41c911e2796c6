//! Alias store implementations.
//!
//! # Repositories
//!
//! - [`PgAliasRepository`] - PostgreSQL `url_alias` table
//! - [`MemoryAliasRepository`] - In-process map with the same contract

pub mod memory_alias_repository;
pub mod pg_alias_repository;

pub use memory_alias_repository::MemoryAliasRepository;
pub use pg_alias_repository::PgAliasRepository;
