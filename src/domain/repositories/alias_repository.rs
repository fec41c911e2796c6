//! Repository trait for path alias storage.

use crate::domain::entities::{AliasRecord, SaveAlias};
use crate::error::AppError;
use async_trait::async_trait;

/// Repository interface for the path alias table.
///
/// The table is shared with other alias owners; the sync only ever touches
/// records whose `source` starts with `/lndr/`. Every operation is keyed and
/// idempotent at the store level, and aliases are globally unique.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgAliasRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::persistence::MemoryAliasRepository`] - In-process implementation
/// - Test mocks available with `cfg(test)`
///
/// # Examples
///
/// See integration tests: `tests/repository_alias.rs`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AliasRepository: Send + Sync {
    /// Finds the record holding `alias`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn find_by_alias(&self, alias: &str) -> Result<Option<AliasRecord>, AppError>;

    /// Finds the first record (lowest pid) with the given `source`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn find_by_source(&self, source: &str) -> Result<Option<AliasRecord>, AppError>;

    /// Returns every record whose `source` starts with `prefix`, ordered by pid.
    ///
    /// Always a full scan of the prefix; there is no paging.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn find_all_by_source_prefix(&self, prefix: &str)
    -> Result<Vec<AliasRecord>, AppError>;

    /// Returns the records holding any of `aliases`, whatever their source,
    /// ordered by pid.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn find_all_by_aliases(&self, aliases: &[String]) -> Result<Vec<AliasRecord>, AppError>;

    /// Inserts (`pid: None`) or updates in place (`pid: Some`) and returns the pid.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if another record already holds the alias.
    /// Returns [`AppError::NotFound`] if `pid` does not exist.
    /// Returns [`AppError::Internal`] on storage errors.
    async fn save(&self, record: SaveAlias) -> Result<i64, AppError>;

    /// Deletes a record. Deleting a missing pid succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn delete(&self, pid: i64) -> Result<(), AppError>;
}
