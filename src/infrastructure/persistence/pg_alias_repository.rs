//! PostgreSQL implementation of the alias repository.

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use std::sync::Arc;

use crate::domain::entities::{AliasRecord, SaveAlias};
use crate::domain::repositories::AliasRepository;
use crate::error::AppError;
use serde_json::json;

/// PostgreSQL repository over the shared `url_alias` table.
///
/// Alias uniqueness is enforced by the `url_alias_alias_key` constraint, so
/// a conflicting save surfaces as [`AppError::Conflict`].
pub struct PgAliasRepository {
    pool: Arc<PgPool>,
}

impl PgAliasRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct AliasRow {
    pid: i64,
    source: String,
    alias: String,
}

impl From<AliasRow> for AliasRecord {
    fn from(row: AliasRow) -> Self {
        AliasRecord::new(row.pid, row.source, row.alias)
    }
}

/// Escapes `LIKE` wildcards so the prefix is matched literally.
fn escape_like(prefix: &str) -> String {
    let mut escaped = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[async_trait]
impl AliasRepository for PgAliasRepository {
    async fn find_by_alias(&self, alias: &str) -> Result<Option<AliasRecord>, AppError> {
        let row = sqlx::query_as::<_, AliasRow>(
            r#"
            SELECT pid, source, alias
            FROM url_alias
            WHERE alias = $1
            "#,
        )
        .bind(alias)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(AliasRecord::from))
    }

    async fn find_by_source(&self, source: &str) -> Result<Option<AliasRecord>, AppError> {
        let row = sqlx::query_as::<_, AliasRow>(
            r#"
            SELECT pid, source, alias
            FROM url_alias
            WHERE source = $1
            ORDER BY pid
            LIMIT 1
            "#,
        )
        .bind(source)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(AliasRecord::from))
    }

    async fn find_all_by_source_prefix(
        &self,
        prefix: &str,
    ) -> Result<Vec<AliasRecord>, AppError> {
        let rows = sqlx::query_as::<_, AliasRow>(
            r#"
            SELECT pid, source, alias
            FROM url_alias
            WHERE source LIKE $1 ESCAPE '\'
            ORDER BY pid
            "#,
        )
        .bind(escape_like(prefix))
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows.into_iter().map(AliasRecord::from).collect())
    }

    async fn find_all_by_aliases(&self, aliases: &[String]) -> Result<Vec<AliasRecord>, AppError> {
        let rows = sqlx::query_as::<_, AliasRow>(
            r#"
            SELECT pid, source, alias
            FROM url_alias
            WHERE alias = ANY($1)
            ORDER BY pid
            "#,
        )
        .bind(aliases.to_vec())
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows.into_iter().map(AliasRecord::from).collect())
    }

    async fn save(&self, record: SaveAlias) -> Result<i64, AppError> {
        match record.pid {
            None => {
                let pid: i64 = sqlx::query_scalar(
                    r#"
                    INSERT INTO url_alias (source, alias)
                    VALUES ($1, $2)
                    RETURNING pid
                    "#,
                )
                .bind(&record.source)
                .bind(&record.alias)
                .fetch_one(self.pool.as_ref())
                .await?;

                Ok(pid)
            }
            Some(pid) => {
                let updated: Option<i64> = sqlx::query_scalar(
                    r#"
                    UPDATE url_alias
                    SET source = $2, alias = $3
                    WHERE pid = $1
                    RETURNING pid
                    "#,
                )
                .bind(pid)
                .bind(&record.source)
                .bind(&record.alias)
                .fetch_optional(self.pool.as_ref())
                .await?;

                updated.ok_or_else(|| AppError::not_found("Alias not found", json!({ "pid": pid })))
            }
        }
    }

    async fn delete(&self, pid: i64) -> Result<(), AppError> {
        sqlx::query("DELETE FROM url_alias WHERE pid = $1")
            .bind(pid)
            .execute(self.pool.as_ref())
            .await?;

        Ok(())
    }
}
