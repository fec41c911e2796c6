//! In-process alias repository.

use async_trait::async_trait;
use serde_json::json;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use crate::domain::entities::{AliasRecord, SaveAlias};
use crate::domain::repositories::AliasRepository;
use crate::error::AppError;

#[derive(Default)]
struct Table {
    rows: BTreeMap<i64, AliasRecord>,
    next_pid: i64,
}

impl Table {
    fn holder_of(&self, alias: &str) -> Option<&AliasRecord> {
        self.rows.values().find(|r| r.alias == alias)
    }
}

/// Alias store kept in memory, with the same uniqueness rules as the
/// PostgreSQL table. Used by tests.
#[derive(Default)]
pub struct MemoryAliasRepository {
    table: RwLock<Table>,
}

impl MemoryAliasRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store; later inserts get pids above the highest seeded one.
    pub fn with_records(records: impl IntoIterator<Item = AliasRecord>) -> Self {
        let rows: BTreeMap<i64, AliasRecord> = records.into_iter().map(|r| (r.pid, r)).collect();
        let next_pid = rows.keys().next_back().copied().unwrap_or(0);
        Self {
            table: RwLock::new(Table { rows, next_pid }),
        }
    }

    /// All records ordered by pid.
    pub async fn snapshot(&self) -> Vec<AliasRecord> {
        self.table.read().await.rows.values().cloned().collect()
    }
}

fn alias_taken(alias: &str) -> AppError {
    AppError::conflict(
        "Unique constraint violation",
        json!({ "constraint": "url_alias_alias_key", "alias": alias }),
    )
}

#[async_trait]
impl AliasRepository for MemoryAliasRepository {
    async fn find_by_alias(&self, alias: &str) -> Result<Option<AliasRecord>, AppError> {
        Ok(self.table.read().await.holder_of(alias).cloned())
    }

    async fn find_by_source(&self, source: &str) -> Result<Option<AliasRecord>, AppError> {
        let table = self.table.read().await;
        Ok(table.rows.values().find(|r| r.source == source).cloned())
    }

    async fn find_all_by_source_prefix(
        &self,
        prefix: &str,
    ) -> Result<Vec<AliasRecord>, AppError> {
        let table = self.table.read().await;
        Ok(table
            .rows
            .values()
            .filter(|r| r.source.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn find_all_by_aliases(&self, aliases: &[String]) -> Result<Vec<AliasRecord>, AppError> {
        let table = self.table.read().await;
        Ok(table
            .rows
            .values()
            .filter(|r| aliases.contains(&r.alias))
            .cloned()
            .collect())
    }

    async fn save(&self, record: SaveAlias) -> Result<i64, AppError> {
        let mut table = self.table.write().await;

        if let Some(holder) = table.holder_of(&record.alias) {
            if Some(holder.pid) != record.pid {
                return Err(alias_taken(&record.alias));
            }
        }

        let pid = match record.pid {
            Some(pid) => {
                if !table.rows.contains_key(&pid) {
                    return Err(AppError::not_found("Alias not found", json!({ "pid": pid })));
                }
                pid
            }
            None => {
                table.next_pid += 1;
                table.next_pid
            }
        };

        table
            .rows
            .insert(pid, AliasRecord::new(pid, record.source, record.alias));
        Ok(pid)
    }

    async fn delete(&self, pid: i64) -> Result<(), AppError> {
        self.table.write().await.rows.remove(&pid);
        Ok(())
    }
}
