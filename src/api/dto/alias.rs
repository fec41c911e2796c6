//! DTOs for alias endpoints.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::entities::{AliasRecord, AliasSource};

/// Request to reserve an alias for a page that has not synced yet.
#[derive(Debug, Deserialize, Validate)]
pub struct ReserveRequest {
    /// Root-relative path, e.g. `/spring-campaign`.
    #[validate(length(min = 2, max = 255, message = "Alias must be 2-255 characters"))]
    pub alias: String,
}

/// Response for `POST /api/reservations`.
#[derive(Debug, Serialize)]
pub struct ReserveResponse {
    pub pid: i64,
    pub alias: String,
    pub source: String,
}

/// A namespace record.
#[derive(Debug, Serialize)]
pub struct AliasItem {
    pub pid: i64,
    pub alias: String,
    pub source: String,
    /// Remote project the alias resolves to; `None` for placeholders.
    pub project_id: Option<String>,
    pub placeholder: bool,
}

impl AliasItem {
    pub fn new(record: AliasRecord, source: &AliasSource) -> Self {
        Self {
            pid: record.pid,
            alias: record.alias,
            source: record.source,
            project_id: source.project_id().map(|id| id.to_string()),
            placeholder: source.is_reserved(),
        }
    }
}

/// Response for `GET /api/aliases`.
#[derive(Debug, Serialize)]
pub struct AliasListResponse {
    pub total: usize,
    pub placeholders: usize,
    pub items: Vec<AliasItem>,
}
