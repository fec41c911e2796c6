//! DTOs for sync endpoints.

use serde::{Deserialize, Serialize};

use crate::domain::entities::{
    AliasConflict, Mutation, ReconcilePlan, SkippedProject, StaleAlias,
};

/// Query for `GET /sync`.
#[derive(Debug, Deserialize)]
pub struct ReservationSyncQuery {
    /// Alias the visitor was waiting on.
    pub path: Option<String>,
}

/// Dry-run result for `GET /api/sync/plan`.
#[derive(Debug, Serialize)]
pub struct PlanResponse {
    pub owned_domain: String,
    pub save_count: usize,
    pub delete_count: usize,
    pub mutations: Vec<PlannedMutation>,
    pub skipped: Vec<SkippedProject>,
    pub conflicts: Vec<AliasConflict>,
    pub stale: Vec<StaleAlias>,
}

/// A planned mutation with its human-readable summary.
#[derive(Debug, Serialize)]
pub struct PlannedMutation {
    pub summary: String,
    #[serde(flatten)]
    pub mutation: Mutation,
}

impl PlanResponse {
    pub fn new(owned_domain: impl Into<String>, plan: ReconcilePlan) -> Self {
        Self {
            owned_domain: owned_domain.into(),
            save_count: plan.save_count(),
            delete_count: plan.delete_count(),
            mutations: plan
                .mutations
                .into_iter()
                .map(|mutation| PlannedMutation {
                    summary: mutation.to_string(),
                    mutation,
                })
                .collect(),
            skipped: plan.skipped,
            conflicts: plan.conflicts,
            stale: plan.stale,
        }
    }
}
