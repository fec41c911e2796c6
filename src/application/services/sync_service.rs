//! Sync orchestration: fetch the catalog, reconcile, apply.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use metrics::counter;
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{error, info, warn};

use crate::domain::catalog::RemoteCatalog;
use crate::domain::entities::{Mutation, NAMESPACE_PREFIX, ReconcilePlan, SaveAlias};
use crate::domain::reconcile::{
    claimed_paths, is_reservation_resolved, normalize_domain, reconcile,
};
use crate::domain::repositories::AliasRepository;
use crate::error::AppError;

/// What started a sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncTrigger {
    /// Admin API call.
    Manual,
    /// Background interval.
    Scheduled,
    /// Visitor landing on a reserved alias.
    Reservation,
    /// `admin sync` command.
    Cli,
}

impl fmt::Display for SyncTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Manual => "manual",
            Self::Scheduled => "scheduled",
            Self::Reservation => "reservation",
            Self::Cli => "cli",
        };
        f.write_str(name)
    }
}

/// Outcome of one sync run.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub trigger: SyncTrigger,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// `true` when the run completed without a single failed mutation.
    pub success: bool,
    pub applied_count: usize,
    pub skipped_count: usize,
    pub conflict_count: usize,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// Set when the alias a caller waited on now points at a live page.
    pub reservation_resolved_alias: Option<String>,
}

impl SyncReport {
    fn aborted(trigger: SyncTrigger, started_at: DateTime<Utc>, reason: String) -> Self {
        Self {
            trigger,
            started_at,
            finished_at: Utc::now(),
            success: false,
            applied_count: 0,
            skipped_count: 0,
            conflict_count: 0,
            errors: vec![reason],
            warnings: Vec::new(),
            reservation_resolved_alias: None,
        }
    }
}

/// Runs reconciliation against the alias store.
///
/// Only one run executes at a time per service instance; concurrent callers
/// queue on an internal mutex and each gets its own report.
///
/// # Failure Model
///
/// - Catalog fetch failure aborts the run before the store is touched
/// - A failed save or delete is recorded in the report and the run continues
/// - Conflicts and skipped catalog entries become report warnings
pub struct SyncService<C: RemoteCatalog + ?Sized, S: AliasRepository + ?Sized> {
    catalog: Arc<C>,
    repository: Arc<S>,
    owned_domain: String,
    run_lock: Mutex<()>,
    last_report: RwLock<Option<SyncReport>>,
}

impl<C: RemoteCatalog + ?Sized, S: AliasRepository + ?Sized> SyncService<C, S> {
    /// Creates a new sync service.
    ///
    /// # Arguments
    ///
    /// - `catalog` - remote page catalog
    /// - `repository` - alias store
    /// - `owned_domain` - base URL whose paths this service manages
    pub fn new(catalog: Arc<C>, repository: Arc<S>, owned_domain: impl Into<String>) -> Self {
        let owned_domain = owned_domain.into();
        Self {
            catalog,
            repository,
            owned_domain: normalize_domain(&owned_domain).to_string(),
            run_lock: Mutex::new(()),
            last_report: RwLock::new(None),
        }
    }

    pub fn owned_domain(&self) -> &str {
        &self.owned_domain
    }

    /// Report of the most recent run, aborted runs included.
    pub async fn last_report(&self) -> Option<SyncReport> {
        self.last_report.read().await.clone()
    }

    /// Runs a full sync.
    ///
    /// When `reserved_path` is given, the report's `reservation_resolved_alias`
    /// is set if that alias resolves to a live page after the run.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Upstream`] if the catalog fetch fails.
    /// Returns [`AppError::Internal`] if the namespace cannot be loaded.
    /// Individual mutation failures are reported, not returned.
    pub async fn run(
        &self,
        trigger: SyncTrigger,
        reserved_path: Option<&str>,
    ) -> Result<SyncReport, AppError> {
        let _guard = self.run_lock.lock().await;
        let started_at = Utc::now();
        info!(%trigger, domain = %self.owned_domain, "Sync started");

        let plan = match self.compute_plan().await {
            Ok(plan) => plan,
            Err(e) => {
                error!(%trigger, error = %e, "Sync aborted");
                counter!("lndr_sync_runs_total", "outcome" => "aborted").increment(1);
                self.remember(SyncReport::aborted(trigger, started_at, e.to_string()))
                    .await;
                return Err(e);
            }
        };

        let mut warnings: Vec<String> = plan
            .skipped
            .iter()
            .map(|s| match &s.id {
                Some(id) => format!("catalog entry #{} (id {id}) skipped: {}", s.index, s.reason),
                None => format!("catalog entry #{} skipped: {}", s.index, s.reason),
            })
            .collect();
        for conflict in &plan.conflicts {
            warn!(
                alias = %conflict.alias,
                occupant = %conflict.occupant,
                claimant = %conflict.claimant,
                "Alias conflict left for manual review"
            );
            warnings.push(conflict.to_string());
        }
        for stale in &plan.stale {
            warn!(
                pid = stale.pid,
                alias = %stale.alias,
                project = %stale.project_id,
                current = %stale.current_alias,
                "Stale alias left for manual review"
            );
            warnings.push(stale.to_string());
        }
        counter!("lndr_sync_conflicts_total").increment(plan.conflicts.len() as u64);

        let mut applied_count = 0;
        let mut errors = Vec::new();
        for mutation in &plan.mutations {
            match self.apply(mutation).await {
                Ok(()) => {
                    info!(%mutation, "Alias mutation applied");
                    counter!("lndr_alias_mutations_total", "kind" => mutation.kind_label())
                        .increment(1);
                    applied_count += 1;
                }
                Err(e) => {
                    warn!(%mutation, error = %e, "Alias mutation failed");
                    errors.push(format!("{mutation}: {e}"));
                }
            }
        }

        let reservation_resolved_alias = match reserved_path {
            Some(path) => match self.repository.find_by_alias(path).await {
                Ok(record) => {
                    let records: Vec<_> = record.into_iter().collect();
                    is_reservation_resolved(path, &records).then(|| path.to_string())
                }
                Err(e) => {
                    errors.push(format!("reservation lookup for {path}: {e}"));
                    None
                }
            },
            None => None,
        };

        let success = errors.is_empty();
        let report = SyncReport {
            trigger,
            started_at,
            finished_at: Utc::now(),
            success,
            applied_count,
            skipped_count: plan.skipped.len(),
            conflict_count: plan.conflicts.len(),
            errors,
            warnings,
            reservation_resolved_alias,
        };

        let outcome = if success { "success" } else { "partial" };
        counter!("lndr_sync_runs_total", "outcome" => outcome).increment(1);
        info!(
            %trigger,
            applied = report.applied_count,
            skipped = report.skipped_count,
            conflicts = report.conflict_count,
            failed = report.errors.len(),
            "Sync finished"
        );

        self.remember(report.clone()).await;
        Ok(report)
    }

    /// Computes the plan a run would apply, without touching the store.
    ///
    /// # Errors
    ///
    /// Same as [`Self::run`] for the fetch and load steps.
    pub async fn plan(&self) -> Result<ReconcilePlan, AppError> {
        self.compute_plan().await
    }

    async fn compute_plan(&self) -> Result<ReconcilePlan, AppError> {
        let projects = self.catalog.fetch().await?;
        info!(count = projects.len(), "Fetched remote catalog");

        let mut local = self
            .repository
            .find_all_by_source_prefix(NAMESPACE_PREFIX)
            .await?;

        // Aliases held outside the namespace block claims on them.
        let claimed = claimed_paths(&projects, &self.owned_domain);
        if !claimed.is_empty() {
            let held = self.repository.find_all_by_aliases(&claimed).await?;
            local.extend(
                held.into_iter()
                    .filter(|record| !record.source.starts_with(NAMESPACE_PREFIX)),
            );
        }

        Ok(reconcile(&projects, &self.owned_domain, &local))
    }

    async fn apply(&self, mutation: &Mutation) -> Result<(), AppError> {
        match mutation {
            Mutation::Delete { pid, .. } => self.repository.delete(*pid).await,
            Mutation::Save {
                pid, source, alias, ..
            } => {
                let record = SaveAlias {
                    pid: *pid,
                    source: source.encode(),
                    alias: alias.clone(),
                };
                self.repository.save(record).await.map(|_| ())
            }
        }
    }

    async fn remember(&self, report: SyncReport) {
        *self.last_report.write().await = Some(report);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::{CatalogError, MockRemoteCatalog};
    use crate::domain::entities::{AliasRecord, RESERVED_SOURCE, RemoteProject};
    use crate::domain::repositories::MockAliasRepository;
    use serde_json::json;

    const DOMAIN: &str = "https://site.test";

    fn service(
        catalog: MockRemoteCatalog,
        repository: MockAliasRepository,
    ) -> SyncService<MockRemoteCatalog, MockAliasRepository> {
        SyncService::new(Arc::new(catalog), Arc::new(repository), DOMAIN)
    }

    #[tokio::test]
    async fn test_fetch_failure_leaves_store_untouched() {
        let mut catalog = MockRemoteCatalog::new();
        catalog
            .expect_fetch()
            .times(1)
            .returning(|| Err(CatalogError::Transport("connection refused".to_string())));

        // No expectations: any store call fails the test.
        let repository = MockAliasRepository::new();
        let service = service(catalog, repository);

        let result = service.run(SyncTrigger::Manual, None).await;

        assert!(matches!(result, Err(AppError::Upstream { .. })));
        let report = service.last_report().await.unwrap();
        assert!(!report.success);
        assert_eq!(report.applied_count, 0);
        assert_eq!(report.errors.len(), 1);
    }

    #[tokio::test]
    async fn test_promotes_placeholder_and_resolves_reservation() {
        let mut catalog = MockRemoteCatalog::new();
        catalog
            .expect_fetch()
            .times(1)
            .returning(|| Ok(vec![RemoteProject::new(42, "https://site.test/p1", None)]));

        let mut repository = MockAliasRepository::new();
        repository
            .expect_find_all_by_source_prefix()
            .withf(|prefix| prefix == "/lndr/")
            .times(1)
            .returning(|_| Ok(vec![AliasRecord::new(1, RESERVED_SOURCE, "/p1")]));
        repository
            .expect_find_all_by_aliases()
            .withf(|aliases| aliases.iter().eq(["/p1"]))
            .times(1)
            .returning(|_| Ok(vec![AliasRecord::new(1, RESERVED_SOURCE, "/p1")]));
        repository
            .expect_save()
            .withf(|r| r.pid == Some(1) && r.source == "/lndr/42" && r.alias == "/p1")
            .times(1)
            .returning(|_| Ok(1));
        repository
            .expect_find_by_alias()
            .withf(|alias| alias == "/p1")
            .times(1)
            .returning(|_| Ok(Some(AliasRecord::new(1, "/lndr/42", "/p1"))));

        let service = service(catalog, repository);
        let report = service
            .run(SyncTrigger::Reservation, Some("/p1"))
            .await
            .unwrap();

        assert!(report.success);
        assert_eq!(report.applied_count, 1);
        assert_eq!(report.reservation_resolved_alias.as_deref(), Some("/p1"));
    }

    #[tokio::test]
    async fn test_failed_mutation_does_not_stop_the_run() {
        let mut catalog = MockRemoteCatalog::new();
        catalog.expect_fetch().times(1).returning(|| Ok(Vec::new()));

        let mut repository = MockAliasRepository::new();
        repository
            .expect_find_all_by_source_prefix()
            .times(1)
            .returning(|_| {
                Ok(vec![
                    AliasRecord::new(1, "/lndr/7", "/gone"),
                    AliasRecord::new(2, "/lndr/8", "/also-gone"),
                ])
            });
        repository
            .expect_delete()
            .withf(|pid| *pid == 1)
            .times(1)
            .returning(|_| Err(AppError::internal("Database error", json!({}))));
        repository
            .expect_delete()
            .withf(|pid| *pid == 2)
            .times(1)
            .returning(|_| Ok(()));

        let service = service(catalog, repository);
        let report = service.run(SyncTrigger::Scheduled, None).await.unwrap();

        assert!(!report.success);
        assert_eq!(report.applied_count, 1);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("/gone"));
    }

    #[tokio::test]
    async fn test_unresolved_reservation_is_not_reported() {
        let mut catalog = MockRemoteCatalog::new();
        catalog.expect_fetch().times(1).returning(|| Ok(Vec::new()));

        let mut repository = MockAliasRepository::new();
        repository
            .expect_find_all_by_source_prefix()
            .times(1)
            .returning(|_| Ok(vec![AliasRecord::new(1, RESERVED_SOURCE, "/soon")]));
        repository
            .expect_find_by_alias()
            .times(1)
            .returning(|_| Ok(Some(AliasRecord::new(1, RESERVED_SOURCE, "/soon"))));

        let service = service(catalog, repository);
        let report = service
            .run(SyncTrigger::Reservation, Some("/soon"))
            .await
            .unwrap();

        assert!(report.success);
        assert_eq!(report.applied_count, 0);
        assert!(report.reservation_resolved_alias.is_none());
    }

    #[tokio::test]
    async fn test_plan_reports_warnings_without_mutating() {
        let mut catalog = MockRemoteCatalog::new();
        catalog.expect_fetch().times(1).returning(|| {
            Ok(vec![
                RemoteProject::new(1, "https://site.test/a", None),
                RemoteProject::from_value(json!({ "publish_url": "https://site.test/b" })),
            ])
        });

        let mut repository = MockAliasRepository::new();
        repository
            .expect_find_all_by_source_prefix()
            .times(1)
            .returning(|_| Ok(Vec::new()));
        repository
            .expect_find_all_by_aliases()
            .times(1)
            .returning(|_| Ok(Vec::new()));

        let service = service(catalog, repository);
        let plan = service.plan().await.unwrap();

        assert_eq!(plan.save_count(), 1);
        assert_eq!(plan.skipped.len(), 1);
        assert!(service.last_report().await.is_none());
    }

    #[tokio::test]
    async fn test_alias_held_outside_namespace_is_not_claimed() {
        let mut catalog = MockRemoteCatalog::new();
        catalog.expect_fetch().times(2).returning(|| {
            Ok(vec![
                RemoteProject::new(42, "https://site.test/about", None),
                RemoteProject::new(43, "https://site.test/fresh", None),
            ])
        });

        let mut repository = MockAliasRepository::new();
        repository
            .expect_find_all_by_source_prefix()
            .times(2)
            .returning(|_| Ok(Vec::new()));
        repository
            .expect_find_all_by_aliases()
            .withf(|aliases| aliases.iter().eq(["/about", "/fresh"]))
            .times(2)
            .returning(|_| Ok(vec![AliasRecord::new(9, "/node/9", "/about")]));
        repository
            .expect_save()
            .withf(|r| r.pid.is_none() && r.source == "/lndr/43" && r.alias == "/fresh")
            .times(2)
            .returning(|_| Ok(10));

        let service = service(catalog, repository);

        for _ in 0..2 {
            let report = service.run(SyncTrigger::Scheduled, None).await.unwrap();
            assert!(report.success, "errors: {:?}", report.errors);
            assert_eq!(report.applied_count, 1);
            assert_eq!(report.conflict_count, 1);
            assert!(report.warnings[0].contains("record 9 (/node/9)"));
        }
    }

    #[tokio::test]
    async fn test_stale_alias_is_reported_as_warning() {
        let mut catalog = MockRemoteCatalog::new();
        catalog
            .expect_fetch()
            .times(1)
            .returning(|| Ok(vec![RemoteProject::new(42, "https://site.test/new", None)]));

        let mut repository = MockAliasRepository::new();
        repository
            .expect_find_all_by_source_prefix()
            .times(1)
            .returning(|_| {
                Ok(vec![
                    AliasRecord::new(1, "/lndr/42", "/old"),
                    AliasRecord::new(2, RESERVED_SOURCE, "/new"),
                ])
            });
        repository
            .expect_find_all_by_aliases()
            .times(1)
            .returning(|_| Ok(vec![AliasRecord::new(2, RESERVED_SOURCE, "/new")]));
        repository
            .expect_save()
            .withf(|r| r.pid == Some(2) && r.source == "/lndr/42")
            .times(1)
            .returning(|_| Ok(2));

        let service = service(catalog, repository);
        let report = service.run(SyncTrigger::Manual, None).await.unwrap();

        assert!(report.success);
        assert_eq!(report.applied_count, 1);
        assert_eq!(
            report.warnings,
            vec!["stale alias /old (pid 1) of project 42, now served at /new".to_string()]
        );
    }

    #[test]
    fn test_owned_domain_is_normalized() {
        let service = service(MockRemoteCatalog::new(), MockAliasRepository::new());
        assert_eq!(service.owned_domain(), "https://site.test");
    }
}
