//! Reconciliation of the remote page catalog against the local alias table.
//!
//! [`reconcile`] is pure: it reads a catalog snapshot and the namespace
//! records and returns the [`ReconcilePlan`] that brings the table in line.
//! It makes two decision passes over disjoint inputs:
//!
//! 1. **Upserts**, driven by owned projects: create, promote, rename.
//! 2. **Removals**, driven by resolved local records: orphan deletion.
//!
//! Both passes share [`owned_path`] and [`Catalog::removal_reason`], so a
//! record scheduled for deletion is never one the upsert pass writes to,
//! and an alias held by such a record is free for the upsert pass to claim.
//!
//! Records outside the namespace may be passed in too. They are never
//! written, but the aliases they hold are taken: a project claiming one
//! gets an [`AliasConflict`] instead of a save the store would reject.

use std::collections::{HashMap, HashSet};

use crate::domain::entities::{
    AliasConflict, AliasOccupant, AliasRecord, AliasSource, DeleteReason, Mutation, ProjectId,
    ReconcilePlan, RemoteProject, SaveKind, SkipReason, SkippedProject, StaleAlias,
};

/// Strips trailing slashes so `https://site.test/` and `https://site.test` match alike.
pub fn normalize_domain(owned_domain: &str) -> &str {
    owned_domain.trim_end_matches('/')
}

/// Returns the alias path of `publish_url` if it lies under `owned_domain`.
///
/// The remainder after the domain must start with `/` and name an actual
/// path, so `https://site.test.evil.net/x` and the bare domain are not owned.
pub fn owned_path<'a>(publish_url: &'a str, owned_domain: &str) -> Option<&'a str> {
    let domain = normalize_domain(owned_domain);
    if domain.is_empty() {
        return None;
    }
    let path = publish_url.strip_prefix(domain)?;
    (path.starts_with('/') && path.len() > 1).then_some(path)
}

/// Computes the mutations that bring `local_aliases` in line with `projects`.
///
/// `local_aliases` holds the namespace records plus any other record whose
/// alias an owned project may claim. Records outside the `/lndr/`
/// namespace never appear in the plan; their aliases count as taken.
/// Malformed catalog entries are skipped and listed in
/// [`ReconcilePlan::skipped`]; aliases that cannot be claimed are listed
/// in [`ReconcilePlan::conflicts`] and left untouched.
///
/// Applying the returned mutations in order and reconciling again with the
/// same catalog yields an empty plan.
pub fn reconcile(
    projects: &[RemoteProject],
    owned_domain: &str,
    local_aliases: &[AliasRecord],
) -> ReconcilePlan {
    let catalog = Catalog::build(projects, owned_domain);
    let records = namespace_records(local_aliases);

    let (saves, conflicts, stale) = plan_upserts(&catalog, &records, local_aliases);
    let deletes = plan_removals(&catalog, &records);

    // Deletes free aliases that saves may reuse, and never touch a saved pid.
    let mut mutations = deletes;
    mutations.extend(saves);

    ReconcilePlan {
        mutations,
        skipped: catalog.skipped,
        conflicts,
        stale,
    }
}

/// Alias paths the owned projects of `projects` want, sorted and deduplicated.
///
/// The caller loads the records holding these aliases so that [`reconcile`]
/// can see aliases taken outside the namespace.
pub fn claimed_paths(projects: &[RemoteProject], owned_domain: &str) -> Vec<String> {
    let catalog = Catalog::build(projects, owned_domain);
    let mut paths: Vec<String> = catalog.targets.into_values().collect();
    paths.sort();
    paths.dedup();
    paths
}

/// True iff a record holds `alias` and it is no longer a placeholder.
pub fn is_reservation_resolved(alias: &str, local_aliases: &[AliasRecord]) -> bool {
    local_aliases
        .iter()
        .find(|record| record.alias == alias)
        .is_some_and(|record| !record.is_placeholder())
}

struct OwnedProject {
    id: ProjectId,
    path: String,
}

/// Validated view of the catalog.
#[derive(Default)]
struct Catalog {
    /// Projects on the owned domain, in catalog order.
    owned: Vec<OwnedProject>,
    /// Alias path each owned project should have.
    targets: HashMap<ProjectId, String>,
    /// Every valid id, owned or not.
    known: HashSet<ProjectId>,
    /// Ids seen only on entries that failed validation.
    incomplete: HashSet<ProjectId>,
    skipped: Vec<SkippedProject>,
}

impl Catalog {
    fn build(projects: &[RemoteProject], owned_domain: &str) -> Self {
        let mut catalog = Self::default();

        for (index, entry) in projects.iter().enumerate() {
            let project = match entry.validate() {
                Ok(project) => project,
                Err(reason) => {
                    if let Ok(id) = entry.project_id() {
                        catalog.incomplete.insert(id);
                    }
                    catalog.skip(index, entry, reason);
                    continue;
                }
            };

            if !catalog.known.insert(project.id.clone()) {
                catalog.skip(index, entry, SkipReason::DuplicateId);
                continue;
            }

            if let Some(path) = owned_path(&project.publish_url, owned_domain) {
                catalog.targets.insert(project.id.clone(), path.to_string());
                catalog.owned.push(OwnedProject {
                    id: project.id,
                    path: path.to_string(),
                });
            }
        }

        catalog
    }

    fn skip(&mut self, index: usize, entry: &RemoteProject, reason: SkipReason) {
        self.skipped.push(SkippedProject {
            index,
            id: entry.raw_id(),
            reason,
        });
    }

    /// Why a resolved record for `id` must go, if it must.
    ///
    /// Ids that only appear on malformed entries keep their records.
    fn removal_reason(&self, id: &ProjectId) -> Option<DeleteReason> {
        if self.targets.contains_key(id) {
            None
        } else if self.known.contains(id) {
            Some(DeleteReason::OffDomain)
        } else if self.incomplete.contains(id) {
            None
        } else {
            Some(DeleteReason::Removed)
        }
    }
}

struct NamespaceRecord<'a> {
    record: &'a AliasRecord,
    source: AliasSource,
}

/// Decodes the namespace records, lowest pid first.
fn namespace_records(local_aliases: &[AliasRecord]) -> Vec<NamespaceRecord<'_>> {
    let mut records: Vec<_> = local_aliases
        .iter()
        .filter_map(|record| {
            record
                .namespace_source()
                .map(|source| NamespaceRecord { record, source })
        })
        .collect();
    records.sort_by_key(|entry| entry.record.pid);
    records
}

/// Orphan pass: one delete per resolved record whose project is gone or off-domain.
fn plan_removals(catalog: &Catalog, records: &[NamespaceRecord<'_>]) -> Vec<Mutation> {
    records
        .iter()
        .filter_map(|entry| {
            let project_id = entry.source.project_id()?;
            let reason = catalog.removal_reason(project_id)?;
            Some(Mutation::Delete {
                pid: entry.record.pid,
                alias: entry.record.alias.clone(),
                project_id: project_id.clone(),
                reason,
            })
        })
        .collect()
}

/// Upsert pass over the owned projects.
///
/// A project whose alias is held by another project that is itself moving
/// away is retried after the others, so rename chains settle in one pass.
/// When a round makes no progress the remaining claims are conflicts.
fn plan_upserts(
    catalog: &Catalog,
    records: &[NamespaceRecord<'_>],
    local_aliases: &[AliasRecord],
) -> (Vec<Mutation>, Vec<AliasConflict>, Vec<StaleAlias>) {
    let mut index = AliasIndex::surviving(records, catalog);
    index.add_foreign(local_aliases);
    let mut saves = Vec::new();
    let mut conflicts = Vec::new();
    let mut pending: Vec<&OwnedProject> = catalog.owned.iter().collect();

    while !pending.is_empty() {
        let round = pending.len();
        let mut blocked = Vec::new();

        for project in pending {
            match index.claim(project, catalog) {
                Claim::Save(mutation) => saves.push(mutation),
                Claim::Unchanged => {}
                Claim::Blocked => blocked.push(project),
                Claim::Conflict(occupant) => conflicts.push(AliasConflict {
                    alias: project.path.clone(),
                    claimant: project.id.clone(),
                    occupant,
                }),
            }
        }

        if blocked.len() == round {
            for project in blocked {
                if let Some(occupant) = index.occupant(&project.path) {
                    conflicts.push(AliasConflict {
                        alias: project.path.clone(),
                        claimant: project.id.clone(),
                        occupant,
                    });
                }
            }
            break;
        }

        pending = blocked;
    }

    let stale = index.stale(catalog);
    (saves, conflicts, stale)
}

enum Claim {
    Save(Mutation),
    Unchanged,
    /// Held by a project that may still move away.
    Blocked,
    Conflict(AliasOccupant),
}

enum Holder {
    Namespace(AliasSource),
    /// Record outside the namespace; never written.
    Foreign { pid: i64, source: String },
}

struct Slot {
    /// `None` for records created earlier in this pass.
    pid: Option<i64>,
    holder: Holder,
}

/// Working view of the alias table while the upsert pass runs.
#[derive(Default)]
struct AliasIndex {
    slots: HashMap<String, Slot>,
    /// Alias of each project's primary (lowest pid) record.
    primary: HashMap<ProjectId, String>,
}

impl AliasIndex {
    /// Indexes the records that survive the removal pass.
    fn surviving(records: &[NamespaceRecord<'_>], catalog: &Catalog) -> Self {
        let mut index = Self::default();

        for entry in records {
            if let Some(id) = entry.source.project_id()
                && catalog.removal_reason(id).is_some()
            {
                continue;
            }

            let alias = &entry.record.alias;
            if index.slots.contains_key(alias) {
                continue;
            }

            if let Some(id) = entry.source.project_id() {
                index
                    .primary
                    .entry(id.clone())
                    .or_insert_with(|| alias.clone());
            }

            index.slots.insert(
                alias.clone(),
                Slot {
                    pid: Some(entry.record.pid),
                    holder: Holder::Namespace(entry.source.clone()),
                },
            );
        }

        index
    }

    /// Marks aliases held outside the namespace as taken.
    fn add_foreign(&mut self, local_aliases: &[AliasRecord]) {
        for record in local_aliases {
            if record.namespace_source().is_some() || self.slots.contains_key(&record.alias) {
                continue;
            }
            self.slots.insert(
                record.alias.clone(),
                Slot {
                    pid: Some(record.pid),
                    holder: Holder::Foreign {
                        pid: record.pid,
                        source: record.source.clone(),
                    },
                },
            );
        }
    }

    fn occupant(&self, alias: &str) -> Option<AliasOccupant> {
        match &self.slots.get(alias)?.holder {
            Holder::Namespace(source) => {
                source
                    .project_id()
                    .map(|project_id| AliasOccupant::Project {
                        project_id: project_id.clone(),
                    })
            }
            Holder::Foreign { pid, source } => Some(AliasOccupant::Foreign {
                pid: *pid,
                source: source.clone(),
            }),
        }
    }

    fn claim(&mut self, project: &OwnedProject, catalog: &Catalog) -> Claim {
        let OwnedProject { id, path } = project;

        if let Some(slot) = self.slots.get_mut(path) {
            match &slot.holder {
                Holder::Foreign { pid, source } => {
                    return Claim::Conflict(AliasOccupant::Foreign {
                        pid: *pid,
                        source: source.clone(),
                    });
                }
                Holder::Namespace(AliasSource::Resolved(owner)) => {
                    if owner == id {
                        return Claim::Unchanged;
                    }

                    let moving = catalog
                        .targets
                        .get(owner)
                        .is_some_and(|target| target != path);
                    return if moving {
                        Claim::Blocked
                    } else {
                        Claim::Conflict(AliasOccupant::Project {
                            project_id: owner.clone(),
                        })
                    };
                }
                Holder::Namespace(AliasSource::Reserved) => {}
            }

            slot.holder = Holder::Namespace(AliasSource::Resolved(id.clone()));
            let pid = slot.pid;
            self.primary
                .entry(id.clone())
                .or_insert_with(|| path.clone());
            return Claim::Save(Mutation::Save {
                pid,
                source: AliasSource::Resolved(id.clone()),
                alias: path.clone(),
                kind: SaveKind::Promote,
                previous_alias: None,
            });
        }

        let source = AliasSource::Resolved(id.clone());

        if let Some(current) = self.primary.get(id).cloned() {
            let pid = self.slots.remove(&current).and_then(|slot| slot.pid);
            self.slots.insert(
                path.clone(),
                Slot {
                    pid,
                    holder: Holder::Namespace(source.clone()),
                },
            );
            self.primary.insert(id.clone(), path.clone());
            return Claim::Save(Mutation::Save {
                pid,
                source,
                alias: path.clone(),
                kind: SaveKind::Rename,
                previous_alias: Some(current),
            });
        }

        self.slots.insert(
            path.clone(),
            Slot {
                pid: None,
                holder: Holder::Namespace(source.clone()),
            },
        );
        self.primary.insert(id.clone(), path.clone());
        Claim::Save(Mutation::Save {
            pid: None,
            source,
            alias: path.clone(),
            kind: SaveKind::Create,
            previous_alias: None,
        })
    }

    fn holds(&self, alias: &str, id: &ProjectId) -> bool {
        self.slots.get(alias).is_some_and(|slot| {
            matches!(&slot.holder, Holder::Namespace(AliasSource::Resolved(owner)) if owner == id)
        })
    }

    /// Existing records of a project left at another alias once the
    /// project holds its target alias. Lowest pid first.
    fn stale(&self, catalog: &Catalog) -> Vec<StaleAlias> {
        let mut stale: Vec<StaleAlias> = self
            .slots
            .iter()
            .filter_map(|(alias, slot)| {
                let Holder::Namespace(AliasSource::Resolved(id)) = &slot.holder else {
                    return None;
                };
                let pid = slot.pid?;
                let target = catalog.targets.get(id)?;
                (target != alias && self.holds(target, id)).then(|| StaleAlias {
                    pid,
                    alias: alias.clone(),
                    project_id: id.clone(),
                    current_alias: target.clone(),
                })
            })
            .collect();
        stale.sort_by_key(|entry| entry.pid);
        stale
    }
}
