//! Reconciliation output: planned store mutations and diagnostics.

use serde::Serialize;
use std::fmt;

use super::alias::AliasSource;
use super::project::{ProjectId, SkipReason};

/// What a save does to the alias table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveKind {
    /// New record for a project seen on the owned domain for the first time.
    Create,
    /// Placeholder turned into a resolved record, keeping its pid.
    Promote,
    /// Resolved record moved to the project's new publish path.
    Rename,
}

/// Why a resolved record is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteReason {
    /// The project is no longer in the catalog.
    Removed,
    /// The project now publishes outside the owned domain.
    OffDomain,
}

/// A single store operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Mutation {
    Save {
        pid: Option<i64>,
        source: AliasSource,
        alias: String,
        kind: SaveKind,
        #[serde(skip_serializing_if = "Option::is_none")]
        previous_alias: Option<String>,
    },
    Delete {
        pid: i64,
        alias: String,
        project_id: ProjectId,
        reason: DeleteReason,
    },
}

impl Mutation {
    pub fn pid(&self) -> Option<i64> {
        match self {
            Self::Save { pid, .. } => *pid,
            Self::Delete { pid, .. } => Some(*pid),
        }
    }

    pub fn alias(&self) -> &str {
        match self {
            Self::Save { alias, .. } | Self::Delete { alias, .. } => alias,
        }
    }

    /// Metric label for the mutation.
    pub fn kind_label(&self) -> &'static str {
        match self {
            Self::Save { kind, .. } => label_for(*kind),
            Self::Delete { .. } => "delete",
        }
    }
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Save {
                source,
                alias,
                kind: SaveKind::Rename,
                previous_alias: Some(previous),
                ..
            } => write!(f, "rename {source} {previous} -> {alias}"),
            Self::Save {
                source,
                alias,
                kind,
                ..
            } => write!(f, "{} {source} at {alias}", label_for(*kind)),
            Self::Delete {
                pid,
                alias,
                project_id,
                reason,
            } => {
                let why = match reason {
                    DeleteReason::Removed => "removed remotely",
                    DeleteReason::OffDomain => "moved off domain",
                };
                write!(f, "delete {alias} (pid {pid}, project {project_id}, {why})")
            }
        }
    }
}

fn label_for(kind: SaveKind) -> &'static str {
    match kind {
        SaveKind::Create => "create",
        SaveKind::Promote => "promote",
        SaveKind::Rename => "rename",
    }
}

/// Current holder of an alias a project claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AliasOccupant {
    /// Another remote project.
    Project { project_id: ProjectId },
    /// A record outside the `/lndr/` namespace, e.g. a CMS node alias.
    /// The sync never writes to it.
    Foreign { pid: i64, source: String },
}

impl fmt::Display for AliasOccupant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Project { project_id } => write!(f, "project {project_id}"),
            Self::Foreign { pid, source } => write!(f, "record {pid} ({source})"),
        }
    }
}

/// An alias a project wants but cannot take; left for manual review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AliasConflict {
    pub alias: String,
    /// Project whose publish path is `alias`.
    pub claimant: ProjectId,
    /// Whoever holds `alias` now.
    pub occupant: AliasOccupant,
}

impl fmt::Display for AliasConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "alias {} is held by {} and claimed by project {}",
            self.alias, self.occupant, self.claimant
        )
    }
}

/// A resolved record left behind at an old alias while another record of
/// the same project serves the current one.
///
/// Happens when a placeholder is promoted for a project that already had a
/// resolved record, or when a project has several resolved records. The
/// sync keeps the record; an operator decides whether to drop it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaleAlias {
    pub pid: i64,
    pub alias: String,
    pub project_id: ProjectId,
    /// Alias the project is served at.
    pub current_alias: String,
}

impl fmt::Display for StaleAlias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "stale alias {} (pid {}) of project {}, now served at {}",
            self.alias, self.pid, self.project_id, self.current_alias
        )
    }
}

/// A catalog entry left out of reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedProject {
    /// Position in the catalog list.
    pub index: usize,
    pub id: Option<String>,
    pub reason: SkipReason,
}

/// Result of one reconciliation pass.
///
/// `mutations` is in application order: deletes first, then saves in the
/// order that keeps every alias unique at each step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcilePlan {
    pub mutations: Vec<Mutation>,
    pub skipped: Vec<SkippedProject>,
    pub conflicts: Vec<AliasConflict>,
    pub stale: Vec<StaleAlias>,
}

impl ReconcilePlan {
    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    pub fn save_count(&self) -> usize {
        self.mutations
            .iter()
            .filter(|m| matches!(m, Mutation::Save { .. }))
            .count()
    }

    pub fn delete_count(&self) -> usize {
        self.mutations
            .iter()
            .filter(|m| matches!(m, Mutation::Delete { .. }))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: &str) -> ProjectId {
        ProjectId::parse(raw).unwrap()
    }

    #[test]
    fn test_promote_label() {
        let mutation = Mutation::Save {
            pid: Some(3),
            source: AliasSource::Resolved(id("42")),
            alias: "/p1".to_string(),
            kind: SaveKind::Promote,
            previous_alias: None,
        };

        assert_eq!(mutation.kind_label(), "promote");
        assert_eq!(mutation.pid(), Some(3));
        assert_eq!(mutation.to_string(), "promote /lndr/42 at /p1");
    }

    #[test]
    fn test_delete_display() {
        let mutation = Mutation::Delete {
            pid: 9,
            alias: "/gone".to_string(),
            project_id: id("7"),
            reason: DeleteReason::Removed,
        };

        assert_eq!(mutation.pid(), Some(9));
        assert_eq!(mutation.alias(), "/gone");
        assert_eq!(
            mutation.to_string(),
            "delete /gone (pid 9, project 7, removed remotely)"
        );
    }

    #[test]
    fn test_rename_display() {
        let mutation = Mutation::Save {
            pid: Some(1),
            source: AliasSource::Resolved(id("42")),
            alias: "/new".to_string(),
            kind: SaveKind::Rename,
            previous_alias: Some("/old".to_string()),
        };

        assert_eq!(mutation.to_string(), "rename /lndr/42 /old -> /new");
    }

    #[test]
    fn test_conflict_display_names_occupant() {
        let conflict = AliasConflict {
            alias: "/about".to_string(),
            claimant: id("42"),
            occupant: AliasOccupant::Foreign {
                pid: 1,
                source: "/node/9".to_string(),
            },
        };

        assert_eq!(
            conflict.to_string(),
            "alias /about is held by record 1 (/node/9) and claimed by project 42"
        );
    }

    #[test]
    fn test_plan_counts() {
        let plan = ReconcilePlan {
            mutations: vec![
                Mutation::Delete {
                    pid: 1,
                    alias: "/a".to_string(),
                    project_id: id("1"),
                    reason: DeleteReason::OffDomain,
                },
                Mutation::Save {
                    pid: None,
                    source: AliasSource::Resolved(id("2")),
                    alias: "/b".to_string(),
                    kind: SaveKind::Create,
                    previous_alias: None,
                },
            ],
            ..Default::default()
        };

        assert!(!plan.is_empty());
        assert_eq!(plan.save_count(), 1);
        assert_eq!(plan.delete_count(), 1);
    }
}
