//! Local path alias records and the `/lndr/...` source convention.

use serde::{Serialize, Serializer};
use std::fmt;

use super::project::{ProjectId, RESERVED_SEGMENT};

/// Source prefix of every record owned by the sync.
pub const NAMESPACE_PREFIX: &str = "/lndr/";

/// Source of a placeholder record.
pub const RESERVED_SOURCE: &str = "/lndr/reserved";

/// Decoded form of a namespace record's `source`.
///
/// The string encoding only exists at the store boundary; everything else
/// works with this enum. [`AliasSource::encode`] and [`AliasSource::decode`]
/// are the only places that build or parse `/lndr/...` paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AliasSource {
    /// Placeholder reserving an alias for a page that has not synced yet.
    Reserved,
    /// Alias resolved to a remote project.
    Resolved(ProjectId),
}

impl AliasSource {
    pub fn encode(&self) -> String {
        match self {
            Self::Reserved => RESERVED_SOURCE.to_string(),
            Self::Resolved(id) => format!("{NAMESPACE_PREFIX}{id}"),
        }
    }

    /// Parses a store `source`.
    ///
    /// Returns `None` for anything outside the namespace, including
    /// `/lndr/` itself and nested paths such as `/lndr/42/edit`.
    pub fn decode(source: &str) -> Option<Self> {
        let rest = source.strip_prefix(NAMESPACE_PREFIX)?;
        if rest == RESERVED_SEGMENT {
            return Some(Self::Reserved);
        }
        ProjectId::parse(rest).map(Self::Resolved)
    }

    pub fn is_reserved(&self) -> bool {
        matches!(self, Self::Reserved)
    }

    pub fn project_id(&self) -> Option<&ProjectId> {
        match self {
            Self::Reserved => None,
            Self::Resolved(id) => Some(id),
        }
    }
}

impl fmt::Display for AliasSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl Serialize for AliasSource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

/// A stored path alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AliasRecord {
    /// Store-assigned identifier, immutable once assigned.
    pub pid: i64,
    /// Internal path, e.g. `/lndr/42`.
    pub source: String,
    /// Externally visible path, e.g. `/my-campaign`.
    pub alias: String,
}

impl AliasRecord {
    /// Creates a new AliasRecord instance.
    pub fn new(pid: i64, source: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            pid,
            source: source.into(),
            alias: alias.into(),
        }
    }

    /// Decoded source, or `None` if the record does not belong to the sync.
    pub fn namespace_source(&self) -> Option<AliasSource> {
        AliasSource::decode(&self.source)
    }

    pub fn is_placeholder(&self) -> bool {
        self.source == RESERVED_SOURCE
    }
}

/// Input for inserting or updating an alias.
///
/// `pid: None` inserts a new record; `Some(pid)` updates that record in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveAlias {
    pub pid: Option<i64>,
    pub source: String,
    pub alias: String,
}

impl SaveAlias {
    /// A new placeholder reserving `alias`.
    pub fn placeholder(alias: impl Into<String>) -> Self {
        Self {
            pid: None,
            source: AliasSource::Reserved.encode(),
            alias: alias.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode() {
        let id = ProjectId::parse("42").unwrap();
        assert_eq!(AliasSource::Resolved(id).encode(), "/lndr/42");
        assert_eq!(AliasSource::Reserved.encode(), "/lndr/reserved");
    }

    #[test]
    fn test_decode_namespace() {
        assert_eq!(
            AliasSource::decode("/lndr/reserved"),
            Some(AliasSource::Reserved)
        );
        assert_eq!(
            AliasSource::decode("/lndr/42"),
            Some(AliasSource::Resolved(ProjectId::parse("42").unwrap()))
        );
    }

    #[test]
    fn test_decode_foreign_sources() {
        assert!(AliasSource::decode("/node/1").is_none());
        assert!(AliasSource::decode("/lndr/").is_none());
        assert!(AliasSource::decode("/lndr/42/edit").is_none());
        assert!(AliasSource::decode("/lndr_edit/node/1").is_none());
        assert!(AliasSource::decode("lndr/42").is_none());
    }

    #[test]
    fn test_record_helpers() {
        let placeholder = AliasRecord::new(1, RESERVED_SOURCE, "/p1");
        assert!(placeholder.is_placeholder());
        assert_eq!(placeholder.namespace_source(), Some(AliasSource::Reserved));

        let foreign = AliasRecord::new(2, "/node/7", "/about");
        assert!(!foreign.is_placeholder());
        assert!(foreign.namespace_source().is_none());
    }

    #[test]
    fn test_placeholder_save() {
        let save = SaveAlias::placeholder("/soon");
        assert!(save.pid.is_none());
        assert_eq!(save.source, "/lndr/reserved");
        assert_eq!(save.alias, "/soon");
    }
}
