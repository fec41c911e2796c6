//! Remote project entities as delivered by the page catalog.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Path segment that marks a placeholder instead of a project id.
pub const RESERVED_SEGMENT: &str = "reserved";

/// Stable identifier of a remote project.
///
/// The catalog delivers ids as JSON strings or integers; both are kept in
/// their decimal/textual form. A valid id is non-empty, contains no `/`
/// (it is embedded as a path segment) and is never the `reserved` sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ProjectId(String);

impl ProjectId {
    /// Parses a textual project id, returning `None` if it cannot be embedded
    /// in an alias source.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.is_empty() || raw.contains('/') || raw == RESERVED_SEGMENT {
            return None;
        }
        Some(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Why a catalog entry was left out of reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "reason", content = "value")]
pub enum SkipReason {
    MissingId,
    InvalidId(String),
    MissingPublishUrl,
    InvalidPublishUrl(String),
    DuplicateId,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingId => write!(f, "missing id"),
            Self::InvalidId(id) => write!(f, "invalid id {id}"),
            Self::MissingPublishUrl => write!(f, "missing publish_url"),
            Self::InvalidPublishUrl(url) => write!(f, "invalid publish_url {url}"),
            Self::DuplicateId => write!(f, "duplicate id"),
        }
    }
}

/// A catalog entry exactly as received.
///
/// Fields are kept as loose JSON so that one malformed entry never fails
/// the decoding of the whole catalog; [`RemoteProject::validate`] decides
/// whether the entry takes part in reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteProject {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub publish_url: Option<Value>,
    #[serde(default)]
    pub origin_url: Option<Value>,
}

impl RemoteProject {
    /// Builds a well-formed entry.
    pub fn new(id: impl Into<Value>, publish_url: &str, origin_url: Option<&str>) -> Self {
        Self {
            id: Some(id.into()),
            publish_url: Some(Value::String(publish_url.to_string())),
            origin_url: origin_url.map(|u| Value::String(u.to_string())),
        }
    }

    /// Converts one element of the catalog `projects` array.
    ///
    /// Anything that is not a JSON object becomes an empty entry, which
    /// validation then reports as [`SkipReason::MissingId`].
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(mut map) => Self {
                id: map.remove("id").filter(|v| !v.is_null()),
                publish_url: map.remove("publish_url").filter(|v| !v.is_null()),
                origin_url: map.remove("origin_url").filter(|v| !v.is_null()),
            },
            _ => Self::default(),
        }
    }

    /// Textual form of the id, if one was supplied at all.
    pub fn raw_id(&self) -> Option<String> {
        match self.id.as_ref()? {
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Parses only the id; used to recognise entries whose id is sound but
    /// whose other fields are not.
    pub fn project_id(&self) -> Result<ProjectId, SkipReason> {
        match &self.id {
            None => Err(SkipReason::MissingId),
            Some(Value::String(s)) => {
                ProjectId::parse(s).ok_or_else(|| SkipReason::InvalidId(s.clone()))
            }
            Some(Value::Number(n)) if n.is_i64() || n.is_u64() => ProjectId::parse(&n.to_string())
                .ok_or_else(|| SkipReason::InvalidId(n.to_string())),
            Some(other) => Err(SkipReason::InvalidId(other.to_string())),
        }
    }

    /// Validates the entry into a [`Project`].
    ///
    /// # Errors
    ///
    /// Returns the [`SkipReason`] describing the first defect found.
    pub fn validate(&self) -> Result<Project, SkipReason> {
        let id = self.project_id()?;

        let publish_url = match &self.publish_url {
            Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
            Some(Value::String(_)) | None => return Err(SkipReason::MissingPublishUrl),
            Some(other) => return Err(SkipReason::InvalidPublishUrl(other.to_string())),
        };

        match url::Url::parse(&publish_url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
            _ => return Err(SkipReason::InvalidPublishUrl(publish_url)),
        }

        let origin_url = match &self.origin_url {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            _ => None,
        };

        Ok(Project {
            id,
            publish_url,
            origin_url,
        })
    }
}

/// A validated remote project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Project {
    pub id: ProjectId,
    /// Absolute URL where the page is meant to be reachable.
    pub publish_url: String,
    /// Base URL of the page assets; not used by reconciliation.
    pub origin_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_project_id_parse() {
        assert_eq!(ProjectId::parse("42").unwrap().as_str(), "42");
        assert!(ProjectId::parse("").is_none());
        assert!(ProjectId::parse("reserved").is_none());
        assert!(ProjectId::parse("4/2").is_none());
    }

    #[test]
    fn test_validate_integer_id() {
        let project = RemoteProject::new(42, "https://site.test/p1", None)
            .validate()
            .unwrap();

        assert_eq!(project.id.as_str(), "42");
        assert_eq!(project.publish_url, "https://site.test/p1");
        assert!(project.origin_url.is_none());
    }

    #[test]
    fn test_validate_string_id_with_origin() {
        let project = RemoteProject::new("abc", "https://site.test/p1", Some("https://cdn.test/abc"))
            .validate()
            .unwrap();

        assert_eq!(project.id.as_str(), "abc");
        assert_eq!(project.origin_url.as_deref(), Some("https://cdn.test/abc"));
    }

    #[test]
    fn test_validate_reports_defects() {
        let missing_id = RemoteProject::from_value(json!({ "publish_url": "https://site.test/p" }));
        assert_eq!(missing_id.validate(), Err(SkipReason::MissingId));

        let float_id = RemoteProject::from_value(json!({ "id": 1.5, "publish_url": "https://site.test/p" }));
        assert!(matches!(float_id.validate(), Err(SkipReason::InvalidId(_))));

        let no_url = RemoteProject::from_value(json!({ "id": 7 }));
        assert_eq!(no_url.validate(), Err(SkipReason::MissingPublishUrl));

        let relative = RemoteProject::from_value(json!({ "id": 7, "publish_url": "/p" }));
        assert!(matches!(
            relative.validate(),
            Err(SkipReason::InvalidPublishUrl(_))
        ));
    }

    #[test]
    fn test_from_value_non_object() {
        let entry = RemoteProject::from_value(json!("garbage"));
        assert_eq!(entry, RemoteProject::default());
        assert_eq!(entry.validate(), Err(SkipReason::MissingId));
    }

    #[test]
    fn test_raw_id() {
        let entry = RemoteProject::from_value(json!({ "id": 9 }));
        assert_eq!(entry.raw_id().as_deref(), Some("9"));
        assert!(RemoteProject::default().raw_id().is_none());
    }
}
