//! Alias path validation.
//!
//! Aliases are root-relative paths served on the owned domain. The same
//! rules guard reservations and the post-sync redirect target, so a caller
//! can never be sent off-site through `/sync?path=...`.

use regex::Regex;
use std::sync::LazyLock;

/// Maximum alias length, matching the `url_alias.alias` limit of the CMS table.
pub const MAX_ALIAS_LENGTH: usize = 255;

static ALIAS_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/[A-Za-z0-9\-._~%/]+$").unwrap());

/// Errors returned for unusable alias paths.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AliasPathError {
    #[error("Alias must not be empty")]
    Empty,

    #[error("Alias must start with '/'")]
    NotRootRelative,

    #[error("Alias must not start with '//'")]
    ProtocolRelative,

    #[error("Alias must be at most {MAX_ALIAS_LENGTH} characters (got {0})")]
    TooLong(usize),

    #[error("Alias contains invalid characters: {0}")]
    InvalidCharacters(String),
}

/// Validates an alias path.
///
/// # Rules
///
/// - Starts with a single `/` and names more than the site root
/// - At most [`MAX_ALIAS_LENGTH`] characters
/// - Only unreserved URL characters, `%` escapes and `/`
///
/// # Examples
///
/// ```ignore
/// assert!(validate_alias("/spring-campaign").is_ok());
/// assert!(validate_alias("//evil.test").is_err());
/// assert!(validate_alias("https://evil.test").is_err());
/// ```
pub fn validate_alias(alias: &str) -> Result<(), AliasPathError> {
    if alias.is_empty() || alias == "/" {
        return Err(AliasPathError::Empty);
    }
    if !alias.starts_with('/') {
        return Err(AliasPathError::NotRootRelative);
    }
    if alias.starts_with("//") {
        return Err(AliasPathError::ProtocolRelative);
    }
    if alias.len() > MAX_ALIAS_LENGTH {
        return Err(AliasPathError::TooLong(alias.len()));
    }
    if !ALIAS_REGEX.is_match(alias) {
        return Err(AliasPathError::InvalidCharacters(alias.to_string()));
    }
    Ok(())
}

/// Turns a caller-supplied `path` parameter into a safe redirect path.
///
/// Surrounding whitespace, the query string and the fragment are dropped;
/// what remains must be a valid alias.
pub fn sanitize_redirect_path(path: &str) -> Result<String, AliasPathError> {
    let path = path.trim();
    let path = path.split(['?', '#']).next().unwrap_or_default();
    validate_alias(path)?;
    Ok(path.to_string())
}
