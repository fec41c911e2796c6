//! Reservations and namespace listings.

use std::sync::Arc;

use serde_json::json;

use crate::domain::entities::{AliasRecord, AliasSource, NAMESPACE_PREFIX, SaveAlias};
use crate::domain::reconcile::normalize_domain;
use crate::domain::repositories::AliasRepository;
use crate::error::AppError;
use crate::utils::alias_path::{sanitize_redirect_path, validate_alias};

/// Service for placeholder reservations and read access to the namespace.
pub struct AliasService<S: AliasRepository + ?Sized> {
    repository: Arc<S>,
    base_url: String,
}

impl<S: AliasRepository + ?Sized> AliasService<S> {
    /// Creates a new alias service.
    ///
    /// `base_url` is the owned domain; redirects are built against it.
    pub fn new(repository: Arc<S>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            repository,
            base_url: normalize_domain(&base_url).to_string(),
        }
    }

    /// Reserves `alias` for a page that has not synced yet.
    ///
    /// The next sync that sees a project published at this alias promotes
    /// the placeholder in place.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the alias is not a valid path.
    /// Returns [`AppError::Conflict`] if any record already holds the alias.
    /// Returns [`AppError::Internal`] on storage errors.
    pub async fn reserve(&self, alias: &str) -> Result<AliasRecord, AppError> {
        validate_alias(alias).map_err(|e| {
            AppError::bad_request("Invalid alias", json!({ "alias": alias, "reason": e.to_string() }))
        })?;

        if let Some(existing) = self.repository.find_by_alias(alias).await? {
            return Err(AppError::conflict(
                "Alias already exists",
                json!({ "alias": alias, "source": existing.source }),
            ));
        }

        let placeholder = SaveAlias::placeholder(alias);
        let source = placeholder.source.clone();
        let pid = self.repository.save(placeholder).await?;

        tracing::info!(alias, pid, "Alias reserved");
        Ok(AliasRecord::new(pid, source, alias))
    }

    /// Lists every record in the `/lndr/` namespace with its decoded source.
    ///
    /// Records whose source merely shares the prefix (for example nested
    /// paths) are not part of the namespace and are left out.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    pub async fn list_namespace(&self) -> Result<Vec<(AliasRecord, AliasSource)>, AppError> {
        let records = self
            .repository
            .find_all_by_source_prefix(NAMESPACE_PREFIX)
            .await?;

        Ok(records
            .into_iter()
            .filter_map(|record| {
                let source = record.namespace_source()?;
                Some((record, source))
            })
            .collect())
    }

    /// Validates a caller-supplied return path.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for absolute URLs, protocol-relative
    /// paths and anything else that is not a plain alias.
    pub fn resolve_redirect(&self, path: &str) -> Result<String, AppError> {
        sanitize_redirect_path(path).map_err(|e| {
            AppError::bad_request("Invalid redirect path", json!({ "reason": e.to_string() }))
        })
    }

    /// Absolute redirect target: the resolved alias if any, else the site root.
    pub fn redirect_url(&self, resolved_alias: Option<&str>) -> String {
        match resolved_alias {
            Some(alias) => format!("{}{}", self.base_url, alias),
            None => format!("{}/", self.base_url),
        }
    }
}
