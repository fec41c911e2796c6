//! Remote catalog client over HTTP.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, warn};

use crate::config::Config;
use crate::domain::catalog::{CatalogError, RemoteCatalog};
use crate::domain::entities::RemoteProject;

/// Longest error body excerpt kept in [`CatalogError::Status`].
const MAX_ERROR_BODY: usize = 200;

#[derive(Deserialize)]
struct CatalogBody {
    projects: Vec<Value>,
}

/// Decodes a catalog response body.
///
/// The body must be an object with a `projects` array. Individual entries
/// are kept even when malformed; the reconciliation engine skips them.
///
/// # Errors
///
/// Returns [`CatalogError::Decode`] if the body is not JSON, or if
/// `projects` is missing or not an array.
pub fn parse_catalog_body(body: &str) -> Result<Vec<RemoteProject>, CatalogError> {
    let decoded: CatalogBody =
        serde_json::from_str(body).map_err(|e| CatalogError::Decode(e.to_string()))?;

    Ok(decoded
        .projects
        .into_iter()
        .map(RemoteProject::from_value)
        .collect())
}

/// Catalog client for the lndr project API.
///
/// Sends `Authorization: Token token=<token>` when a token is configured.
/// Transport failures, 429 and 5xx responses are retried with exponential
/// backoff; rejected credentials and undecodable bodies fail immediately.
pub struct HttpCatalog {
    client: Client,
    endpoint: String,
    token: Option<String>,
    attempts: usize,
}

impl HttpCatalog {
    /// Creates a client for `endpoint`.
    ///
    /// `attempts` counts the first request; values below 1 are treated as 1.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Transport`] if the HTTP client cannot be built.
    pub fn new(
        endpoint: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
        attempts: usize,
    ) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CatalogError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            token,
            attempts: attempts.max(1),
        })
    }

    /// Builds the client from service configuration.
    ///
    /// Debug mode reads the sample service on the owned domain and sends no
    /// credentials.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Transport`] if no endpoint is configured or
    /// the HTTP client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self, CatalogError> {
        let endpoint = config.catalog_url().ok_or_else(|| {
            CatalogError::Transport("no catalog endpoint configured".to_string())
        })?;
        let token = if config.lndr_debug_mode {
            None
        } else {
            config.lndr_token.clone()
        };

        Self::new(
            endpoint,
            token,
            Duration::from_secs(config.catalog_timeout_seconds),
            config.catalog_retry_attempts,
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn fetch_once(&self) -> Result<Vec<RemoteProject>, CatalogError> {
        debug!(url = %self.endpoint, "Requesting catalog");

        let mut request = self
            .client
            .get(&self.endpoint)
            .header(ACCEPT, "application/json");
        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("Token token={token}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| CatalogError::Transport(e.to_string()))?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(CatalogError::Unauthorized(response.status().as_u16()))
            }
            status if status.is_success() => {
                let body = response
                    .text()
                    .await
                    .map_err(|e| CatalogError::Transport(e.to_string()))?;
                parse_catalog_body(&body)
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(CatalogError::Status {
                    status: status.as_u16(),
                    body: body.chars().take(MAX_ERROR_BODY).collect(),
                })
            }
        }
    }
}

#[async_trait]
impl RemoteCatalog for HttpCatalog {
    async fn fetch(&self) -> Result<Vec<RemoteProject>, CatalogError> {
        let strategy = ExponentialBackoff::from_millis(2)
            .factor(100)
            .max_delay(Duration::from_secs(5))
            .map(jitter)
            .take(self.attempts - 1);

        RetryIf::spawn(
            strategy,
            || self.fetch_once(),
            |e: &CatalogError| {
                let retry = e.is_retryable();
                if retry {
                    warn!(error = %e, "Catalog request failed, retrying");
                }
                retry
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::SkipReason;

    #[test]
    fn test_parse_catalog_body() {
        let projects = parse_catalog_body(
            r#"{"projects": [
                {"id": 42, "publish_url": "https://site.test/p1", "origin_url": "https://cdn.test/42"},
                {"id": "abc", "publish_url": "https://other.test/x"}
            ]}"#,
        )
        .unwrap();

        assert_eq!(projects.len(), 2);
        assert_eq!(projects[0].raw_id().as_deref(), Some("42"));
        assert_eq!(
            projects[1].validate().unwrap().publish_url,
            "https://other.test/x"
        );
    }

    #[test]
    fn test_parse_keeps_malformed_entries() {
        let projects =
            parse_catalog_body(r#"{"projects": [{"publish_url": "https://site.test/a"}, 7]}"#)
                .unwrap();

        assert_eq!(projects.len(), 2);
        assert_eq!(projects[0].validate(), Err(SkipReason::MissingId));
        assert_eq!(projects[1].validate(), Err(SkipReason::MissingId));
    }

    #[test]
    fn test_parse_empty_catalog() {
        assert!(parse_catalog_body(r#"{"projects": []}"#).unwrap().is_empty());
    }

    #[test]
    fn test_parse_rejects_missing_projects() {
        assert!(matches!(
            parse_catalog_body(r#"{"items": []}"#),
            Err(CatalogError::Decode(_))
        ));
        assert!(matches!(
            parse_catalog_body(r#"{"projects": null}"#),
            Err(CatalogError::Decode(_))
        ));
        assert!(matches!(
            parse_catalog_body("<html>"),
            Err(CatalogError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        let catalog = HttpCatalog::new(
            "http://127.0.0.1:1/projects",
            None,
            Duration::from_secs(2),
            1,
        )
        .unwrap();

        let result = catalog.fetch().await;

        assert!(matches!(result, Err(CatalogError::Transport(_))));
    }
}
