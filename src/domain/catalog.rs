//! Remote page catalog contract.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::RemoteProject;

/// Errors returned by a catalog fetch.
///
/// Any of these aborts the sync run before the alias table is touched.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("catalog request failed: {0}")]
    Transport(String),

    #[error("catalog rejected credentials (HTTP {0})")]
    Unauthorized(u16),

    #[error("catalog returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("catalog response could not be decoded: {0}")]
    Decode(String),
}

impl CatalogError {
    /// Transport failures, rate limiting and server errors are worth retrying.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Unauthorized(_) | Self::Decode(_) => false,
        }
    }
}

/// Source of the current remote project list.
///
/// A successful fetch with zero projects is a valid answer and means every
/// owned record is now an orphan; failures must be reported as errors.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteCatalog: Send + Sync {
    /// Fetches the full project list.
    async fn fetch(&self) -> Result<Vec<RemoteProject>, CatalogError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(CatalogError::Transport("timeout".to_string()).is_retryable());
        assert!(
            CatalogError::Status {
                status: 503,
                body: String::new()
            }
            .is_retryable()
        );
        assert!(
            CatalogError::Status {
                status: 429,
                body: String::new()
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_permanent_errors() {
        assert!(!CatalogError::Unauthorized(401).is_retryable());
        assert!(!CatalogError::Decode("eof".to_string()).is_retryable());
        assert!(
            !CatalogError::Status {
                status: 404,
                body: String::new()
            }
            .is_retryable()
        );
    }
}
