//! Shared application state for HTTP handlers.

use std::sync::Arc;

use crate::application::services::{
    AliasService, AuthService, SharedAliasService, SharedSyncService, SyncService,
};
use crate::domain::catalog::RemoteCatalog;
use crate::domain::repositories::AliasRepository;

/// Services shared by all handlers.
///
/// Collaborators are type-erased so the same router serves the PostgreSQL
/// store in production and the in-memory store in tests.
#[derive(Clone)]
pub struct AppState {
    pub sync_service: Arc<SharedSyncService>,
    pub alias_service: Arc<SharedAliasService>,
    pub auth_service: Arc<AuthService>,
}

impl AppState {
    /// Wires the services around one catalog and one alias store.
    ///
    /// # Arguments
    ///
    /// - `catalog` - remote page catalog
    /// - `repository` - alias store
    /// - `base_url` - owned domain
    /// - `auth_service` - admin token check
    pub fn new(
        catalog: Arc<dyn RemoteCatalog>,
        repository: Arc<dyn AliasRepository>,
        base_url: &str,
        auth_service: AuthService,
    ) -> Self {
        Self {
            sync_service: Arc::new(SyncService::new(catalog, repository.clone(), base_url)),
            alias_service: Arc::new(AliasService::new(repository, base_url)),
            auth_service: Arc::new(auth_service),
        }
    }
}
