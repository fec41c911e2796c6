//! Business logic services for the application layer.

pub mod alias_service;
pub mod auth_service;
pub mod sync_service;

pub use alias_service::AliasService;
pub use auth_service::AuthService;
pub use sync_service::{SyncReport, SyncService, SyncTrigger};

use crate::domain::catalog::RemoteCatalog;
use crate::domain::repositories::AliasRepository;

/// Sync service over type-erased collaborators, as held by the app state.
pub type SharedSyncService = SyncService<dyn RemoteCatalog, dyn AliasRepository>;

/// Alias service over a type-erased store, as held by the app state.
pub type SharedAliasService = AliasService<dyn AliasRepository>;
