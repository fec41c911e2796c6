#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router, middleware,
    routing::{get, post},
};
use std::sync::{Arc, Mutex};

use lndr_sync::api::handlers::{
    alias_list_handler, health_handler, reservation_sync_handler, reserve_alias_handler,
    sync_plan_handler, trigger_sync_handler,
};
use lndr_sync::api::middleware::auth;
use lndr_sync::application::services::AuthService;
use lndr_sync::domain::catalog::{CatalogError, RemoteCatalog};
use lndr_sync::domain::entities::{AliasRecord, RemoteProject};
use lndr_sync::infrastructure::persistence::MemoryAliasRepository;
use lndr_sync::state::AppState;

pub const BASE_URL: &str = "https://site.test";
pub const ADMIN_TOKEN: &str = "test-admin-token";

/// Catalog returning whatever the test last configured.
pub struct StubCatalog {
    response: Mutex<Result<Vec<RemoteProject>, CatalogError>>,
}

impl StubCatalog {
    pub fn new(projects: Vec<RemoteProject>) -> Self {
        Self {
            response: Mutex::new(Ok(projects)),
        }
    }

    pub fn set_projects(&self, projects: Vec<RemoteProject>) {
        *self.response.lock().unwrap() = Ok(projects);
    }

    pub fn fail_with(&self, error: CatalogError) {
        *self.response.lock().unwrap() = Err(error);
    }
}

#[async_trait]
impl RemoteCatalog for StubCatalog {
    async fn fetch(&self) -> Result<Vec<RemoteProject>, CatalogError> {
        self.response.lock().unwrap().clone()
    }
}

pub struct TestApp {
    pub state: AppState,
    pub store: Arc<MemoryAliasRepository>,
    pub catalog: Arc<StubCatalog>,
}

pub fn create_test_app(records: Vec<AliasRecord>, projects: Vec<RemoteProject>) -> TestApp {
    let store = Arc::new(MemoryAliasRepository::with_records(records));
    let catalog = Arc::new(StubCatalog::new(projects));

    let state = AppState::new(
        catalog.clone(),
        store.clone(),
        BASE_URL,
        AuthService::new(Some(ADMIN_TOKEN), "test-signing-secret".to_string()),
    );

    TestApp {
        state,
        store,
        catalog,
    }
}

/// Same routes as the production router, without rate limiting.
pub fn test_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/sync", post(trigger_sync_handler))
        .route("/sync/plan", get(sync_plan_handler))
        .route("/aliases", get(alias_list_handler))
        .route("/reservations", post(reserve_alias_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::layer));

    Router::new()
        .route("/health", get(health_handler))
        .route("/sync", get(reservation_sync_handler))
        .nest("/api", api)
        .with_state(state)
}

pub fn project(id: i64, publish_url: &str) -> RemoteProject {
    RemoteProject::new(id, publish_url, None)
}
