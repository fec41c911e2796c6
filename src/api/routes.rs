//! API route configuration.
//!
//! All API endpoints require Bearer token authentication via
//! [`crate::api::middleware::auth`].

use crate::api::handlers::{
    alias_list_handler, reserve_alias_handler, sync_plan_handler, trigger_sync_handler,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

/// All API routes, protected by Bearer token authentication.
///
/// # Endpoints
///
/// - `POST /sync`          - Run a sync now and return its report
/// - `GET  /sync/plan`     - Dry run: mutations, skipped entries, conflicts
/// - `GET  /aliases`       - List the `/lndr/` namespace
/// - `POST /reservations`  - Reserve an alias with a placeholder
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/sync", post(trigger_sync_handler))
        .route("/sync/plan", get(sync_plan_handler))
        .route("/aliases", get(alias_list_handler))
        .route("/reservations", post(reserve_alias_handler))
}
