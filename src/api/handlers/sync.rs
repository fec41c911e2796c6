//! Handlers for sync endpoints.

use axum::{
    Json,
    extract::{Query, State},
    response::Redirect,
};

use crate::api::dto::sync::{PlanResponse, ReservationSyncQuery};
use crate::application::services::{SyncReport, SyncTrigger};
use crate::error::AppError;
use crate::state::AppState;

/// Runs a sync immediately.
///
/// # Endpoint
///
/// `POST /api/sync`
///
/// # Errors
///
/// Returns 502 if the catalog cannot be fetched; the store is left untouched.
/// Per-record failures are listed in the report with `success: false`.
pub async fn trigger_sync_handler(
    State(state): State<AppState>,
) -> Result<Json<SyncReport>, AppError> {
    let report = state.sync_service.run(SyncTrigger::Manual, None).await?;
    Ok(Json(report))
}

/// Shows what a sync would change without applying it.
///
/// # Endpoint
///
/// `GET /api/sync/plan`
pub async fn sync_plan_handler(
    State(state): State<AppState>,
) -> Result<Json<PlanResponse>, AppError> {
    let plan = state.sync_service.plan().await?;
    Ok(Json(PlanResponse::new(
        state.sync_service.owned_domain(),
        plan,
    )))
}

/// Syncs on behalf of a visitor who landed on a reserved alias.
///
/// # Endpoint
///
/// `GET /sync?path=/alias`
///
/// Redirects (303) to the alias on the owned domain once it resolves to a
/// live page, otherwise to the site root. A failed run also ends at the
/// site root; the visitor never sees a sync error.
///
/// # Errors
///
/// Returns 400 if `path` is not a plain alias path.
pub async fn reservation_sync_handler(
    State(state): State<AppState>,
    Query(query): Query<ReservationSyncQuery>,
) -> Result<Redirect, AppError> {
    let path = query
        .path
        .as_deref()
        .map(|p| state.alias_service.resolve_redirect(p))
        .transpose()?;

    let resolved = match state
        .sync_service
        .run(SyncTrigger::Reservation, path.as_deref())
        .await
    {
        Ok(report) => report.reservation_resolved_alias,
        Err(e) => {
            tracing::warn!(error = %e, path = ?path, "Reservation sync failed");
            None
        }
    };

    Ok(Redirect::to(
        &state.alias_service.redirect_url(resolved.as_deref()),
    ))
}
