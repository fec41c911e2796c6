//! Handlers for alias endpoints.

use axum::{Json, extract::State, http::StatusCode};
use validator::Validate;

use crate::api::dto::alias::{AliasItem, AliasListResponse, ReserveRequest, ReserveResponse};
use crate::error::AppError;
use crate::state::AppState;

/// Lists every alias in the `/lndr/` namespace.
///
/// # Endpoint
///
/// `GET /api/aliases`
pub async fn alias_list_handler(
    State(state): State<AppState>,
) -> Result<Json<AliasListResponse>, AppError> {
    let records = state.alias_service.list_namespace().await?;

    let items: Vec<AliasItem> = records
        .into_iter()
        .map(|(record, source)| AliasItem::new(record, &source))
        .collect();
    let placeholders = items.iter().filter(|i| i.placeholder).count();

    Ok(Json(AliasListResponse {
        total: items.len(),
        placeholders,
        items,
    }))
}

/// Reserves an alias with a placeholder record.
///
/// # Endpoint
///
/// `POST /api/reservations`
///
/// # Errors
///
/// Returns 400 if the alias is not a valid path.
/// Returns 409 if the alias is already taken.
pub async fn reserve_alias_handler(
    State(state): State<AppState>,
    Json(payload): Json<ReserveRequest>,
) -> Result<(StatusCode, Json<ReserveResponse>), AppError> {
    payload.validate()?;

    let record = state.alias_service.reserve(&payload.alias).await?;

    Ok((
        StatusCode::CREATED,
        Json(ReserveResponse {
            pid: record.pid,
            alias: record.alias,
            source: record.source,
        }),
    ))
}
