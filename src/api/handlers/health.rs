//! Handler for health check endpoint.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::health::{CheckStatus, HealthChecks, HealthResponse};
use crate::state::AppState;

/// Returns service health status with component checks.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response Codes
///
/// - **200 OK**: Alias store reachable
/// - **503 Service Unavailable**: Alias store unreachable
///
/// A failing last sync is reported as a `warning` and does not degrade the
/// service: aliases already in the store keep resolving.
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "checks": {
///     "database": { "status": "ok", "message": "Connected, 12 namespace aliases" },
///     "last_sync": { "status": "ok", "message": "scheduled run at 2025-03-01T10:00:00Z applied 2 mutations" }
///   }
/// }
/// ```
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let db_check = check_database(&state).await;
    let sync_check = check_last_sync(&state).await;

    let healthy = db_check.status == "ok";

    let response = HealthResponse {
        status: if healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            database: db_check,
            last_sync: sync_check,
        },
    };

    if healthy {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

/// Checks store connectivity by listing the namespace.
async fn check_database(state: &AppState) -> CheckStatus {
    match state.alias_service.list_namespace().await {
        Ok(records) => CheckStatus {
            status: "ok".to_string(),
            message: Some(format!("Connected, {} namespace aliases", records.len())),
        },
        Err(e) => CheckStatus {
            status: "error".to_string(),
            message: Some(format!("Database error: {}", e)),
        },
    }
}

async fn check_last_sync(state: &AppState) -> CheckStatus {
    match state.sync_service.last_report().await {
        None => CheckStatus {
            status: "pending".to_string(),
            message: Some("No sync has run yet".to_string()),
        },
        Some(report) if report.success => CheckStatus {
            status: "ok".to_string(),
            message: Some(format!(
                "{} run at {} applied {} mutations",
                report.trigger,
                report.finished_at.to_rfc3339(),
                report.applied_count
            )),
        },
        Some(report) => CheckStatus {
            status: "warning".to_string(),
            message: Some(format!(
                "{} run at {} failed: {}",
                report.trigger,
                report.finished_at.to_rfc3339(),
                report.errors.join("; ")
            )),
        },
    }
}
