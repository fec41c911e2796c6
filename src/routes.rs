//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /health`  - Health check: alias store, last sync (public)
//! - `GET  /sync`    - Visitor-triggered sync with redirect (public, rate limited)
//! - `/api/*`        - Admin API (Bearer token required)
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Rate limiting** - Per-IP token bucket (configurable for proxy deployments)
//! - **Authentication** - Bearer token on `/api`
//! - **Path normalization** - Trailing slash handling

use crate::api;
use crate::api::handlers::{health_handler, reservation_sync_handler};
use crate::api::middleware::{auth, rate_limit, tracing};
use crate::state::AppState;
use axum::routing::get;
use axum::{Router, middleware};
use tower::Layer;
use tower_governor::key_extractor::{PeerIpKeyExtractor, SmartIpKeyExtractor};
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Constructs the application router with all routes and middleware.
///
/// # Arguments
///
/// - `state` - shared application state injected into all handlers
/// - `behind_proxy` - when `true`, rate limiting reads client IP from
///   `X-Forwarded-For` / `X-Real-IP` headers instead of the peer socket address;
///   enable only when the service runs behind a trusted reverse proxy
pub fn app_router(state: AppState, behind_proxy: bool) -> NormalizePath<Router> {
    let api_router = api::routes::protected_routes()
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::layer));

    let sync_router = Router::new().route("/sync", get(reservation_sync_handler));

    let (api_router, sync_router) = if behind_proxy {
        (
            api_router.layer(rate_limit::secure_layer(SmartIpKeyExtractor)),
            sync_router.layer(rate_limit::layer(SmartIpKeyExtractor)),
        )
    } else {
        (
            api_router.layer(rate_limit::secure_layer(PeerIpKeyExtractor)),
            sync_router.layer(rate_limit::layer(PeerIpKeyExtractor)),
        )
    };

    let router = Router::new()
        .route("/health", get(health_handler))
        .merge(sync_router)
        .nest("/api", api_router)
        .with_state(state)
        .layer(tracing::layer());

    NormalizePathLayer::trim_trailing_slash().layer(router)
}
