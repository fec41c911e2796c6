//! HTTP server initialization and runtime setup.
//!
//! Handles the database pool, migrations, the catalog client, the sync
//! scheduler and the Axum server lifecycle.

use crate::application::scheduler::run_sync_scheduler;
use crate::application::services::AuthService;
use crate::config::Config;
use crate::domain::catalog::RemoteCatalog;
use crate::domain::repositories::AliasRepository;
use crate::infrastructure::catalog::HttpCatalog;
use crate::infrastructure::persistence::PgAliasRepository;
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

/// Opens the PostgreSQL pool using the configured pool settings.
///
/// # Errors
///
/// Returns an error if the database is unreachable.
pub async fn connect_pool(config: &Config) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")
}

/// Builds the application state around PostgreSQL and the HTTP catalog.
///
/// # Errors
///
/// Returns an error if the catalog client cannot be built.
pub fn build_state(config: &Config, pool: PgPool) -> Result<AppState> {
    let repository: Arc<dyn AliasRepository> = Arc::new(PgAliasRepository::new(Arc::new(pool)));
    let catalog: Arc<dyn RemoteCatalog> =
        Arc::new(HttpCatalog::from_config(config).context("Failed to build catalog client")?);
    let auth_service = AuthService::new(
        config.admin_api_token.as_deref(),
        config.token_signing_secret.clone(),
    );

    Ok(AppState::new(catalog, repository, &config.base_url, auth_service))
}

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - PostgreSQL connection pool
/// - Apply migrations
/// - Catalog client and services
/// - Background sync scheduler (unless `SYNC_INTERVAL_SECONDS=0`)
/// - Axum HTTP server with graceful shutdown on Ctrl+C
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let pool = connect_pool(&config).await?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to migrate")?;

    let state = build_state(&config, pool)?;

    match state.auth_service.token_fingerprint() {
        Some(fingerprint) => tracing::info!(%fingerprint, "Admin API enabled"),
        None => tracing::warn!("ADMIN_API_TOKEN not set, admin API rejects all requests"),
    }

    if config.is_scheduler_enabled() {
        tokio::spawn(run_sync_scheduler(
            state.sync_service.clone(),
            Duration::from_secs(config.sync_interval_seconds),
        ));
    } else {
        tracing::info!("Scheduled sync disabled");
    }

    let app = app_router(state, config.behind_proxy);

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
