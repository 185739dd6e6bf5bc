//! Fleetgate API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod auth;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use std::sync::Arc;

use fleetgate_application::AuthorizationGuard;
use fleetgate_core::AppError;
use fleetgate_domain::PermissionCatalog;
use fleetgate_infrastructure::{
    PostgresAssignmentRepository, PostgresAuditRepository, PostgresDocumentRepository,
    PostgresFleetRepository, PostgresProfileRepository, SignedUrlStorage,
};
use sqlx::postgres::PgPoolOptions;
use tower_sessions::cookie::SameSite;
use tower_sessions::cookie::time::Duration;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;
use tracing::info;

use crate::api_config::{ApiConfig, init_tracing};
use crate::state::{AppPorts, AppState};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))?;

    sqlx::migrate!("../../crates/infrastructure/migrations")
        .run(&pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;

    if config.migrate_only {
        info!("database migrations applied successfully");
        return Ok(());
    }

    let session_store = PostgresStore::new(pool.clone())
        .with_table_name("tower_sessions")
        .map_err(|error| {
            AppError::Validation(format!("invalid session table name configuration: {error}"))
        })?;
    session_store.migrate().await.map_err(|error| {
        AppError::Internal(format!("failed to initialize session store: {error}"))
    })?;

    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(config.cookie_secure)
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_expiry(Expiry::OnInactivity(Duration::minutes(30)));

    // Refuses to start on a catalog missing a role.
    let guard = AuthorizationGuard::new(PermissionCatalog::standard())?;

    let storage = SignedUrlStorage::new(
        config.storage_base_url.as_str(),
        config.storage_signing_secret.as_str(),
        config.storage_upload_ttl,
    )?;

    let ports = AppPorts {
        profile_repository: Arc::new(PostgresProfileRepository::new(pool.clone())),
        fleet_repository: Arc::new(PostgresFleetRepository::new(pool.clone())),
        assignment_repository: Arc::new(PostgresAssignmentRepository::new(pool.clone())),
        document_repository: Arc::new(PostgresDocumentRepository::new(pool.clone())),
        audit_repository: Arc::new(PostgresAuditRepository::new(pool)),
        storage: Arc::new(storage),
    };

    let app_state = AppState::new(
        guard,
        ports,
        config.frontend_url.clone(),
        config.bootstrap_token.clone(),
    );
    let app = api_router::build_router(app_state, session_layer)?;

    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "fleetgate-api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}
