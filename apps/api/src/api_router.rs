use axum::Router;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method};
use axum::middleware::from_fn_with_state;
use axum::routing::{delete, get, post, put};
use fleetgate_core::AppError;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tower_sessions::SessionManagerLayer;
use tower_sessions_sqlx_store::PostgresStore;

use crate::state::AppState;
use crate::{auth, handlers, middleware};

/// Builds the HTTP surface. Everything except health and session sign-in requires a session.
pub fn build_router(
    app_state: AppState,
    session_layer: SessionManagerLayer<PostgresStore>,
) -> Result<Router, AppError> {
    let protected_routes = Router::new()
        .route("/auth/me", get(auth::me_handler))
        .route("/auth/signup", post(auth::signup_handler))
        .route(
            "/api/vehicles",
            get(handlers::vehicles::list_vehicles_handler)
                .post(handlers::vehicles::register_vehicle_handler),
        )
        .route(
            "/api/vehicles/{vehicle_id}/status",
            put(handlers::vehicles::change_vehicle_status_handler),
        )
        .route(
            "/api/drivers",
            get(handlers::drivers::list_drivers_handler)
                .post(handlers::drivers::register_driver_handler),
        )
        .route(
            "/api/drivers/{driver_id}/status",
            put(handlers::drivers::change_driver_status_handler),
        )
        .route(
            "/api/drivers/{driver_id}/documents",
            get(handlers::documents::list_driver_documents_handler),
        )
        .route(
            "/api/drivers/{driver_id}/documents/upload",
            post(handlers::documents::prepare_upload_handler),
        )
        .route(
            "/api/documents/{document_id}",
            delete(handlers::documents::delete_document_handler),
        )
        .route(
            "/api/assignments",
            get(handlers::assignments::list_assignments_handler)
                .post(handlers::assignments::create_assignment_handler),
        )
        .route(
            "/api/assignments/{assignment_id}",
            get(handlers::assignments::get_assignment_handler),
        )
        .route(
            "/api/assignments/{assignment_id}/end",
            post(handlers::assignments::end_assignment_handler),
        )
        .route(
            "/api/profiles",
            get(handlers::profiles::list_profiles_handler)
                .post(handlers::profiles::add_member_handler),
        )
        .route(
            "/api/profiles/{user_id}/role",
            put(handlers::profiles::change_role_handler),
        )
        .route(
            "/api/profiles/{user_id}/permissions",
            post(handlers::profiles::grant_permissions_handler),
        )
        .route(
            "/api/profiles/{user_id}/active",
            put(handlers::profiles::set_active_handler),
        )
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_auth,
        ));

    let cors_layer = build_cors_layer(app_state.frontend_url.as_str())?;

    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route("/auth/session", post(auth::session_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .merge(protected_routes)
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_same_origin_for_mutations,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .layer(session_layer)
        .with_state(app_state))
}

fn build_cors_layer(frontend_url: &str) -> Result<CorsLayer, AppError> {
    Ok(CorsLayer::new()
        .allow_origin(
            HeaderValue::from_str(frontend_url)
                .map_err(|error| AppError::Internal(format!("invalid FRONTEND_URL: {error}")))?,
        )
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE]))
}
