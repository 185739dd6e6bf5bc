use axum::Json;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use fleetgate_application::Caller;
use fleetgate_core::{AppError, SessionUser, UserId};
use tower_sessions::Session;
use tracing::info;

use crate::dto::{MeResponse, SessionRequest, SessionResponse};
use crate::error::ApiResult;
use crate::state::AppState;

use super::{SESSION_CREATED_AT_KEY, SESSION_USER_KEY};

/// Development sign-in. Stands in for an external identity provider and only accepts the
/// configured bootstrap token.
pub async fn session_handler(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<SessionRequest>,
) -> ApiResult<Json<SessionResponse>> {
    if payload.token != state.bootstrap_token {
        return Err(AppError::Unauthorized("invalid bootstrap token".to_owned()).into());
    }

    let display_name = payload.display_name.trim();
    if display_name.is_empty() {
        return Err(AppError::Validation("display name must not be empty".to_owned()).into());
    }

    let user_id = match payload.user_id.as_deref() {
        Some(user_id) => UserId::parse(user_id)?,
        None => UserId::new(),
    };
    let user = SessionUser::new(user_id, display_name);

    session
        .cycle_id()
        .await
        .map_err(|error| AppError::Internal(format!("failed to cycle session id: {error}")))?;

    session
        .insert(SESSION_USER_KEY, &user)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to persist session identity: {error}"))
        })?;

    session
        .insert(SESSION_CREATED_AT_KEY, chrono::Utc::now().timestamp())
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to persist session creation time: {error}"))
        })?;

    info!(user_id = %user.user_id(), "session started");

    Ok(Json(SessionResponse {
        user_id: user.user_id().to_string(),
        display_name: user.display_name().to_owned(),
    }))
}

pub async fn logout_handler(session: Session) -> ApiResult<StatusCode> {
    session
        .delete()
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete session: {error}")))?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn me_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> ApiResult<Json<MeResponse>> {
    let description = state.profile_service.describe(&caller).await?;

    Ok(Json(MeResponse::from(description)))
}
