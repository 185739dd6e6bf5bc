use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use fleetgate_application::Caller;
use fleetgate_core::UserId;

use crate::dto::{
    AddMemberRequest, ChangeRoleRequest, GrantPermissionsRequest, ProfileResponse,
    SetActiveRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_profiles_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> ApiResult<Json<Vec<ProfileResponse>>> {
    let profiles = state
        .profile_service
        .list_profiles(&caller)
        .await?
        .into_iter()
        .map(ProfileResponse::from)
        .collect();

    Ok(Json(profiles))
}

pub async fn add_member_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(payload): Json<AddMemberRequest>,
) -> ApiResult<(StatusCode, Json<ProfileResponse>)> {
    let profile = state
        .profile_service
        .add_member(&caller, payload.into_input()?)
        .await?;

    Ok((StatusCode::CREATED, Json(ProfileResponse::from(profile))))
}

pub async fn change_role_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(user_id): Path<String>,
    Json(payload): Json<ChangeRoleRequest>,
) -> ApiResult<Json<ProfileResponse>> {
    let profile = state
        .profile_service
        .change_role(&caller, UserId::parse(user_id.as_str())?, payload.role()?)
        .await?;

    Ok(Json(ProfileResponse::from(profile)))
}

pub async fn grant_permissions_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(user_id): Path<String>,
    Json(payload): Json<GrantPermissionsRequest>,
) -> ApiResult<Json<ProfileResponse>> {
    let profile = state
        .profile_service
        .grant_permissions(
            &caller,
            UserId::parse(user_id.as_str())?,
            payload.permissions.as_slice(),
        )
        .await?;

    Ok(Json(ProfileResponse::from(profile)))
}

pub async fn set_active_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(user_id): Path<String>,
    Json(payload): Json<SetActiveRequest>,
) -> ApiResult<Json<ProfileResponse>> {
    let profile = state
        .profile_service
        .set_active(&caller, UserId::parse(user_id.as_str())?, payload.is_active)
        .await?;

    Ok(Json(ProfileResponse::from(profile)))
}
