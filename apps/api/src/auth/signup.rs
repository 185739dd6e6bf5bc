use axum::Json;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use fleetgate_core::SessionUser;

use crate::dto::{CompanyResponse, ProfileResponse, SignUpRequest, SignUpResponse};
use crate::error::ApiResult;
use crate::state::AppState;

/// Creates a company with the signed-in user as its admin.
pub async fn signup_handler(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Json(payload): Json<SignUpRequest>,
) -> ApiResult<(StatusCode, Json<SignUpResponse>)> {
    let (company, profile) = state
        .profile_service
        .sign_up(
            user.user_id(),
            user.display_name(),
            payload.company_name.as_str(),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SignUpResponse {
            company: CompanyResponse::from(company),
            profile: ProfileResponse::from(profile),
        }),
    ))
}
