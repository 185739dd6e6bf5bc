use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use fleetgate_application::Caller;
use fleetgate_domain::DriverId;

use crate::dto::{
    ChangeDriverStatusRequest, CompanyScopeQuery, DriverResponse, RegisterDriverRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_drivers_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Query(scope): Query<CompanyScopeQuery>,
) -> ApiResult<Json<Vec<DriverResponse>>> {
    let drivers = state
        .fleet_service
        .list_drivers(&caller, scope.company_id()?)
        .await?
        .into_iter()
        .map(DriverResponse::from)
        .collect();

    Ok(Json(drivers))
}

pub async fn register_driver_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(payload): Json<RegisterDriverRequest>,
) -> ApiResult<(StatusCode, Json<DriverResponse>)> {
    let driver = state
        .fleet_service
        .register_driver(&caller, payload.into_input()?)
        .await?;

    Ok((StatusCode::CREATED, Json(DriverResponse::from(driver))))
}

pub async fn change_driver_status_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(driver_id): Path<String>,
    Json(payload): Json<ChangeDriverStatusRequest>,
) -> ApiResult<Json<DriverResponse>> {
    let driver = state
        .fleet_service
        .change_driver_status(
            &caller,
            DriverId::parse(driver_id.as_str())?,
            payload.status()?,
        )
        .await?;

    Ok(Json(DriverResponse::from(driver)))
}
