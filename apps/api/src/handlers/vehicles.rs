use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use fleetgate_application::Caller;
use fleetgate_domain::VehicleId;

use crate::dto::{
    ChangeVehicleStatusRequest, CompanyScopeQuery, RegisterVehicleRequest, VehicleResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_vehicles_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Query(scope): Query<CompanyScopeQuery>,
) -> ApiResult<Json<Vec<VehicleResponse>>> {
    let vehicles = state
        .fleet_service
        .list_vehicles(&caller, scope.company_id()?)
        .await?
        .into_iter()
        .map(VehicleResponse::from)
        .collect();

    Ok(Json(vehicles))
}

pub async fn register_vehicle_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(payload): Json<RegisterVehicleRequest>,
) -> ApiResult<(StatusCode, Json<VehicleResponse>)> {
    let vehicle = state
        .fleet_service
        .register_vehicle(&caller, payload.into_input()?)
        .await?;

    Ok((StatusCode::CREATED, Json(VehicleResponse::from(vehicle))))
}

pub async fn change_vehicle_status_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(vehicle_id): Path<String>,
    Json(payload): Json<ChangeVehicleStatusRequest>,
) -> ApiResult<Json<VehicleResponse>> {
    let vehicle = state
        .fleet_service
        .change_vehicle_status(
            &caller,
            VehicleId::parse(vehicle_id.as_str())?,
            payload.status()?,
        )
        .await?;

    Ok(Json(VehicleResponse::from(vehicle)))
}
