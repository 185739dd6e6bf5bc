use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use fleetgate_application::Caller;
use fleetgate_domain::AssignmentId;

use crate::dto::{
    AssignmentListParams, AssignmentResponse, CreateAssignmentRequest, EndAssignmentRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_assignments_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Query(params): Query<AssignmentListParams>,
) -> ApiResult<Json<Vec<AssignmentResponse>>> {
    let (company_id, query) = params.into_query()?;
    let assignments = state
        .assignment_ledger
        .list(&caller, company_id, query)
        .await?
        .into_iter()
        .map(AssignmentResponse::from)
        .collect();

    Ok(Json(assignments))
}

pub async fn create_assignment_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(payload): Json<CreateAssignmentRequest>,
) -> ApiResult<(StatusCode, Json<AssignmentResponse>)> {
    let assignment = state
        .assignment_ledger
        .create(&caller, payload.into_input()?)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AssignmentResponse::from(assignment)),
    ))
}

pub async fn get_assignment_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(assignment_id): Path<String>,
) -> ApiResult<Json<AssignmentResponse>> {
    let assignment = state
        .assignment_ledger
        .get(&caller, AssignmentId::parse(assignment_id.as_str())?)
        .await?;

    Ok(Json(AssignmentResponse::from(assignment)))
}

/// Ends an assignment. The body is optional; an empty one ends it now without notes.
pub async fn end_assignment_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(assignment_id): Path<String>,
    payload: Option<Json<EndAssignmentRequest>>,
) -> ApiResult<Json<AssignmentResponse>> {
    let input = payload
        .map(|Json(payload)| payload)
        .unwrap_or_default()
        .into_input()?;
    let assignment = state
        .assignment_ledger
        .end(&caller, AssignmentId::parse(assignment_id.as_str())?, input)
        .await?;

    Ok(Json(AssignmentResponse::from(assignment)))
}
