use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use chrono::Utc;
use fleetgate_application::Caller;
use fleetgate_domain::{DocumentId, DriverId};

use crate::dto::{DocumentResponse, PrepareUploadRequest, PreparedUploadResponse};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_driver_documents_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(driver_id): Path<String>,
) -> ApiResult<Json<Vec<DocumentResponse>>> {
    let documents = state
        .document_service
        .list_for_driver(&caller, DriverId::parse(driver_id.as_str())?, Utc::now())
        .await?
        .into_iter()
        .map(DocumentResponse::from)
        .collect();

    Ok(Json(documents))
}

pub async fn prepare_upload_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(driver_id): Path<String>,
    Json(payload): Json<PrepareUploadRequest>,
) -> ApiResult<(StatusCode, Json<PreparedUploadResponse>)> {
    let prepared = state
        .document_service
        .prepare_upload(
            &caller,
            DriverId::parse(driver_id.as_str())?,
            payload.into_input()?,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(PreparedUploadResponse::new(prepared, Utc::now())),
    ))
}

pub async fn delete_document_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(document_id): Path<String>,
) -> ApiResult<StatusCode> {
    state
        .document_service
        .delete(&caller, DocumentId::parse(document_id.as_str())?)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
