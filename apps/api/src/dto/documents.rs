use chrono::{DateTime, Utc};
use fleetgate_application::{DocumentView, PrepareUploadInput, PreparedUpload};
use fleetgate_core::AppResult;
use fleetgate_domain::Document;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::common::{format_timestamp, parse_optional, parse_timestamp};

#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/prepare-upload-request.ts"
)]
pub struct PrepareUploadRequest {
    pub file_name: String,
    pub content_type: String,
    pub document_type: String,
    /// RFC 3339 expiry, absent for documents that never expire.
    pub expiry_date: Option<String>,
}

impl PrepareUploadRequest {
    pub fn into_input(self) -> AppResult<PrepareUploadInput> {
        Ok(PrepareUploadInput {
            file_name: self.file_name,
            content_type: self.content_type,
            document_type: self.document_type,
            expiry_date: parse_optional(self.expiry_date.as_deref(), parse_timestamp)?,
        })
    }
}

#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/document-response.ts"
)]
pub struct DocumentResponse {
    pub id: String,
    pub driver_id: String,
    pub company_id: String,
    pub file_path: String,
    pub document_type: String,
    pub expiry_date: Option<String>,
    /// `valid`, `expiring_soon` or `expired`, computed when the response was built.
    pub status: String,
}

impl DocumentResponse {
    fn new(document: Document, status: &str) -> Self {
        Self {
            id: document.id().to_string(),
            driver_id: document.driver_id().to_string(),
            company_id: document.company_id().to_string(),
            file_path: document.file_path().as_str().to_owned(),
            document_type: document.document_type().as_str().to_owned(),
            expiry_date: document.expiry_date().map(format_timestamp),
            status: status.to_owned(),
        }
    }
}

impl From<DocumentView> for DocumentResponse {
    fn from(value: DocumentView) -> Self {
        Self::new(value.document, value.status.as_str())
    }
}

#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/prepared-upload-response.ts"
)]
pub struct PreparedUploadResponse {
    pub document: DocumentResponse,
    pub upload_url: String,
    pub upload_expires_at: String,
}

impl PreparedUploadResponse {
    pub fn new(prepared: PreparedUpload, now: DateTime<Utc>) -> Self {
        let status = prepared.document.status_at(now);
        Self {
            document: DocumentResponse::new(prepared.document, status.as_str()),
            upload_url: prepared.target.url,
            upload_expires_at: format_timestamp(prepared.target.expires_at),
        }
    }
}
