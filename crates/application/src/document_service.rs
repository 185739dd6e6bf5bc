use std::sync::Arc;

use chrono::{DateTime, Utc};
use fleetgate_core::{AppError, AppResult};
use fleetgate_domain::{
    Action, AuditAction, Document, DocumentId, DocumentStatus, Driver, DriverId, Permission,
    Profile, Resource,
};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    AccessDenied, AuditEvent, AuditRepository, AuthorizationGuard, Caller, DocumentRepository,
    FleetRepository, StorageCapability, UploadTarget,
};

const MAX_FILE_NAME_LENGTH: usize = 128;

/// Reason an upload was refused at the gate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadRefusal {
    /// The guard refused the caller.
    #[error("access denied")]
    Denied(AccessDenied),
    /// Documents may only be attached to active drivers.
    #[error("driver is not active")]
    DriverInactive,
}

impl From<UploadRefusal> for AppError {
    fn from(value: UploadRefusal) -> Self {
        match value {
            UploadRefusal::Denied(denied) => denied.into(),
            UploadRefusal::DriverInactive => {
                AppError::Conflict("driver is not active".to_owned())
            }
        }
    }
}

/// Upload request for a driver document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrepareUploadInput {
    /// File name as chosen by the client.
    pub file_name: String,
    /// MIME type of the file.
    pub content_type: String,
    /// Document type, e.g. `license`.
    pub document_type: String,
    /// Expiry date printed on the document.
    pub expiry_date: Option<DateTime<Utc>>,
}

/// Result of a prepared upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedUpload {
    /// Persisted metadata.
    pub document: Document,
    /// Destination the client uploads the file to.
    pub target: UploadTarget,
}

/// Document together with the status derived at read time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentView {
    /// Stored metadata.
    pub document: Document,
    /// Status at the time of the read.
    pub status: DocumentStatus,
}

/// Application service gating driver documents.
#[derive(Clone)]
pub struct DocumentService {
    guard: AuthorizationGuard,
    fleet_repository: Arc<dyn FleetRepository>,
    document_repository: Arc<dyn DocumentRepository>,
    storage: Arc<dyn StorageCapability>,
    audit_repository: Arc<dyn AuditRepository>,
}

impl DocumentService {
    /// Creates a new document service.
    #[must_use]
    pub fn new(
        guard: AuthorizationGuard,
        fleet_repository: Arc<dyn FleetRepository>,
        document_repository: Arc<dyn DocumentRepository>,
        storage: Arc<dyn StorageCapability>,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            guard,
            fleet_repository,
            document_repository,
            storage,
            audit_repository,
        }
    }

    /// Decides whether the caller may attach a document to `driver`.
    pub fn authorize_upload<'a>(
        &self,
        caller: &'a Caller,
        driver: &Driver,
    ) -> Result<&'a Profile, UploadRefusal> {
        let actor = self
            .guard
            .require(
                caller,
                Permission::new(Resource::Documents, Action::Create),
                Some(driver.company_id()),
            )
            .map_err(UploadRefusal::Denied)?;

        if !driver.status().can_hold_assignment() {
            return Err(UploadRefusal::DriverInactive);
        }

        Ok(actor)
    }

    /// Gates an upload, records the document metadata and issues a storage target for it.
    pub async fn prepare_upload(
        &self,
        caller: &Caller,
        driver_id: DriverId,
        input: PrepareUploadInput,
    ) -> AppResult<PreparedUpload> {
        let driver = self.load_driver(caller, driver_id, Action::Create).await?;
        let actor = self.authorize_upload(caller, &driver)?;

        let path = storage_path(&driver, &input.file_name)?;
        let document = Document::new(
            DocumentId::new(),
            driver.id(),
            driver.company_id(),
            path.as_str(),
            input.document_type,
            input.expiry_date,
        )?;

        self.document_repository
            .insert_document(document.clone())
            .await?;
        let target = match self
            .storage
            .issue_upload_target(path.as_str(), input.content_type.trim())
            .await
        {
            Ok(target) => target,
            Err(error) => {
                let removed = self.document_repository.delete_document(document.id()).await;
                if let Err(cleanup) = removed {
                    warn!(
                        document_id = %document.id(),
                        error = %cleanup,
                        "failed to remove document metadata after refused upload target"
                    );
                }
                return Err(error);
            }
        };

        info!(
            document_id = %document.id(),
            driver_id = %driver.id(),
            company_id = %driver.company_id(),
            "document upload prepared"
        );

        self.record(actor, &document, AuditAction::DocumentUploadPrepared)
            .await;

        Ok(PreparedUpload { document, target })
    }

    /// Lists the documents of a driver with statuses derived at `now`.
    pub async fn list_for_driver(
        &self,
        caller: &Caller,
        driver_id: DriverId,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<DocumentView>> {
        let driver = self.load_driver(caller, driver_id, Action::Read).await?;
        self.guard.require(
            caller,
            Permission::new(Resource::Documents, Action::Read),
            Some(driver.company_id()),
        )?;

        let documents = self.document_repository.list_for_driver(driver_id).await?;
        Ok(documents
            .into_iter()
            .map(|document| DocumentView {
                status: document.status_at(now),
                document,
            })
            .collect())
    }

    /// Deletes document metadata.
    pub async fn delete(&self, caller: &Caller, document_id: DocumentId) -> AppResult<()> {
        let document = self.document_repository.find_document(document_id).await?;
        let actor = self.guard.require(
            caller,
            Permission::new(Resource::Documents, Action::Delete),
            document.as_ref().map(Document::company_id),
        )?;
        let document = document.ok_or_else(|| {
            AppError::NotFound(format!("document '{document_id}' does not exist"))
        })?;

        if !self.document_repository.delete_document(document_id).await? {
            return Err(AppError::NotFound(format!(
                "document '{document_id}' does not exist"
            )));
        }

        info!(document_id = %document_id, company_id = %document.company_id(), "document deleted");
        self.record(actor, &document, AuditAction::DocumentDeleted)
            .await;

        Ok(())
    }

    async fn load_driver(
        &self,
        caller: &Caller,
        driver_id: DriverId,
        action: Action,
    ) -> AppResult<Driver> {
        match self.fleet_repository.find_driver(driver_id).await? {
            Some(driver) => Ok(driver),
            None => {
                self.guard.require(
                    caller,
                    Permission::new(Resource::Documents, action),
                    None,
                )?;
                Err(AppError::NotFound(format!(
                    "driver '{driver_id}' does not exist"
                )))
            }
        }
    }

    async fn record(&self, actor: &Profile, document: &Document, action: AuditAction) {
        let event = AuditEvent {
            company_id: document.company_id(),
            actor: actor.user_id(),
            action,
            resource_type: "document".to_owned(),
            resource_id: document.id().to_string(),
            detail: Some(document.document_type().as_str().to_owned()),
        };

        if let Err(error) = self.audit_repository.append_event(event).await {
            warn!(
                document_id = %document.id(),
                action = action.as_str(),
                error = %error,
                "failed to append audit event"
            );
        }
    }
}

/// Builds `{company_id}/{driver_id}/{uuid}-{file name}` with the file name reduced to a safe
/// character set.
fn storage_path(driver: &Driver, file_name: &str) -> AppResult<String> {
    let sanitized = sanitize_file_name(file_name);
    if sanitized.is_empty() {
        return Err(AppError::Validation(
            "file name must contain at least one letter or digit".to_owned(),
        ));
    }

    Ok(format!(
        "{}/{}/{}-{sanitized}",
        driver.company_id(),
        driver.id(),
        Uuid::new_v4()
    ))
}

fn sanitize_file_name(file_name: &str) -> String {
    let base_name = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    let sanitized: String = base_name
        .chars()
        .map(|character| {
            if character.is_ascii_alphanumeric() || matches!(character, '.' | '-' | '_') {
                character
            } else {
                '_'
            }
        })
        .take(MAX_FILE_NAME_LENGTH)
        .collect();

    let sanitized = sanitized.trim_start_matches('.');
    if sanitized.chars().any(|character| character.is_ascii_alphanumeric()) {
        sanitized.to_owned()
    } else {
        String::new()
    }
}

#[cfg(test)]
mod tests;
