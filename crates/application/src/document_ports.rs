use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fleetgate_core::AppResult;
use fleetgate_domain::{Document, DocumentId, DriverId};

/// Repository port for driver document metadata.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Inserts document metadata.
    async fn insert_document(&self, document: Document) -> AppResult<()>;

    /// Loads one document.
    async fn find_document(&self, document_id: DocumentId) -> AppResult<Option<Document>>;

    /// Lists documents of a driver ordered by expiry, documents without expiry last.
    async fn list_for_driver(&self, driver_id: DriverId) -> AppResult<Vec<Document>>;

    /// Deletes document metadata. Returns whether a row was removed.
    async fn delete_document(&self, document_id: DocumentId) -> AppResult<bool>;
}

/// Upload destination issued by the storage backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTarget {
    /// URL the client uploads the file to.
    pub url: String,
    /// Instant after which the URL is rejected.
    pub expires_at: DateTime<Utc>,
}

/// Opaque storage capability that issues upload destinations.
#[async_trait]
pub trait StorageCapability: Send + Sync {
    /// Issues an upload target for a storage path and content type.
    async fn issue_upload_target(&self, path: &str, content_type: &str) -> AppResult<UploadTarget>;
}
