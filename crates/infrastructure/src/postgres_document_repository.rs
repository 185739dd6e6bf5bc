use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fleetgate_application::DocumentRepository;
use fleetgate_core::{AppError, AppResult, CompanyId};
use fleetgate_domain::{Document, DocumentId, DriverId};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// PostgreSQL-backed driver document metadata repository.
#[derive(Clone)]
pub struct PostgresDocumentRepository {
    pool: PgPool,
}

impl PostgresDocumentRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct DocumentRow {
    id: Uuid,
    driver_id: Uuid,
    company_id: Uuid,
    file_path: String,
    document_type: String,
    expiry_date: Option<DateTime<Utc>>,
}

impl TryFrom<DocumentRow> for Document {
    type Error = AppError;

    fn try_from(row: DocumentRow) -> AppResult<Self> {
        Document::new(
            DocumentId::from_uuid(row.id),
            DriverId::from_uuid(row.driver_id),
            CompanyId::from_uuid(row.company_id),
            row.file_path,
            row.document_type,
            row.expiry_date,
        )
    }
}

#[async_trait]
impl DocumentRepository for PostgresDocumentRepository {
    async fn insert_document(&self, document: Document) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO documents (id, driver_id, company_id, file_path, document_type, expiry_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(document.id().as_uuid())
        .bind(document.driver_id().as_uuid())
        .bind(document.company_id().as_uuid())
        .bind(document.file_path().as_str())
        .bind(document.document_type().as_str())
        .bind(document.expiry_date())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to insert document: {error}")))?;

        Ok(())
    }

    async fn find_document(&self, document_id: DocumentId) -> AppResult<Option<Document>> {
        let row = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT id, driver_id, company_id, file_path, document_type, expiry_date
            FROM documents
            WHERE id = $1
            "#,
        )
        .bind(document_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load document: {error}")))?;

        row.map(Document::try_from).transpose()
    }

    async fn list_for_driver(&self, driver_id: DriverId) -> AppResult<Vec<Document>> {
        let rows = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT id, driver_id, company_id, file_path, document_type, expiry_date
            FROM documents
            WHERE driver_id = $1
            ORDER BY expiry_date ASC NULLS LAST, created_at, id
            "#,
        )
        .bind(driver_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list documents: {error}")))?;

        rows.into_iter().map(Document::try_from).collect()
    }

    async fn delete_document(&self, document_id: DocumentId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE id = $1")
            .bind(document_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to delete document: {error}")))?;

        Ok(result.rows_affected() == 1)
    }
}
