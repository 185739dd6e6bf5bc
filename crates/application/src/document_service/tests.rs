use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;

use fleetgate_core::{AppError, AppResult, CompanyId, UserId};
use fleetgate_domain::{
    Document, DocumentId, DocumentStatus, Driver, DriverId, DriverStatus, PermissionCatalog,
    Profile, Role, Vehicle, VehicleId, VehicleStatus,
};

use crate::{
    AuditEvent, AuditRepository, AuthorizationGuard, Caller, DocumentRepository, FleetRepository,
    StorageCapability, UploadTarget,
};

use super::{DocumentService, PrepareUploadInput, UploadRefusal, sanitize_file_name};

#[derive(Default)]
struct FakeFleetRepository {
    drivers: Mutex<Vec<Driver>>,
}

#[async_trait]
impl FleetRepository for FakeFleetRepository {
    async fn insert_vehicle(&self, _vehicle: Vehicle) -> AppResult<()> {
        Ok(())
    }

    async fn find_vehicle(&self, _vehicle_id: VehicleId) -> AppResult<Option<Vehicle>> {
        Ok(None)
    }

    async fn list_vehicles(&self, _company_id: CompanyId) -> AppResult<Vec<Vehicle>> {
        Ok(Vec::new())
    }

    async fn update_vehicle_status(
        &self,
        _vehicle_id: VehicleId,
        _expected: VehicleStatus,
        _status: VehicleStatus,
    ) -> AppResult<bool> {
        Ok(false)
    }

    async fn insert_driver(&self, driver: Driver) -> AppResult<()> {
        self.drivers.lock().await.push(driver);
        Ok(())
    }

    async fn find_driver(&self, driver_id: DriverId) -> AppResult<Option<Driver>> {
        Ok(self
            .drivers
            .lock()
            .await
            .iter()
            .find(|driver| driver.id() == driver_id)
            .cloned())
    }

    async fn list_drivers(&self, _company_id: CompanyId) -> AppResult<Vec<Driver>> {
        Ok(self.drivers.lock().await.clone())
    }

    async fn update_driver_status(
        &self,
        _driver_id: DriverId,
        _expected: DriverStatus,
        _status: DriverStatus,
    ) -> AppResult<bool> {
        Ok(false)
    }
}

#[derive(Default)]
struct FakeDocumentRepository {
    documents: Mutex<Vec<Document>>,
    refuse_inserts: bool,
}

#[async_trait]
impl DocumentRepository for FakeDocumentRepository {
    async fn insert_document(&self, document: Document) -> AppResult<()> {
        if self.refuse_inserts {
            return Err(AppError::Internal("document store unavailable".to_owned()));
        }
        self.documents.lock().await.push(document);
        Ok(())
    }

    async fn find_document(&self, document_id: DocumentId) -> AppResult<Option<Document>> {
        Ok(self
            .documents
            .lock()
            .await
            .iter()
            .find(|document| document.id() == document_id)
            .cloned())
    }

    async fn list_for_driver(&self, driver_id: DriverId) -> AppResult<Vec<Document>> {
        Ok(self
            .documents
            .lock()
            .await
            .iter()
            .filter(|document| document.driver_id() == driver_id)
            .cloned()
            .collect())
    }

    async fn delete_document(&self, document_id: DocumentId) -> AppResult<bool> {
        let mut documents = self.documents.lock().await;
        let before = documents.len();
        documents.retain(|document| document.id() != document_id);
        Ok(documents.len() != before)
    }
}

#[derive(Default)]
struct FakeStorage {
    issued: Mutex<Vec<(String, String)>>,
    unavailable: bool,
}

#[async_trait]
impl StorageCapability for FakeStorage {
    async fn issue_upload_target(
        &self,
        path: &str,
        content_type: &str,
    ) -> AppResult<UploadTarget> {
        if self.unavailable {
            return Err(AppError::Internal("storage gateway unavailable".to_owned()));
        }
        self.issued
            .lock()
            .await
            .push((path.to_owned(), content_type.to_owned()));
        Ok(UploadTarget {
            url: format!("https://storage.test/{path}"),
            expires_at: Utc::now() + Duration::minutes(15),
        })
    }
}

#[derive(Default)]
struct FakeAuditRepository {
    events: Mutex<Vec<AuditEvent>>,
}

#[async_trait]
impl AuditRepository for FakeAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        self.events.lock().await.push(event);
        Ok(())
    }
}

struct Harness {
    service: DocumentService,
    fleet: Arc<FakeFleetRepository>,
    documents: Arc<FakeDocumentRepository>,
    storage: Arc<FakeStorage>,
    audit: Arc<FakeAuditRepository>,
}

fn harness() -> Harness {
    harness_with(FakeDocumentRepository::default(), FakeStorage::default())
}

fn harness_with(documents: FakeDocumentRepository, storage: FakeStorage) -> Harness {
    let fleet = Arc::new(FakeFleetRepository::default());
    let documents = Arc::new(documents);
    let storage = Arc::new(storage);
    let audit = Arc::new(FakeAuditRepository::default());
    let guard =
        AuthorizationGuard::new(PermissionCatalog::standard()).unwrap_or_else(|_| unreachable!());

    Harness {
        service: DocumentService::new(
            guard,
            fleet.clone(),
            documents.clone(),
            storage.clone(),
            audit.clone(),
        ),
        fleet,
        documents,
        storage,
        audit,
    }
}

fn caller(company_id: CompanyId, role: Role) -> Caller {
    Caller::from_profile(Some(
        Profile::new(UserId::new(), company_id, "Office", role).unwrap_or_else(|_| unreachable!()),
    ))
}

fn driver(company_id: CompanyId, status: DriverStatus) -> Driver {
    Driver::new(DriverId::new(), company_id, "Dana Driver", status)
        .unwrap_or_else(|_| unreachable!())
}

fn upload(expiry_date: Option<DateTime<Utc>>) -> PrepareUploadInput {
    PrepareUploadInput {
        file_name: "../Driving License (front).pdf".to_owned(),
        content_type: "application/pdf".to_owned(),
        document_type: "License".to_owned(),
        expiry_date,
    }
}

#[tokio::test]
async fn dispatcher_can_upload_for_active_driver() {
    let harness = harness();
    let company_id = CompanyId::new();
    let target = driver(company_id, DriverStatus::Active);
    assert!(harness.fleet.insert_driver(target.clone()).await.is_ok());

    let prepared = harness
        .service
        .prepare_upload(&caller(company_id, Role::Dispatcher), target.id(), upload(None))
        .await;
    assert!(prepared.is_ok());

    let prepared = prepared.unwrap_or_else(|_| unreachable!());
    let path = prepared.document.file_path().as_str().to_owned();
    assert!(path.starts_with(&format!("{company_id}/{}/", target.id())));
    assert!(path.ends_with("-Driving_License__front_.pdf"));
    assert_eq!(prepared.document.document_type().as_str(), "license");
    assert_eq!(harness.documents.documents.lock().await.len(), 1);
    assert_eq!(
        harness.storage.issued.lock().await.as_slice(),
        &[(path, "application/pdf".to_owned())]
    );
    assert_eq!(harness.audit.events.lock().await.len(), 1);
}

#[tokio::test]
async fn inactive_driver_refuses_upload_without_writing() {
    let harness = harness();
    let company_id = CompanyId::new();
    let target = driver(company_id, DriverStatus::Suspended);
    assert!(harness.fleet.insert_driver(target.clone()).await.is_ok());

    let caller = caller(company_id, Role::Manager);
    assert_eq!(
        harness.service.authorize_upload(&caller, &target).err(),
        Some(UploadRefusal::DriverInactive)
    );

    let prepared = harness
        .service
        .prepare_upload(&caller, target.id(), upload(None))
        .await;
    assert!(matches!(prepared, Err(AppError::Conflict(_))));
    assert!(harness.documents.documents.lock().await.is_empty());
    assert!(harness.storage.issued.lock().await.is_empty());
}

#[tokio::test]
async fn read_only_user_cannot_upload() {
    let harness = harness();
    let company_id = CompanyId::new();
    let target = driver(company_id, DriverStatus::Active);
    assert!(harness.fleet.insert_driver(target.clone()).await.is_ok());

    let prepared = harness
        .service
        .prepare_upload(&caller(company_id, Role::User), target.id(), upload(None))
        .await;

    assert!(matches!(prepared, Err(AppError::Forbidden(_))));
    assert!(harness.storage.issued.lock().await.is_empty());
}

#[tokio::test]
async fn foreign_company_cannot_upload() {
    let harness = harness();
    let target = driver(CompanyId::new(), DriverStatus::Active);
    assert!(harness.fleet.insert_driver(target.clone()).await.is_ok());

    let prepared = harness
        .service
        .prepare_upload(
            &caller(CompanyId::new(), Role::Manager),
            target.id(),
            upload(None),
        )
        .await;

    assert!(matches!(prepared, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn listing_derives_status_at_read_time() {
    let harness = harness();
    let company_id = CompanyId::new();
    let target = driver(company_id, DriverStatus::Active);
    assert!(harness.fleet.insert_driver(target.clone()).await.is_ok());

    let now = Utc::now();
    for expiry_date in [Some(now - Duration::days(1)), Some(now + Duration::days(10)), None] {
        let document = Document::new(
            DocumentId::new(),
            target.id(),
            company_id,
            "path/file.pdf",
            "insurance",
            expiry_date,
        )
        .unwrap_or_else(|_| unreachable!());
        assert!(harness.documents.insert_document(document).await.is_ok());
    }

    let views = harness
        .service
        .list_for_driver(&caller(company_id, Role::User), target.id(), now)
        .await;
    assert!(views.is_ok());

    let statuses: Vec<DocumentStatus> = views
        .unwrap_or_else(|_| unreachable!())
        .into_iter()
        .map(|view| view.status)
        .collect();
    assert_eq!(
        statuses,
        vec![
            DocumentStatus::Expired,
            DocumentStatus::ExpiringSoon,
            DocumentStatus::Valid
        ]
    );
}

#[tokio::test]
async fn delete_requires_delete_permission() {
    let harness = harness();
    let company_id = CompanyId::new();
    let target = driver(company_id, DriverStatus::Active);
    let document = Document::new(
        DocumentId::new(),
        target.id(),
        company_id,
        "path/file.pdf",
        "license",
        None,
    )
    .unwrap_or_else(|_| unreachable!());
    assert!(harness.documents.insert_document(document.clone()).await.is_ok());

    let denied = harness
        .service
        .delete(&caller(company_id, Role::Dispatcher), document.id())
        .await;
    assert!(matches!(denied, Err(AppError::Forbidden(_))));

    let deleted = harness
        .service
        .delete(&caller(company_id, Role::Manager), document.id())
        .await;
    assert!(deleted.is_ok());
    assert!(harness.documents.documents.lock().await.is_empty());

    let missing = harness
        .service
        .delete(&caller(company_id, Role::Manager), document.id())
        .await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
}

#[test]
fn file_names_are_reduced_to_safe_characters() {
    assert_eq!(sanitize_file_name("C:\\scans\\id card.png"), "id_card.png");
    assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
    assert_eq!(sanitize_file_name("..."), "");
    assert_eq!(sanitize_file_name("   "), "");
}

#[tokio::test]
async fn failed_metadata_write_issues_no_upload_target() {
    let harness = harness_with(
        FakeDocumentRepository {
            refuse_inserts: true,
            ..FakeDocumentRepository::default()
        },
        FakeStorage::default(),
    );
    let company_id = CompanyId::new();
    let target = driver(company_id, DriverStatus::Active);
    assert!(harness.fleet.insert_driver(target.clone()).await.is_ok());

    let prepared = harness
        .service
        .prepare_upload(&caller(company_id, Role::Dispatcher), target.id(), upload(None))
        .await;

    assert!(matches!(prepared, Err(AppError::Internal(_))));
    assert!(harness.storage.issued.lock().await.is_empty());
    assert!(harness.audit.events.lock().await.is_empty());
}

#[tokio::test]
async fn refused_upload_target_leaves_no_document() {
    let harness = harness_with(
        FakeDocumentRepository::default(),
        FakeStorage {
            unavailable: true,
            ..FakeStorage::default()
        },
    );
    let company_id = CompanyId::new();
    let target = driver(company_id, DriverStatus::Active);
    assert!(harness.fleet.insert_driver(target.clone()).await.is_ok());

    let prepared = harness
        .service
        .prepare_upload(&caller(company_id, Role::Dispatcher), target.id(), upload(None))
        .await;

    assert!(matches!(prepared, Err(AppError::Internal(_))));
    assert!(harness.documents.documents.lock().await.is_empty());
    assert!(harness.audit.events.lock().await.is_empty());
}
