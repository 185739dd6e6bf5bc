use std::sync::Arc;

use fleetgate_application::{
    AssignmentLedger, AssignmentRepository, AuditRepository, AuthorizationGuard,
    DocumentRepository, DocumentService, FleetRepository, FleetService, ProfileRepository,
    ProfileService, StorageCapability,
};

/// Persistence and storage adapters wired into the services.
#[derive(Clone)]
pub struct AppPorts {
    pub profile_repository: Arc<dyn ProfileRepository>,
    pub fleet_repository: Arc<dyn FleetRepository>,
    pub assignment_repository: Arc<dyn AssignmentRepository>,
    pub document_repository: Arc<dyn DocumentRepository>,
    pub audit_repository: Arc<dyn AuditRepository>,
    pub storage: Arc<dyn StorageCapability>,
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub profile_service: ProfileService,
    pub fleet_service: FleetService,
    pub assignment_ledger: AssignmentLedger,
    pub document_service: DocumentService,
    pub frontend_url: String,
    pub bootstrap_token: String,
}

impl AppState {
    /// Builds every service around one guard and one set of ports.
    pub fn new(
        guard: AuthorizationGuard,
        ports: AppPorts,
        frontend_url: String,
        bootstrap_token: String,
    ) -> Self {
        Self {
            profile_service: ProfileService::new(
                guard.clone(),
                ports.profile_repository,
                ports.audit_repository.clone(),
            ),
            fleet_service: FleetService::new(
                guard.clone(),
                ports.fleet_repository.clone(),
                ports.assignment_repository.clone(),
                ports.audit_repository.clone(),
            ),
            assignment_ledger: AssignmentLedger::new(
                guard.clone(),
                ports.fleet_repository.clone(),
                ports.assignment_repository,
                ports.audit_repository.clone(),
            ),
            document_service: DocumentService::new(
                guard,
                ports.fleet_repository,
                ports.document_repository,
                ports.storage,
                ports.audit_repository,
            ),
            frontend_url,
            bootstrap_token,
        }
    }
}
