use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use fleetgate_application::{
    AssignmentListQuery, AssignmentRepository, AssignmentTransaction, AuditEvent,
    AuditRepository, DocumentRepository, FleetRepository, LedgerError, ProfileRepository,
};
use fleetgate_core::{AppError, AppResult, CompanyId, UserId};
use fleetgate_domain::{
    Assignment, AssignmentId, AssignmentRejection, Company, Document, DocumentId, Driver,
    DriverId, DriverStatus, Profile, Vehicle, VehicleId, VehicleStatus,
};
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Clone, Default)]
struct FleetState {
    companies: HashMap<CompanyId, Company>,
    profiles: HashMap<UserId, Profile>,
    vehicles: HashMap<VehicleId, Vehicle>,
    drivers: HashMap<DriverId, Driver>,
    assignments: HashMap<AssignmentId, Assignment>,
    documents: HashMap<DocumentId, Document>,
    audit_events: Vec<AuditEvent>,
}

impl FleetState {
    fn active_assignment(
        &self,
        matches: impl Fn(&Assignment) -> bool,
    ) -> Option<AssignmentId> {
        self.assignments
            .values()
            .find(|assignment| assignment.is_active() && matches(assignment))
            .map(Assignment::id)
    }
}

/// In-memory implementation of every persistence port.
///
/// Ledger transactions hold the store lock from `begin` until commit or drop, so they run one
/// at a time and observe each other's committed writes only.
#[derive(Debug, Clone, Default)]
pub struct InMemoryFleetStore {
    state: Arc<Mutex<FleetState>>,
}

impl InMemoryFleetStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every audit event appended so far.
    pub async fn audit_events(&self) -> Vec<AuditEvent> {
        self.state.lock().await.audit_events.clone()
    }
}

#[async_trait]
impl ProfileRepository for InMemoryFleetStore {
    async fn find_profile(&self, user_id: UserId) -> AppResult<Option<Profile>> {
        Ok(self.state.lock().await.profiles.get(&user_id).cloned())
    }

    async fn list_profiles(&self, company_id: CompanyId) -> AppResult<Vec<Profile>> {
        let state = self.state.lock().await;
        let mut profiles: Vec<Profile> = state
            .profiles
            .values()
            .filter(|profile| profile.company_id() == company_id)
            .cloned()
            .collect();
        profiles.sort_by(|left, right| {
            left.display_name()
                .as_str()
                .cmp(right.display_name().as_str())
                .then(left.user_id().cmp(&right.user_id()))
        });

        Ok(profiles)
    }

    async fn find_company(&self, company_id: CompanyId) -> AppResult<Option<Company>> {
        Ok(self.state.lock().await.companies.get(&company_id).cloned())
    }

    async fn create_company_with_owner(&self, company: Company, owner: Profile) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if state.profiles.contains_key(&owner.user_id()) {
            return Err(AppError::Conflict(format!(
                "user '{}' already has a profile",
                owner.user_id()
            )));
        }

        state.companies.insert(company.id(), company);
        state.profiles.insert(owner.user_id(), owner);
        Ok(())
    }

    async fn insert_profile(&self, profile: Profile) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if !state.companies.contains_key(&profile.company_id()) {
            return Err(AppError::NotFound(format!(
                "company '{}' does not exist",
                profile.company_id()
            )));
        }
        if state.profiles.contains_key(&profile.user_id()) {
            return Err(AppError::Conflict(format!(
                "user '{}' already has a profile",
                profile.user_id()
            )));
        }

        state.profiles.insert(profile.user_id(), profile);
        Ok(())
    }

    async fn update_profile(&self, profile: &Profile) -> AppResult<()> {
        let mut state = self.state.lock().await;
        let stored = state.profiles.get_mut(&profile.user_id()).ok_or_else(|| {
            AppError::NotFound(format!("profile '{}' does not exist", profile.user_id()))
        })?;
        *stored = profile.clone();
        Ok(())
    }
}

#[async_trait]
impl FleetRepository for InMemoryFleetStore {
    async fn insert_vehicle(&self, vehicle: Vehicle) -> AppResult<()> {
        let mut state = self.state.lock().await;
        let duplicate = state.vehicles.values().any(|existing| {
            existing.company_id() == vehicle.company_id()
                && existing.registration() == vehicle.registration()
        });
        if duplicate {
            return Err(AppError::Conflict(format!(
                "vehicle '{}' is already registered in this company",
                vehicle.registration().as_str()
            )));
        }

        state.vehicles.insert(vehicle.id(), vehicle);
        Ok(())
    }

    async fn find_vehicle(&self, vehicle_id: VehicleId) -> AppResult<Option<Vehicle>> {
        Ok(self.state.lock().await.vehicles.get(&vehicle_id).cloned())
    }

    async fn list_vehicles(&self, company_id: CompanyId) -> AppResult<Vec<Vehicle>> {
        let state = self.state.lock().await;
        let mut vehicles: Vec<Vehicle> = state
            .vehicles
            .values()
            .filter(|vehicle| vehicle.company_id() == company_id)
            .cloned()
            .collect();
        vehicles.sort_by(|left, right| {
            left.registration()
                .as_str()
                .cmp(right.registration().as_str())
        });

        Ok(vehicles)
    }

    async fn update_vehicle_status(
        &self,
        vehicle_id: VehicleId,
        expected: VehicleStatus,
        status: VehicleStatus,
    ) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        let has_active_assignment = state
            .active_assignment(|assignment| assignment.vehicle_id() == vehicle_id)
            .is_some();

        match state.vehicles.get_mut(&vehicle_id) {
            Some(vehicle)
                if vehicle.status() == expected
                    && !(status == VehicleStatus::Available && has_active_assignment) =>
            {
                vehicle.set_status(status);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn insert_driver(&self, driver: Driver) -> AppResult<()> {
        self.state.lock().await.drivers.insert(driver.id(), driver);
        Ok(())
    }

    async fn find_driver(&self, driver_id: DriverId) -> AppResult<Option<Driver>> {
        Ok(self.state.lock().await.drivers.get(&driver_id).cloned())
    }

    async fn list_drivers(&self, company_id: CompanyId) -> AppResult<Vec<Driver>> {
        let state = self.state.lock().await;
        let mut drivers: Vec<Driver> = state
            .drivers
            .values()
            .filter(|driver| driver.company_id() == company_id)
            .cloned()
            .collect();
        drivers.sort_by(|left, right| {
            left.full_name()
                .as_str()
                .cmp(right.full_name().as_str())
                .then(left.id().cmp(&right.id()))
        });

        Ok(drivers)
    }

    async fn update_driver_status(
        &self,
        driver_id: DriverId,
        expected: DriverStatus,
        status: DriverStatus,
    ) -> AppResult<bool> {
        let mut state = self.state.lock().await;

        match state.drivers.get_mut(&driver_id) {
            Some(driver)
                if driver.status() == expected
                    && (status == DriverStatus::Active
                        || driver.current_assignment_id().is_none()) =>
            {
                driver.set_status(status);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl AssignmentRepository for InMemoryFleetStore {
    async fn begin(&self) -> AppResult<Box<dyn AssignmentTransaction>> {
        let guard = self.state.clone().lock_owned().await;
        let staged = (*guard).clone();

        Ok(Box::new(InMemoryAssignmentTransaction { guard, staged }))
    }

    async fn find_assignment(
        &self,
        assignment_id: AssignmentId,
    ) -> AppResult<Option<Assignment>> {
        Ok(self
            .state
            .lock()
            .await
            .assignments
            .get(&assignment_id)
            .cloned())
    }

    async fn find_active_for_vehicle(
        &self,
        vehicle_id: VehicleId,
    ) -> AppResult<Option<Assignment>> {
        let state = self.state.lock().await;
        Ok(state
            .active_assignment(|assignment| assignment.vehicle_id() == vehicle_id)
            .and_then(|assignment_id| state.assignments.get(&assignment_id).cloned()))
    }

    async fn list_assignments(
        &self,
        company_id: CompanyId,
        query: AssignmentListQuery,
    ) -> AppResult<Vec<Assignment>> {
        let state = self.state.lock().await;
        let mut assignments: Vec<Assignment> = state
            .assignments
            .values()
            .filter(|assignment| assignment.company_id() == company_id)
            .filter(|assignment| {
                query
                    .driver_id
                    .is_none_or(|driver_id| assignment.driver_id() == driver_id)
            })
            .filter(|assignment| {
                query
                    .vehicle_id
                    .is_none_or(|vehicle_id| assignment.vehicle_id() == vehicle_id)
            })
            .filter(|assignment| !query.active_only || assignment.is_active())
            .cloned()
            .collect();
        assignments.sort_by(|left, right| {
            right
                .start_date()
                .cmp(&left.start_date())
                .then(left.id().cmp(&right.id()))
        });

        Ok(assignments)
    }
}

#[async_trait]
impl DocumentRepository for InMemoryFleetStore {
    async fn insert_document(&self, document: Document) -> AppResult<()> {
        self.state
            .lock()
            .await
            .documents
            .insert(document.id(), document);
        Ok(())
    }

    async fn find_document(&self, document_id: DocumentId) -> AppResult<Option<Document>> {
        Ok(self.state.lock().await.documents.get(&document_id).cloned())
    }

    async fn list_for_driver(&self, driver_id: DriverId) -> AppResult<Vec<Document>> {
        let state = self.state.lock().await;
        let mut documents: Vec<Document> = state
            .documents
            .values()
            .filter(|document| document.driver_id() == driver_id)
            .cloned()
            .collect();
        documents.sort_by_key(|document| (document.expiry_date().is_none(), document.expiry_date()));

        Ok(documents)
    }

    async fn delete_document(&self, document_id: DocumentId) -> AppResult<bool> {
        Ok(self
            .state
            .lock()
            .await
            .documents
            .remove(&document_id)
            .is_some())
    }
}

#[async_trait]
impl AuditRepository for InMemoryFleetStore {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        self.state.lock().await.audit_events.push(event);
        Ok(())
    }
}

struct InMemoryAssignmentTransaction {
    guard: OwnedMutexGuard<FleetState>,
    staged: FleetState,
}

#[async_trait]
impl AssignmentTransaction for InMemoryAssignmentTransaction {
    async fn lock_driver(&mut self, driver_id: DriverId) -> AppResult<Option<Driver>> {
        Ok(self.staged.drivers.get(&driver_id).cloned())
    }

    async fn lock_vehicle(&mut self, vehicle_id: VehicleId) -> AppResult<Option<Vehicle>> {
        Ok(self.staged.vehicles.get(&vehicle_id).cloned())
    }

    async fn lock_assignment(
        &mut self,
        assignment_id: AssignmentId,
    ) -> AppResult<Option<Assignment>> {
        Ok(self.staged.assignments.get(&assignment_id).cloned())
    }

    async fn active_assignment_for_driver(
        &mut self,
        driver_id: DriverId,
    ) -> AppResult<Option<AssignmentId>> {
        Ok(self
            .staged
            .active_assignment(|assignment| assignment.driver_id() == driver_id))
    }

    async fn active_assignment_for_vehicle(
        &mut self,
        vehicle_id: VehicleId,
    ) -> AppResult<Option<AssignmentId>> {
        Ok(self
            .staged
            .active_assignment(|assignment| assignment.vehicle_id() == vehicle_id))
    }

    async fn insert_assignment(&mut self, assignment: &Assignment) -> Result<(), LedgerError> {
        if self
            .staged
            .active_assignment(|existing| existing.driver_id() == assignment.driver_id())
            .is_some()
        {
            return Err(AssignmentRejection::DriverAlreadyAssigned.into());
        }
        if self
            .staged
            .active_assignment(|existing| existing.vehicle_id() == assignment.vehicle_id())
            .is_some()
        {
            return Err(AssignmentRejection::VehicleAlreadyAssigned.into());
        }

        self.staged
            .assignments
            .insert(assignment.id(), assignment.clone());
        Ok(())
    }

    async fn update_assignment(&mut self, assignment: &Assignment) -> AppResult<()> {
        let stored = self
            .staged
            .assignments
            .get_mut(&assignment.id())
            .ok_or_else(|| {
                AppError::NotFound(format!("assignment '{}' does not exist", assignment.id()))
            })?;
        *stored = assignment.clone();
        Ok(())
    }

    async fn set_vehicle_status(
        &mut self,
        vehicle_id: VehicleId,
        status: VehicleStatus,
    ) -> AppResult<()> {
        let vehicle = self.staged.vehicles.get_mut(&vehicle_id).ok_or_else(|| {
            AppError::NotFound(format!("vehicle '{vehicle_id}' does not exist"))
        })?;
        vehicle.set_status(status);
        Ok(())
    }

    async fn set_driver_assignment(
        &mut self,
        driver_id: DriverId,
        assignment_id: Option<AssignmentId>,
    ) -> AppResult<()> {
        let driver = self.staged.drivers.get_mut(&driver_id).ok_or_else(|| {
            AppError::NotFound(format!("driver '{driver_id}' does not exist"))
        })?;
        driver.set_current_assignment(assignment_id);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), LedgerError> {
        let Self { mut guard, staged } = *self;
        *guard = staged;
        Ok(())
    }
}
