use std::sync::Arc;

use chrono::{DateTime, Utc};
use fleetgate_core::{AppError, CompanyId};
use fleetgate_domain::{
    Action, Assignment, AssignmentId, AssignmentRejection, AuditAction, Driver, DriverId,
    Permission, Profile, Resource, VehicleId, VehicleStatus, ensure_driver_assignable,
    ensure_vehicle_assignable, ensure_vehicle_marked_available,
};
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    AccessDenied, AssignmentListQuery, AssignmentRepository, AuditEvent, AuditRepository,
    AuthorizationGuard, Caller, FleetRepository,
};

/// Failure of a ledger operation, keeping the three outcomes apart for callers and tests.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The guard refused the caller before anything was read inside a transaction.
    #[error("access denied")]
    Denied(AccessDenied),
    /// A business precondition failed; nothing was written.
    #[error("{0}")]
    Rejected(AssignmentRejection),
    /// Storage failed.
    #[error(transparent)]
    Store(AppError),
}

impl LedgerError {
    /// Returns the business rejection, if this is one.
    #[must_use]
    pub fn rejection(&self) -> Option<AssignmentRejection> {
        match self {
            Self::Rejected(rejection) => Some(*rejection),
            _ => None,
        }
    }
}

impl From<AccessDenied> for LedgerError {
    fn from(value: AccessDenied) -> Self {
        Self::Denied(value)
    }
}

impl From<AssignmentRejection> for LedgerError {
    fn from(value: AssignmentRejection) -> Self {
        Self::Rejected(value)
    }
}

impl From<AppError> for LedgerError {
    fn from(value: AppError) -> Self {
        Self::Store(value)
    }
}

impl From<LedgerError> for AppError {
    fn from(value: LedgerError) -> Self {
        match value {
            LedgerError::Denied(denied) => denied.into(),
            LedgerError::Rejected(AssignmentRejection::NotFound) => {
                AppError::NotFound(AssignmentRejection::NotFound.to_string())
            }
            LedgerError::Rejected(rejection) => AppError::Conflict(rejection.to_string()),
            LedgerError::Store(error) => error,
        }
    }
}

/// Input for creating an assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateAssignmentInput {
    /// Driver receiving the vehicle.
    pub driver_id: DriverId,
    /// Vehicle handed over.
    pub vehicle_id: VehicleId,
    /// Start of the assignment, defaults to now.
    pub start_date: Option<DateTime<Utc>>,
    /// Free-form notes.
    pub notes: Option<String>,
}

/// Input for ending an assignment.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EndAssignmentInput {
    /// End of the assignment, defaults to now.
    pub end_date: Option<DateTime<Utc>>,
    /// Free-form notes captured at hand-back.
    pub notes: Option<String>,
}

/// Creates and ends assignments while keeping drivers, vehicles and assignments consistent.
///
/// Every mutation runs in one [`crate::AssignmentTransaction`]: either all of the assignment
/// row, the vehicle status and the driver pointer change, or none of them do.
#[derive(Clone)]
pub struct AssignmentLedger {
    guard: AuthorizationGuard,
    fleet_repository: Arc<dyn FleetRepository>,
    assignment_repository: Arc<dyn AssignmentRepository>,
    audit_repository: Arc<dyn AuditRepository>,
}

impl AssignmentLedger {
    /// Creates a new ledger.
    #[must_use]
    pub fn new(
        guard: AuthorizationGuard,
        fleet_repository: Arc<dyn FleetRepository>,
        assignment_repository: Arc<dyn AssignmentRepository>,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            guard,
            fleet_repository,
            assignment_repository,
            audit_repository,
        }
    }

    /// Assigns a vehicle to a driver.
    ///
    /// Preconditions are checked in a fixed order and the first failure wins.
    pub async fn create(
        &self,
        caller: &Caller,
        input: CreateAssignmentInput,
    ) -> Result<Assignment, LedgerError> {
        let driver = self.fleet_repository.find_driver(input.driver_id).await?;
        let actor = self.guard.require(
            caller,
            Permission::new(Resource::Assignments, Action::Create),
            driver.as_ref().map(Driver::company_id),
        )?;

        let mut transaction = self.assignment_repository.begin().await?;

        let locked_driver = transaction.lock_driver(input.driver_id).await?;
        let driver = ensure_driver_assignable(locked_driver.as_ref())?;

        let locked_vehicle = transaction.lock_vehicle(input.vehicle_id).await?;
        let vehicle = ensure_vehicle_assignable(driver, locked_vehicle.as_ref())?;

        if transaction
            .active_assignment_for_driver(driver.id())
            .await?
            .is_some()
        {
            return Err(AssignmentRejection::DriverAlreadyAssigned.into());
        }

        if transaction
            .active_assignment_for_vehicle(vehicle.id())
            .await?
            .is_some()
        {
            return Err(AssignmentRejection::VehicleAlreadyAssigned.into());
        }

        ensure_vehicle_marked_available(vehicle)?;

        let assignment = Assignment::start(
            driver,
            vehicle,
            input.start_date.unwrap_or_else(Utc::now),
            actor.user_id(),
            input.notes,
        );

        transaction.insert_assignment(&assignment).await?;
        transaction
            .set_vehicle_status(vehicle.id(), VehicleStatus::Assigned)
            .await?;
        transaction
            .set_driver_assignment(driver.id(), Some(assignment.id()))
            .await?;
        transaction.commit().await?;

        info!(
            assignment_id = %assignment.id(),
            driver_id = %assignment.driver_id(),
            vehicle_id = %assignment.vehicle_id(),
            company_id = %assignment.company_id(),
            "assignment created"
        );

        self.record(
            actor,
            &assignment,
            AuditAction::AssignmentCreated,
            assignment.notes().map(str::to_owned),
        )
        .await;

        Ok(assignment)
    }

    /// Ends an active assignment and releases the driver and the vehicle.
    ///
    /// A vehicle sent to the workshop while assigned keeps that status.
    pub async fn end(
        &self,
        caller: &Caller,
        assignment_id: AssignmentId,
        input: EndAssignmentInput,
    ) -> Result<Assignment, LedgerError> {
        let existing = self
            .assignment_repository
            .find_assignment(assignment_id)
            .await?;
        let actor = self.guard.require(
            caller,
            Permission::new(Resource::Assignments, Action::Update),
            existing.as_ref().map(Assignment::company_id),
        )?;
        let existing = existing.ok_or(AssignmentRejection::NotFound)?;

        let mut transaction = self.assignment_repository.begin().await?;

        let driver = transaction.lock_driver(existing.driver_id()).await?;
        let vehicle = transaction.lock_vehicle(existing.vehicle_id()).await?;
        let assignment = transaction
            .lock_assignment(assignment_id)
            .await?
            .ok_or(AssignmentRejection::NotFound)?;

        // An assignment scheduled ahead ends at its own start when no date is given.
        let end_date = input
            .end_date
            .unwrap_or_else(|| Utc::now().max(assignment.start_date()));
        let ended = assignment.end(actor.user_id(), end_date, input.notes)?;

        transaction.update_assignment(&ended).await?;

        if let Some(vehicle) = vehicle {
            let released = vehicle.status().released();
            if released != vehicle.status() {
                transaction
                    .set_vehicle_status(vehicle.id(), released)
                    .await?;
            }
        }

        if let Some(driver) =
            driver.filter(|driver| driver.current_assignment_id() == Some(assignment_id))
        {
            transaction.set_driver_assignment(driver.id(), None).await?;
        }

        transaction.commit().await?;

        info!(
            assignment_id = %ended.id(),
            driver_id = %ended.driver_id(),
            vehicle_id = %ended.vehicle_id(),
            company_id = %ended.company_id(),
            "assignment ended"
        );

        self.record(
            actor,
            &ended,
            AuditAction::AssignmentEnded,
            ended.end_notes().map(str::to_owned),
        )
        .await;

        Ok(ended)
    }

    /// Loads one assignment.
    pub async fn get(
        &self,
        caller: &Caller,
        assignment_id: AssignmentId,
    ) -> Result<Assignment, LedgerError> {
        let assignment = self
            .assignment_repository
            .find_assignment(assignment_id)
            .await?;
        self.guard.require(
            caller,
            Permission::new(Resource::Assignments, Action::Read),
            assignment.as_ref().map(Assignment::company_id),
        )?;

        assignment.ok_or(LedgerError::Rejected(AssignmentRejection::NotFound))
    }

    /// Lists assignments of a company, the caller's own company when none is given.
    pub async fn list(
        &self,
        caller: &Caller,
        company_id: Option<CompanyId>,
        query: AssignmentListQuery,
    ) -> Result<Vec<Assignment>, LedgerError> {
        let requested = company_id.or_else(|| caller.profile().map(Profile::company_id));
        let actor = self.guard.require(
            caller,
            Permission::new(Resource::Assignments, Action::Read),
            requested,
        )?;

        Ok(self
            .assignment_repository
            .list_assignments(requested.unwrap_or(actor.company_id()), query)
            .await?)
    }

    async fn record(
        &self,
        actor: &Profile,
        assignment: &Assignment,
        action: AuditAction,
        detail: Option<String>,
    ) {
        let event = AuditEvent {
            company_id: assignment.company_id(),
            actor: actor.user_id(),
            action,
            resource_type: "assignment".to_owned(),
            resource_id: assignment.id().to_string(),
            detail,
        };

        if let Err(error) = self.audit_repository.append_event(event).await {
            warn!(
                assignment_id = %assignment.id(),
                action = action.as_str(),
                error = %error,
                "failed to append audit event"
            );
        }
    }
}
