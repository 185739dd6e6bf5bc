use std::sync::Arc;

use fleetgate_core::{AppError, AppResult, CompanyId};
use fleetgate_domain::{
    Action, AuditAction, Driver, DriverId, DriverStatus, Permission, Profile, Resource, Vehicle,
    VehicleId, VehicleStatus,
};
use tracing::{info, warn};

use crate::{
    AssignmentRepository, AuditEvent, AuditRepository, AuthorizationGuard, Caller,
    FleetRepository,
};

/// Input for registering a vehicle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterVehicleInput {
    /// Target company, the caller's own when absent.
    pub company_id: Option<CompanyId>,
    /// Registration plate or fleet number.
    pub registration: String,
}

/// Input for registering a driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterDriverInput {
    /// Target company, the caller's own when absent.
    pub company_id: Option<CompanyId>,
    /// Full name.
    pub full_name: String,
}

/// Registry of vehicles and drivers.
///
/// Status changes made here never touch assignments; the `assigned` vehicle status belongs to
/// the ledger alone.
#[derive(Clone)]
pub struct FleetService {
    guard: AuthorizationGuard,
    fleet_repository: Arc<dyn FleetRepository>,
    assignment_repository: Arc<dyn AssignmentRepository>,
    audit_repository: Arc<dyn AuditRepository>,
}

impl FleetService {
    /// Creates a new fleet service.
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

    /// Registers an available vehicle.
    pub async fn register_vehicle(
        &self,
        caller: &Caller,
        input: RegisterVehicleInput,
    ) -> AppResult<Vehicle> {
        let actor = self.guard.require(
            caller,
            Permission::new(Resource::Vehicles, Action::Create),
            target_company(caller, input.company_id),
        )?;
        let company_id = input.company_id.unwrap_or(actor.company_id());

        let vehicle = Vehicle::new(
            VehicleId::new(),
            company_id,
            input.registration.trim(),
            VehicleStatus::Available,
        )?;
        self.fleet_repository.insert_vehicle(vehicle.clone()).await?;

        info!(vehicle_id = %vehicle.id(), company_id = %company_id, "vehicle registered");
        self.record(
            actor,
            company_id,
            AuditAction::VehicleRegistered,
            "vehicle",
            vehicle.id().to_string(),
            Some(vehicle.registration().as_str().to_owned()),
        )
        .await;

        Ok(vehicle)
    }

    /// Lists vehicles of a company.
    pub async fn list_vehicles(
        &self,
        caller: &Caller,
        company_id: Option<CompanyId>,
    ) -> AppResult<Vec<Vehicle>> {
        let actor = self.guard.require(
            caller,
            Permission::new(Resource::Vehicles, Action::Read),
            target_company(caller, company_id),
        )?;

        self.fleet_repository
            .list_vehicles(company_id.unwrap_or(actor.company_id()))
            .await
    }

    /// Changes a vehicle status on behalf of a user.
    pub async fn change_vehicle_status(
        &self,
        caller: &Caller,
        vehicle_id: VehicleId,
        requested: VehicleStatus,
    ) -> AppResult<Vehicle> {
        let vehicle = self.fleet_repository.find_vehicle(vehicle_id).await?;
        let actor = self.guard.require(
            caller,
            Permission::new(Resource::Vehicles, Action::Update),
            vehicle.as_ref().map(Vehicle::company_id),
        )?;
        let mut vehicle = vehicle.ok_or_else(|| {
            AppError::NotFound(format!("vehicle '{vehicle_id}' does not exist"))
        })?;

        let has_active_assignment = self
            .assignment_repository
            .find_active_for_vehicle(vehicle_id)
            .await?
            .is_some();
        let previous = vehicle.status();
        let status = previous.manual_transition(requested, has_active_assignment)?;

        if !self
            .fleet_repository
            .update_vehicle_status(vehicle_id, previous, status)
            .await?
        {
            return Err(AppError::Conflict(format!(
                "vehicle '{vehicle_id}' was changed concurrently, reload and retry"
            )));
        }
        vehicle.set_status(status);

        info!(
            vehicle_id = %vehicle_id,
            from = previous.as_str(),
            to = status.as_str(),
            "vehicle status changed"
        );
        self.record(
            actor,
            vehicle.company_id(),
            AuditAction::VehicleStatusChanged,
            "vehicle",
            vehicle_id.to_string(),
            Some(format!("{} -> {}", previous.as_str(), status.as_str())),
        )
        .await;

        Ok(vehicle)
    }

    /// Registers an active driver.
    pub async fn register_driver(
        &self,
        caller: &Caller,
        input: RegisterDriverInput,
    ) -> AppResult<Driver> {
        let actor = self.guard.require(
            caller,
            Permission::new(Resource::Drivers, Action::Create),
            target_company(caller, input.company_id),
        )?;
        let company_id = input.company_id.unwrap_or(actor.company_id());

        let driver = Driver::new(
            DriverId::new(),
            company_id,
            input.full_name.trim(),
            DriverStatus::Active,
        )?;
        self.fleet_repository.insert_driver(driver.clone()).await?;

        info!(driver_id = %driver.id(), company_id = %company_id, "driver registered");
        self.record(
            actor,
            company_id,
            AuditAction::DriverRegistered,
            "driver",
            driver.id().to_string(),
            None,
        )
        .await;

        Ok(driver)
    }

    /// Lists drivers of a company.
    pub async fn list_drivers(
        &self,
        caller: &Caller,
        company_id: Option<CompanyId>,
    ) -> AppResult<Vec<Driver>> {
        let actor = self.guard.require(
            caller,
            Permission::new(Resource::Drivers, Action::Read),
            target_company(caller, company_id),
        )?;

        self.fleet_repository
            .list_drivers(company_id.unwrap_or(actor.company_id()))
            .await
    }

    /// Changes a driver status on behalf of a user.
    pub async fn change_driver_status(
        &self,
        caller: &Caller,
        driver_id: DriverId,
        requested: DriverStatus,
    ) -> AppResult<Driver> {
        let driver = self.fleet_repository.find_driver(driver_id).await?;
        let actor = self.guard.require(
            caller,
            Permission::new(Resource::Drivers, Action::Update),
            driver.as_ref().map(Driver::company_id),
        )?;
        let mut driver = driver
            .ok_or_else(|| AppError::NotFound(format!("driver '{driver_id}' does not exist")))?;

        let previous = driver.status();
        let status =
            previous.manual_transition(requested, driver.current_assignment_id().is_some())?;

        if !self
            .fleet_repository
            .update_driver_status(driver_id, previous, status)
            .await?
        {
            return Err(AppError::Conflict(format!(
                "driver '{driver_id}' was changed concurrently or received an assignment, reload and retry"
            )));
        }
        driver.set_status(status);

        info!(
            driver_id = %driver_id,
            from = previous.as_str(),
            to = status.as_str(),
            "driver status changed"
        );
        self.record(
            actor,
            driver.company_id(),
            AuditAction::DriverStatusChanged,
            "driver",
            driver_id.to_string(),
            Some(format!("{} -> {}", previous.as_str(), status.as_str())),
        )
        .await;

        Ok(driver)
    }

    async fn record(
        &self,
        actor: &Profile,
        company_id: CompanyId,
        action: AuditAction,
        resource_type: &str,
        resource_id: String,
        detail: Option<String>,
    ) {
        let event = AuditEvent {
            company_id,
            actor: actor.user_id(),
            action,
            resource_type: resource_type.to_owned(),
            resource_id,
            detail,
        };

        if let Err(error) = self.audit_repository.append_event(event).await {
            warn!(action = action.as_str(), error = %error, "failed to append audit event");
        }
    }
}

fn target_company(caller: &Caller, company_id: Option<CompanyId>) -> Option<CompanyId> {
    company_id.or_else(|| caller.profile().map(Profile::company_id))
}
