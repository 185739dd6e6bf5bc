//! Vehicles and drivers, the two entities coupled by assignments.

use std::str::FromStr;

use fleetgate_core::{AppError, AppResult, CompanyId, NonEmptyString, uuid_identifier};
use serde::{Deserialize, Serialize};

use crate::AssignmentId;

uuid_identifier!(
    /// Unique identifier of a vehicle.
    VehicleId
);

uuid_identifier!(
    /// Unique identifier of a driver.
    DriverId
);

/// Operational status of a vehicle.
///
/// Only `Available` and `Assigned` take part in the assignment state machine. The remaining
/// statuses make a vehicle non-assignable and are never overwritten when an assignment ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VehicleStatus {
    /// Ready to be assigned.
    Available,
    /// Held by an active assignment.
    Assigned,
    /// In the workshop.
    Maintenance,
    /// Not roadworthy.
    OutOfService,
    /// Retired from the fleet.
    Inactive,
}

impl VehicleStatus {
    /// Returns a stable storage value for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Assigned => "assigned",
            Self::Maintenance => "maintenance",
            Self::OutOfService => "out-of-service",
            Self::Inactive => "inactive",
        }
    }

    /// Returns whether the status is part of the assignment state machine.
    #[must_use]
    pub fn participates_in_assignments(&self) -> bool {
        matches!(self, Self::Available | Self::Assigned)
    }

    /// Status the vehicle moves to when its active assignment ends.
    #[must_use]
    pub fn released(self) -> Self {
        match self {
            Self::Maintenance | Self::OutOfService | Self::Inactive => self,
            Self::Available | Self::Assigned => Self::Available,
        }
    }

    /// Validates a status change requested by a user rather than by the assignment ledger.
    pub fn manual_transition(
        self,
        requested: Self,
        has_active_assignment: bool,
    ) -> AppResult<Self> {
        if requested == Self::Assigned {
            return Err(AppError::Validation(
                "vehicle status 'assigned' is only set by creating an assignment".to_owned(),
            ));
        }

        if requested == Self::Available && has_active_assignment {
            return Err(AppError::Conflict(
                "vehicle has an active assignment; end the assignment before marking it available"
                    .to_owned(),
            ));
        }

        Ok(requested)
    }
}

impl FromStr for VehicleStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "available" => Ok(Self::Available),
            "assigned" => Ok(Self::Assigned),
            "maintenance" => Ok(Self::Maintenance),
            "out-of-service" => Ok(Self::OutOfService),
            "inactive" => Ok(Self::Inactive),
            _ => Err(AppError::Validation(format!(
                "unknown vehicle status '{value}'"
            ))),
        }
    }
}

/// Employment status of a driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DriverStatus {
    /// Working and eligible for assignments.
    Active,
    /// Not currently working.
    Inactive,
    /// On leave.
    OnLeave,
    /// Suspended.
    Suspended,
    /// No longer employed.
    Terminated,
}

impl DriverStatus {
    /// Returns a stable storage value for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::OnLeave => "on-leave",
            Self::Suspended => "suspended",
            Self::Terminated => "terminated",
        }
    }

    /// Returns whether a driver in this status may receive or hold an assignment.
    #[must_use]
    pub fn can_hold_assignment(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// Validates a status change requested by a user.
    pub fn manual_transition(self, requested: Self, holds_assignment: bool) -> AppResult<Self> {
        if holds_assignment && !requested.can_hold_assignment() {
            return Err(AppError::Conflict(format!(
                "driver holds an active assignment and cannot become '{}'",
                requested.as_str()
            )));
        }

        Ok(requested)
    }
}

impl FromStr for DriverStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "on-leave" => Ok(Self::OnLeave),
            "suspended" => Ok(Self::Suspended),
            "terminated" => Ok(Self::Terminated),
            _ => Err(AppError::Validation(format!(
                "unknown driver status '{value}'"
            ))),
        }
    }
}

/// Fleet vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    id: VehicleId,
    company_id: CompanyId,
    registration: NonEmptyString,
    status: VehicleStatus,
}

impl Vehicle {
    /// Creates a vehicle.
    pub fn new(
        id: VehicleId,
        company_id: CompanyId,
        registration: impl Into<String>,
        status: VehicleStatus,
    ) -> AppResult<Self> {
        Ok(Self {
            id,
            company_id,
            registration: NonEmptyString::new(registration)?,
            status,
        })
    }

    /// Returns the vehicle id.
    #[must_use]
    pub fn id(&self) -> VehicleId {
        self.id
    }

    /// Returns the owning company.
    #[must_use]
    pub fn company_id(&self) -> CompanyId {
        self.company_id
    }

    /// Returns the registration plate or fleet number.
    #[must_use]
    pub fn registration(&self) -> &NonEmptyString {
        &self.registration
    }

    /// Returns the current status.
    #[must_use]
    pub fn status(&self) -> VehicleStatus {
        self.status
    }

    /// Replaces the status.
    pub fn set_status(&mut self, status: VehicleStatus) {
        self.status = status;
    }
}

/// Fleet driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Driver {
    id: DriverId,
    company_id: CompanyId,
    full_name: NonEmptyString,
    status: DriverStatus,
    current_assignment_id: Option<AssignmentId>,
}

impl Driver {
    /// Creates a driver without an assignment.
    pub fn new(
        id: DriverId,
        company_id: CompanyId,
        full_name: impl Into<String>,
        status: DriverStatus,
    ) -> AppResult<Self> {
        Self::restore(id, company_id, full_name, status, None)
    }

    /// Rebuilds a driver from persisted state.
    pub fn restore(
        id: DriverId,
        company_id: CompanyId,
        full_name: impl Into<String>,
        status: DriverStatus,
        current_assignment_id: Option<AssignmentId>,
    ) -> AppResult<Self> {
        Ok(Self {
            id,
            company_id,
            full_name: NonEmptyString::new(full_name)?,
            status,
            current_assignment_id,
        })
    }

    /// Returns the driver id.
    #[must_use]
    pub fn id(&self) -> DriverId {
        self.id
    }

    /// Returns the owning company.
    #[must_use]
    pub fn company_id(&self) -> CompanyId {
        self.company_id
    }

    /// Returns the full name.
    #[must_use]
    pub fn full_name(&self) -> &NonEmptyString {
        &self.full_name
    }

    /// Returns the current status.
    #[must_use]
    pub fn status(&self) -> DriverStatus {
        self.status
    }

    /// Returns the active assignment held by the driver, if any.
    #[must_use]
    pub fn current_assignment_id(&self) -> Option<AssignmentId> {
        self.current_assignment_id
    }

    /// Replaces the status.
    pub fn set_status(&mut self, status: DriverStatus) {
        self.status = status;
    }

    /// Replaces the active assignment pointer.
    pub fn set_current_assignment(&mut self, assignment_id: Option<AssignmentId>) {
        self.current_assignment_id = assignment_id;
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::{DriverStatus, VehicleStatus};

    #[test]
    fn vehicle_status_uses_kebab_case_storage_values() {
        assert_eq!(VehicleStatus::OutOfService.as_str(), "out-of-service");
        assert!(matches!(
            VehicleStatus::from_str("out-of-service"),
            Ok(VehicleStatus::OutOfService)
        ));
        assert!(VehicleStatus::from_str("out_of_service").is_err());
    }

    #[test]
    fn only_available_and_assigned_participate_in_assignments() {
        let participating: Vec<VehicleStatus> = [
            VehicleStatus::Available,
            VehicleStatus::Assigned,
            VehicleStatus::Maintenance,
            VehicleStatus::OutOfService,
            VehicleStatus::Inactive,
        ]
        .into_iter()
        .filter(VehicleStatus::participates_in_assignments)
        .collect();

        assert_eq!(
            participating,
            vec![VehicleStatus::Available, VehicleStatus::Assigned]
        );
    }

    #[test]
    fn release_keeps_workshop_statuses() {
        assert_eq!(VehicleStatus::Assigned.released(), VehicleStatus::Available);
        assert_eq!(
            VehicleStatus::Maintenance.released(),
            VehicleStatus::Maintenance
        );
        assert_eq!(
            VehicleStatus::OutOfService.released(),
            VehicleStatus::OutOfService
        );
    }

    #[test]
    fn assigned_cannot_be_set_manually() {
        let result = VehicleStatus::Available.manual_transition(VehicleStatus::Assigned, false);
        assert!(result.is_err());
    }

    #[test]
    fn assigned_vehicle_may_enter_maintenance_but_not_become_available() {
        assert!(matches!(
            VehicleStatus::Assigned.manual_transition(VehicleStatus::Maintenance, true),
            Ok(VehicleStatus::Maintenance)
        ));
        assert!(
            VehicleStatus::Maintenance
                .manual_transition(VehicleStatus::Available, true)
                .is_err()
        );
    }

    #[test]
    fn driver_holding_assignment_must_stay_active() {
        assert!(
            DriverStatus::Active
                .manual_transition(DriverStatus::OnLeave, true)
                .is_err()
        );
        assert!(
            DriverStatus::Active
                .manual_transition(DriverStatus::OnLeave, false)
                .is_ok()
        );
        assert!(!DriverStatus::Suspended.can_hold_assignment());
    }
}
