//! Driver to vehicle assignments and the rules that gate them.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use fleetgate_core::{AppError, AppResult, CompanyId, UserId, uuid_identifier};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Driver, DriverId, Vehicle, VehicleId, VehicleStatus};

uuid_identifier!(
    /// Unique identifier of an assignment.
    AssignmentId
);

/// Lifecycle status of an assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    /// The driver currently holds the vehicle.
    Active,
    /// Closed audit record.
    Ended,
}

impl AssignmentStatus {
    /// Returns a stable storage value for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Ended => "ended",
        }
    }
}

impl FromStr for AssignmentStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "active" => Ok(Self::Active),
            "ended" => Ok(Self::Ended),
            _ => Err(AppError::Validation(format!(
                "unknown assignment status '{value}'"
            ))),
        }
    }
}

/// Expected reasons an assignment mutation is refused.
///
/// Messages are written for end users and are surfaced verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AssignmentRejection {
    /// Driver is missing or not active.
    #[error("driver does not exist or is not active")]
    DriverNotAssignable,
    /// Vehicle is missing or belongs to another company than the driver.
    #[error("vehicle does not exist in the driver's company")]
    CompanyMismatch,
    /// Vehicle status does not allow a new assignment.
    #[error("vehicle is not available for assignment")]
    VehicleNotAssignable,
    /// Driver already holds an active assignment.
    #[error("driver already has an active assignment")]
    DriverAlreadyAssigned,
    /// Vehicle is already held by an active assignment.
    #[error("vehicle already has an active assignment")]
    VehicleAlreadyAssigned,
    /// Assignment does not exist.
    #[error("assignment does not exist")]
    NotFound,
    /// Assignment was already ended.
    #[error("assignment has already ended")]
    AlreadyEnded,
    /// Requested end date lies before the start date.
    #[error("assignment cannot end before it starts")]
    EndsBeforeStart,
}

/// Precondition 1: the driver exists and is active.
pub fn ensure_driver_assignable(driver: Option<&Driver>) -> Result<&Driver, AssignmentRejection> {
    match driver {
        Some(driver) if driver.status().can_hold_assignment() => Ok(driver),
        _ => Err(AssignmentRejection::DriverNotAssignable),
    }
}

/// Preconditions 2 and 3: the vehicle exists in the driver's company and can be assigned.
///
/// A vehicle already marked `assigned` passes here so that the active-assignment check reports
/// it as [`AssignmentRejection::VehicleAlreadyAssigned`], the same outcome a racing insert gets.
pub fn ensure_vehicle_assignable<'a>(
    driver: &Driver,
    vehicle: Option<&'a Vehicle>,
) -> Result<&'a Vehicle, AssignmentRejection> {
    let vehicle = vehicle
        .filter(|vehicle| vehicle.company_id() == driver.company_id())
        .ok_or(AssignmentRejection::CompanyMismatch)?;

    if !vehicle.status().participates_in_assignments() {
        return Err(AssignmentRejection::VehicleNotAssignable);
    }

    Ok(vehicle)
}

/// Fallback for a vehicle marked `assigned` without any active assignment row.
pub fn ensure_vehicle_marked_available(vehicle: &Vehicle) -> Result<(), AssignmentRejection> {
    if vehicle.status() != VehicleStatus::Available {
        return Err(AssignmentRejection::VehicleNotAssignable);
    }

    Ok(())
}

/// Persisted shape of an assignment, used to rebuild a validated [`Assignment`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentRecord {
    /// Assignment id.
    pub id: AssignmentId,
    /// Company copied from the driver at creation.
    pub company_id: CompanyId,
    /// Assigned driver.
    pub driver_id: DriverId,
    /// Assigned vehicle.
    pub vehicle_id: VehicleId,
    /// Start of the assignment.
    pub start_date: DateTime<Utc>,
    /// End of the assignment, present once ended.
    pub end_date: Option<DateTime<Utc>>,
    /// Lifecycle status.
    pub status: AssignmentStatus,
    /// User who created the assignment.
    pub assigned_by: UserId,
    /// User who ended the assignment.
    pub ended_by: Option<UserId>,
    /// Notes captured at creation.
    pub notes: Option<String>,
    /// Notes captured when ending.
    pub end_notes: Option<String>,
}

/// Immutable-once-ended link between a driver and a vehicle.
///
/// `end_date` is present exactly when the status is `Ended`; every constructor upholds this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    id: AssignmentId,
    company_id: CompanyId,
    driver_id: DriverId,
    vehicle_id: VehicleId,
    start_date: DateTime<Utc>,
    end_date: Option<DateTime<Utc>>,
    status: AssignmentStatus,
    assigned_by: UserId,
    ended_by: Option<UserId>,
    notes: Option<String>,
    end_notes: Option<String>,
}

impl Assignment {
    /// Starts a new active assignment between an eligible driver and vehicle.
    #[must_use]
    pub fn start(
        driver: &Driver,
        vehicle: &Vehicle,
        start_date: DateTime<Utc>,
        assigned_by: UserId,
        notes: Option<String>,
    ) -> Self {
        Self {
            id: AssignmentId::new(),
            company_id: driver.company_id(),
            driver_id: driver.id(),
            vehicle_id: vehicle.id(),
            start_date,
            end_date: None,
            status: AssignmentStatus::Active,
            assigned_by,
            ended_by: None,
            notes: normalize_notes(notes),
            end_notes: None,
        }
    }

    /// Closes the assignment.
    pub fn end(
        mut self,
        ended_by: UserId,
        end_date: DateTime<Utc>,
        end_notes: Option<String>,
    ) -> Result<Self, AssignmentRejection> {
        if self.status == AssignmentStatus::Ended {
            return Err(AssignmentRejection::AlreadyEnded);
        }

        if end_date < self.start_date {
            return Err(AssignmentRejection::EndsBeforeStart);
        }

        self.status = AssignmentStatus::Ended;
        self.end_date = Some(end_date);
        self.ended_by = Some(ended_by);
        self.end_notes = normalize_notes(end_notes);
        Ok(self)
    }

    /// Returns the assignment id.
    #[must_use]
    pub fn id(&self) -> AssignmentId {
        self.id
    }

    /// Returns the company the assignment belongs to.
    #[must_use]
    pub fn company_id(&self) -> CompanyId {
        self.company_id
    }

    /// Returns the driver id.
    #[must_use]
    pub fn driver_id(&self) -> DriverId {
        self.driver_id
    }

    /// Returns the vehicle id.
    #[must_use]
    pub fn vehicle_id(&self) -> VehicleId {
        self.vehicle_id
    }

    /// Returns the start date.
    #[must_use]
    pub fn start_date(&self) -> DateTime<Utc> {
        self.start_date
    }

    /// Returns the end date once ended.
    #[must_use]
    pub fn end_date(&self) -> Option<DateTime<Utc>> {
        self.end_date
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub fn status(&self) -> AssignmentStatus {
        self.status
    }

    /// Returns whether the assignment is active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == AssignmentStatus::Active
    }

    /// Returns the creating user.
    #[must_use]
    pub fn assigned_by(&self) -> UserId {
        self.assigned_by
    }

    /// Returns the ending user.
    #[must_use]
    pub fn ended_by(&self) -> Option<UserId> {
        self.ended_by
    }

    /// Returns creation notes.
    #[must_use]
    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    /// Returns end notes.
    #[must_use]
    pub fn end_notes(&self) -> Option<&str> {
        self.end_notes.as_deref()
    }

    /// Converts the assignment into its persisted shape.
    #[must_use]
    pub fn to_record(&self) -> AssignmentRecord {
        AssignmentRecord {
            id: self.id,
            company_id: self.company_id,
            driver_id: self.driver_id,
            vehicle_id: self.vehicle_id,
            start_date: self.start_date,
            end_date: self.end_date,
            status: self.status,
            assigned_by: self.assigned_by,
            ended_by: self.ended_by,
            notes: self.notes.clone(),
            end_notes: self.end_notes.clone(),
        }
    }
}

impl TryFrom<AssignmentRecord> for Assignment {
    type Error = AppError;

    fn try_from(record: AssignmentRecord) -> AppResult<Self> {
        let consistent = match record.status {
            AssignmentStatus::Active => record.end_date.is_none() && record.ended_by.is_none(),
            AssignmentStatus::Ended => record.end_date.is_some(),
        };

        if !consistent {
            return Err(AppError::Internal(format!(
                "assignment '{}' has status '{}' inconsistent with its end date",
                record.id,
                record.status.as_str()
            )));
        }

        Ok(Self {
            id: record.id,
            company_id: record.company_id,
            driver_id: record.driver_id,
            vehicle_id: record.vehicle_id,
            start_date: record.start_date,
            end_date: record.end_date,
            status: record.status,
            assigned_by: record.assigned_by,
            ended_by: record.ended_by,
            notes: record.notes,
            end_notes: record.end_notes,
        })
    }
}

fn normalize_notes(notes: Option<String>) -> Option<String> {
    notes
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use fleetgate_core::{CompanyId, UserId};

    use super::{
        Assignment, AssignmentRejection, AssignmentStatus, ensure_driver_assignable,
        ensure_vehicle_assignable, ensure_vehicle_marked_available,
    };
    use crate::{Driver, DriverId, DriverStatus, Vehicle, VehicleId, VehicleStatus};

    fn driver(company_id: CompanyId, status: DriverStatus) -> Driver {
        Driver::new(DriverId::new(), company_id, "Dana Driver", status)
            .unwrap_or_else(|_| unreachable!())
    }

    fn vehicle(company_id: CompanyId, status: VehicleStatus) -> Vehicle {
        Vehicle::new(VehicleId::new(), company_id, "FG-001", status)
            .unwrap_or_else(|_| unreachable!())
    }

    #[test]
    fn missing_or_inactive_driver_is_not_assignable() {
        let company_id = CompanyId::new();
        assert_eq!(
            ensure_driver_assignable(None).err(),
            Some(AssignmentRejection::DriverNotAssignable)
        );

        for status in [
            DriverStatus::Inactive,
            DriverStatus::OnLeave,
            DriverStatus::Suspended,
            DriverStatus::Terminated,
        ] {
            let candidate = driver(company_id, status);
            assert_eq!(
                ensure_driver_assignable(Some(&candidate)).err(),
                Some(AssignmentRejection::DriverNotAssignable)
            );
        }
    }

    #[test]
    fn vehicle_from_other_company_is_a_mismatch() {
        let candidate = driver(CompanyId::new(), DriverStatus::Active);
        let foreign = vehicle(CompanyId::new(), VehicleStatus::Available);

        assert_eq!(
            ensure_vehicle_assignable(&candidate, Some(&foreign)).err(),
            Some(AssignmentRejection::CompanyMismatch)
        );
        assert_eq!(
            ensure_vehicle_assignable(&candidate, None).err(),
            Some(AssignmentRejection::CompanyMismatch)
        );
    }

    #[test]
    fn workshop_vehicle_is_not_assignable() {
        let company_id = CompanyId::new();
        let candidate = driver(company_id, DriverStatus::Active);

        for status in [
            VehicleStatus::Maintenance,
            VehicleStatus::OutOfService,
            VehicleStatus::Inactive,
        ] {
            let target = vehicle(company_id, status);
            assert_eq!(
                ensure_vehicle_assignable(&candidate, Some(&target)).err(),
                Some(AssignmentRejection::VehicleNotAssignable)
            );
        }
    }

    #[test]
    fn assigned_vehicle_defers_to_active_assignment_check() {
        let company_id = CompanyId::new();
        let candidate = driver(company_id, DriverStatus::Active);
        let target = vehicle(company_id, VehicleStatus::Assigned);

        assert!(ensure_vehicle_assignable(&candidate, Some(&target)).is_ok());
        assert_eq!(
            ensure_vehicle_marked_available(&target).err(),
            Some(AssignmentRejection::VehicleNotAssignable)
        );
    }

    #[test]
    fn end_sets_end_date_and_status_together() {
        let company_id = CompanyId::new();
        let start = Utc::now();
        let assignment = Assignment::start(
            &driver(company_id, DriverStatus::Active),
            &vehicle(company_id, VehicleStatus::Available),
            start,
            UserId::new(),
            Some("  ".to_owned()),
        );
        assert!(assignment.is_active());
        assert!(assignment.end_date().is_none());
        assert!(assignment.notes().is_none());

        let ended = assignment
            .clone()
            .end(UserId::new(), start + Duration::hours(4), Some("returned".to_owned()));
        assert!(ended.is_ok());

        let ended = ended.unwrap_or_else(|_| unreachable!());
        assert_eq!(ended.status(), AssignmentStatus::Ended);
        assert_eq!(ended.end_date(), Some(start + Duration::hours(4)));
        assert_eq!(ended.end_notes(), Some("returned"));

        let again = ended.end(UserId::new(), start + Duration::hours(5), None);
        assert_eq!(again.err(), Some(AssignmentRejection::AlreadyEnded));
    }

    #[test]
    fn end_before_start_is_rejected() {
        let company_id = CompanyId::new();
        let start = Utc::now();
        let assignment = Assignment::start(
            &driver(company_id, DriverStatus::Active),
            &vehicle(company_id, VehicleStatus::Available),
            start,
            UserId::new(),
            None,
        );

        let ended = assignment.end(UserId::new(), start - Duration::seconds(1), None);
        assert_eq!(ended.err(), Some(AssignmentRejection::EndsBeforeStart));
    }

    #[test]
    fn inconsistent_record_is_refused() {
        let company_id = CompanyId::new();
        let assignment = Assignment::start(
            &driver(company_id, DriverStatus::Active),
            &vehicle(company_id, VehicleStatus::Available),
            Utc::now(),
            UserId::new(),
            None,
        );

        let mut record = assignment.to_record();
        record.status = AssignmentStatus::Ended;
        assert!(Assignment::try_from(record.clone()).is_err());

        record.status = AssignmentStatus::Active;
        record.end_date = Some(Utc::now());
        assert!(Assignment::try_from(record).is_err());
    }
}
