use std::str::FromStr;

use chrono::{DateTime, Utc};
use fleetgate_core::{AppError, AppResult, CompanyId, UserId};
use fleetgate_domain::{
    Assignment, AssignmentId, AssignmentRecord, AssignmentStatus, Driver, DriverId, DriverStatus,
    Vehicle, VehicleId, VehicleStatus,
};
use sqlx::FromRow;
use uuid::Uuid;

pub(crate) const VEHICLE_COLUMNS: &str = "id, company_id, registration, status";

pub(crate) const DRIVER_COLUMNS: &str = "id, company_id, full_name, status, current_assignment_id";

pub(crate) const ASSIGNMENT_COLUMNS: &str = "id, company_id, driver_id, vehicle_id, start_date, \
     end_date, status, assigned_by, ended_by, notes, end_notes";

#[derive(Debug, FromRow)]
pub(crate) struct VehicleRow {
    id: Uuid,
    company_id: Uuid,
    registration: String,
    status: String,
}

impl TryFrom<VehicleRow> for Vehicle {
    type Error = AppError;

    fn try_from(row: VehicleRow) -> AppResult<Self> {
        Vehicle::new(
            VehicleId::from_uuid(row.id),
            CompanyId::from_uuid(row.company_id),
            row.registration,
            decode(VehicleStatus::from_str(row.status.as_str()), "vehicle", row.id)?,
        )
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct DriverRow {
    id: Uuid,
    company_id: Uuid,
    full_name: String,
    status: String,
    current_assignment_id: Option<Uuid>,
}

impl TryFrom<DriverRow> for Driver {
    type Error = AppError;

    fn try_from(row: DriverRow) -> AppResult<Self> {
        Driver::restore(
            DriverId::from_uuid(row.id),
            CompanyId::from_uuid(row.company_id),
            row.full_name,
            decode(DriverStatus::from_str(row.status.as_str()), "driver", row.id)?,
            row.current_assignment_id.map(AssignmentId::from_uuid),
        )
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct AssignmentRow {
    id: Uuid,
    company_id: Uuid,
    driver_id: Uuid,
    vehicle_id: Uuid,
    start_date: DateTime<Utc>,
    end_date: Option<DateTime<Utc>>,
    status: String,
    assigned_by: Uuid,
    ended_by: Option<Uuid>,
    notes: Option<String>,
    end_notes: Option<String>,
}

impl TryFrom<AssignmentRow> for Assignment {
    type Error = AppError;

    fn try_from(row: AssignmentRow) -> AppResult<Self> {
        let status = decode(
            AssignmentStatus::from_str(row.status.as_str()),
            "assignment",
            row.id,
        )?;

        Assignment::try_from(AssignmentRecord {
            id: AssignmentId::from_uuid(row.id),
            company_id: CompanyId::from_uuid(row.company_id),
            driver_id: DriverId::from_uuid(row.driver_id),
            vehicle_id: VehicleId::from_uuid(row.vehicle_id),
            start_date: row.start_date,
            end_date: row.end_date,
            status,
            assigned_by: UserId::from_uuid(row.assigned_by),
            ended_by: row.ended_by.map(UserId::from_uuid),
            notes: row.notes,
            end_notes: row.end_notes,
        })
    }
}

fn decode<T>(value: AppResult<T>, kind: &str, id: Uuid) -> AppResult<T> {
    value.map_err(|error| AppError::Internal(format!("failed to decode {kind} '{id}': {error}")))
}

pub(crate) fn decode_rows<R, T>(rows: Vec<R>) -> AppResult<Vec<T>>
where
    T: TryFrom<R, Error = AppError>,
{
    rows.into_iter().map(T::try_from).collect()
}
