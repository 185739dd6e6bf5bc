use async_trait::async_trait;
use fleetgate_application::{
    AssignmentListQuery, AssignmentRepository, AssignmentTransaction, LedgerError,
};
use fleetgate_core::{AppError, AppResult, CompanyId};
use fleetgate_domain::{
    Assignment, AssignmentId, AssignmentRejection, Driver, DriverId, Vehicle, VehicleId,
    VehicleStatus,
};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;
use uuid::Uuid;

use crate::postgres_fleet_rows::{
    ASSIGNMENT_COLUMNS, AssignmentRow, DRIVER_COLUMNS, DriverRow, VEHICLE_COLUMNS, VehicleRow,
    decode_rows,
};

const ACTIVE_DRIVER_INDEX: &str = "assignments_active_driver_key";
const ACTIVE_VEHICLE_INDEX: &str = "assignments_active_vehicle_key";

/// PostgreSQL-backed assignment repository.
///
/// Ledger transactions take row locks with `SELECT ... FOR UPDATE`. The partial unique indexes
/// on active assignments back the locks up when two transactions still race.
#[derive(Clone)]
pub struct PostgresAssignmentRepository {
    pool: PgPool,
}

impl PostgresAssignmentRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AssignmentRepository for PostgresAssignmentRepository {
    async fn begin(&self) -> AppResult<Box<dyn AssignmentTransaction>> {
        let transaction = self
            .pool
            .begin()
            .await
            .map_err(|error| AppError::Internal(format!("failed to begin transaction: {error}")))?;

        Ok(Box::new(PostgresAssignmentTransaction { transaction }))
    }

    async fn find_assignment(
        &self,
        assignment_id: AssignmentId,
    ) -> AppResult<Option<Assignment>> {
        let row = sqlx::query_as::<_, AssignmentRow>(&format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM assignments WHERE id = $1"
        ))
        .bind(assignment_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load assignment: {error}")))?;

        row.map(Assignment::try_from).transpose()
    }

    async fn find_active_for_vehicle(
        &self,
        vehicle_id: VehicleId,
    ) -> AppResult<Option<Assignment>> {
        let row = sqlx::query_as::<_, AssignmentRow>(&format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM assignments \
             WHERE vehicle_id = $1 AND status = 'active'"
        ))
        .bind(vehicle_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to load active vehicle assignment: {error}"))
        })?;

        row.map(Assignment::try_from).transpose()
    }

    async fn list_assignments(
        &self,
        company_id: CompanyId,
        query: AssignmentListQuery,
    ) -> AppResult<Vec<Assignment>> {
        let rows = sqlx::query_as::<_, AssignmentRow>(&format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM assignments \
             WHERE company_id = $1 \
                 AND ($2::uuid IS NULL OR driver_id = $2) \
                 AND ($3::uuid IS NULL OR vehicle_id = $3) \
                 AND (NOT $4 OR status = 'active') \
             ORDER BY start_date DESC, id"
        ))
        .bind(company_id.as_uuid())
        .bind(query.driver_id.map(|driver_id| driver_id.as_uuid()))
        .bind(query.vehicle_id.map(|vehicle_id| vehicle_id.as_uuid()))
        .bind(query.active_only)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list assignments: {error}")))?;

        decode_rows(rows)
    }
}

struct PostgresAssignmentTransaction {
    transaction: Transaction<'static, Postgres>,
}

#[async_trait]
impl AssignmentTransaction for PostgresAssignmentTransaction {
    async fn lock_driver(&mut self, driver_id: DriverId) -> AppResult<Option<Driver>> {
        let row = sqlx::query_as::<_, DriverRow>(&format!(
            "SELECT {DRIVER_COLUMNS} FROM drivers WHERE id = $1 FOR UPDATE"
        ))
        .bind(driver_id.as_uuid())
        .fetch_optional(&mut *self.transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to lock driver: {error}")))?;

        row.map(Driver::try_from).transpose()
    }

    async fn lock_vehicle(&mut self, vehicle_id: VehicleId) -> AppResult<Option<Vehicle>> {
        let row = sqlx::query_as::<_, VehicleRow>(&format!(
            "SELECT {VEHICLE_COLUMNS} FROM vehicles WHERE id = $1 FOR UPDATE"
        ))
        .bind(vehicle_id.as_uuid())
        .fetch_optional(&mut *self.transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to lock vehicle: {error}")))?;

        row.map(Vehicle::try_from).transpose()
    }

    async fn lock_assignment(
        &mut self,
        assignment_id: AssignmentId,
    ) -> AppResult<Option<Assignment>> {
        let row = sqlx::query_as::<_, AssignmentRow>(&format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM assignments WHERE id = $1 FOR UPDATE"
        ))
        .bind(assignment_id.as_uuid())
        .fetch_optional(&mut *self.transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to lock assignment: {error}")))?;

        row.map(Assignment::try_from).transpose()
    }

    async fn active_assignment_for_driver(
        &mut self,
        driver_id: DriverId,
    ) -> AppResult<Option<AssignmentId>> {
        let assignment_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id
            FROM assignments
            WHERE driver_id = $1 AND status = 'active'
            "#,
        )
        .bind(driver_id.as_uuid())
        .fetch_optional(&mut *self.transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to check active driver assignment: {error}"))
        })?;

        Ok(assignment_id.map(AssignmentId::from_uuid))
    }

    async fn active_assignment_for_vehicle(
        &mut self,
        vehicle_id: VehicleId,
    ) -> AppResult<Option<AssignmentId>> {
        let assignment_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id
            FROM assignments
            WHERE vehicle_id = $1 AND status = 'active'
            "#,
        )
        .bind(vehicle_id.as_uuid())
        .fetch_optional(&mut *self.transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to check active vehicle assignment: {error}"))
        })?;

        Ok(assignment_id.map(AssignmentId::from_uuid))
    }

    async fn insert_assignment(&mut self, assignment: &Assignment) -> Result<(), LedgerError> {
        let record = assignment.to_record();
        sqlx::query(
            r#"
            INSERT INTO assignments (
                id,
                company_id,
                driver_id,
                vehicle_id,
                start_date,
                end_date,
                status,
                assigned_by,
                ended_by,
                notes,
                end_notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(record.company_id.as_uuid())
        .bind(record.driver_id.as_uuid())
        .bind(record.vehicle_id.as_uuid())
        .bind(record.start_date)
        .bind(record.end_date)
        .bind(record.status.as_str())
        .bind(record.assigned_by.as_uuid())
        .bind(record.ended_by.map(|user_id| user_id.as_uuid()))
        .bind(record.notes)
        .bind(record.end_notes)
        .execute(&mut *self.transaction)
        .await
        .map_err(|error| map_active_assignment_conflict(error, "failed to insert assignment"))?;

        Ok(())
    }

    async fn update_assignment(&mut self, assignment: &Assignment) -> AppResult<()> {
        let record = assignment.to_record();
        sqlx::query(
            r#"
            UPDATE assignments
            SET status = $2,
                end_date = $3,
                ended_by = $4,
                end_notes = $5
            WHERE id = $1
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(record.status.as_str())
        .bind(record.end_date)
        .bind(record.ended_by.map(|user_id| user_id.as_uuid()))
        .bind(record.end_notes)
        .execute(&mut *self.transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to update assignment: {error}")))?;

        Ok(())
    }

    async fn set_vehicle_status(
        &mut self,
        vehicle_id: VehicleId,
        status: VehicleStatus,
    ) -> AppResult<()> {
        sqlx::query("UPDATE vehicles SET status = $2 WHERE id = $1")
            .bind(vehicle_id.as_uuid())
            .bind(status.as_str())
            .execute(&mut *self.transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to update vehicle status: {error}"))
            })?;

        Ok(())
    }

    async fn set_driver_assignment(
        &mut self,
        driver_id: DriverId,
        assignment_id: Option<AssignmentId>,
    ) -> AppResult<()> {
        sqlx::query("UPDATE drivers SET current_assignment_id = $2 WHERE id = $1")
            .bind(driver_id.as_uuid())
            .bind(assignment_id.map(|assignment_id| assignment_id.as_uuid()))
            .execute(&mut *self.transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to update driver assignment: {error}"))
            })?;

        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), LedgerError> {
        self.transaction
            .commit()
            .await
            .map_err(|error| map_active_assignment_conflict(error, "failed to commit transaction"))
    }
}

/// Translates a violation of the active-assignment indexes into the matching rejection.
fn map_active_assignment_conflict(error: sqlx::Error, context: &str) -> LedgerError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23505")
    {
        let rejection = match database_error.constraint() {
            Some(ACTIVE_DRIVER_INDEX) => Some(AssignmentRejection::DriverAlreadyAssigned),
            Some(ACTIVE_VEHICLE_INDEX) => Some(AssignmentRejection::VehicleAlreadyAssigned),
            _ => None,
        };

        if let Some(rejection) = rejection {
            debug!(
                constraint = database_error.constraint().unwrap_or_default(),
                "active assignment index rejected a concurrent write"
            );
            return rejection.into();
        }
    }

    AppError::Internal(format!("{context}: {error}")).into()
}

#[cfg(test)]
mod tests;
