use async_trait::async_trait;
use fleetgate_application::FleetRepository;
use fleetgate_core::{AppError, AppResult, CompanyId};
use fleetgate_domain::{Driver, DriverId, DriverStatus, Vehicle, VehicleId, VehicleStatus};
use sqlx::PgPool;

use crate::postgres_fleet_rows::{
    DRIVER_COLUMNS, DriverRow, VEHICLE_COLUMNS, VehicleRow, decode_rows,
};

/// PostgreSQL-backed vehicle and driver registry.
#[derive(Clone)]
pub struct PostgresFleetRepository {
    pool: PgPool,
}

impl PostgresFleetRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FleetRepository for PostgresFleetRepository {
    async fn insert_vehicle(&self, vehicle: Vehicle) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO vehicles (id, company_id, registration, status)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(vehicle.id().as_uuid())
        .bind(vehicle.company_id().as_uuid())
        .bind(vehicle.registration().as_str())
        .bind(vehicle.status().as_str())
        .execute(&self.pool)
        .await
        .map_err(|error| map_registration_conflict(error, vehicle.registration().as_str()))?;

        Ok(())
    }

    async fn find_vehicle(&self, vehicle_id: VehicleId) -> AppResult<Option<Vehicle>> {
        let row = sqlx::query_as::<_, VehicleRow>(&format!(
            "SELECT {VEHICLE_COLUMNS} FROM vehicles WHERE id = $1"
        ))
        .bind(vehicle_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load vehicle: {error}")))?;

        row.map(Vehicle::try_from).transpose()
    }

    async fn list_vehicles(&self, company_id: CompanyId) -> AppResult<Vec<Vehicle>> {
        let rows = sqlx::query_as::<_, VehicleRow>(&format!(
            "SELECT {VEHICLE_COLUMNS} FROM vehicles WHERE company_id = $1 ORDER BY registration"
        ))
        .bind(company_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list vehicles: {error}")))?;

        decode_rows(rows)
    }

    async fn update_vehicle_status(
        &self,
        vehicle_id: VehicleId,
        expected: VehicleStatus,
        status: VehicleStatus,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE vehicles
            SET status = $3
            WHERE id = $1
                AND status = $2
                AND (
                    $3 <> 'available'
                    OR NOT EXISTS (
                        SELECT 1
                        FROM assignments
                        WHERE vehicle_id = $1 AND status = 'active'
                    )
                )
            "#,
        )
        .bind(vehicle_id.as_uuid())
        .bind(expected.as_str())
        .bind(status.as_str())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to update vehicle status: {error}")))?;

        Ok(result.rows_affected() == 1)
    }

    async fn insert_driver(&self, driver: Driver) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO drivers (id, company_id, full_name, status)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(driver.id().as_uuid())
        .bind(driver.company_id().as_uuid())
        .bind(driver.full_name().as_str())
        .bind(driver.status().as_str())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to insert driver: {error}")))?;

        Ok(())
    }

    async fn find_driver(&self, driver_id: DriverId) -> AppResult<Option<Driver>> {
        let row = sqlx::query_as::<_, DriverRow>(&format!(
            "SELECT {DRIVER_COLUMNS} FROM drivers WHERE id = $1"
        ))
        .bind(driver_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load driver: {error}")))?;

        row.map(Driver::try_from).transpose()
    }

    async fn list_drivers(&self, company_id: CompanyId) -> AppResult<Vec<Driver>> {
        let rows = sqlx::query_as::<_, DriverRow>(&format!(
            "SELECT {DRIVER_COLUMNS} FROM drivers WHERE company_id = $1 ORDER BY full_name, id"
        ))
        .bind(company_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list drivers: {error}")))?;

        decode_rows(rows)
    }

    async fn update_driver_status(
        &self,
        driver_id: DriverId,
        expected: DriverStatus,
        status: DriverStatus,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE drivers
            SET status = $3
            WHERE id = $1
                AND status = $2
                AND ($3 = 'active' OR current_assignment_id IS NULL)
            "#,
        )
        .bind(driver_id.as_uuid())
        .bind(expected.as_str())
        .bind(status.as_str())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to update driver status: {error}")))?;

        Ok(result.rows_affected() == 1)
    }
}

fn map_registration_conflict(error: sqlx::Error, registration: &str) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23505")
    {
        return AppError::Conflict(format!(
            "vehicle '{registration}' is already registered in this company"
        ));
    }

    AppError::Internal(format!("failed to insert vehicle: {error}"))
}

#[cfg(test)]
mod tests;
