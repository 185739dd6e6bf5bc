use async_trait::async_trait;
use fleetgate_core::{AppResult, CompanyId};
use fleetgate_domain::{Driver, DriverId, DriverStatus, Vehicle, VehicleId, VehicleStatus};

/// Repository port for the vehicle and driver registry.
///
/// Status updates are compare-and-set: they only apply when the stored status still equals
/// `expected`, and report whether a row changed.
#[async_trait]
pub trait FleetRepository: Send + Sync {
    /// Inserts a vehicle.
    async fn insert_vehicle(&self, vehicle: Vehicle) -> AppResult<()>;

    /// Loads a vehicle by id regardless of company.
    async fn find_vehicle(&self, vehicle_id: VehicleId) -> AppResult<Option<Vehicle>>;

    /// Lists vehicles of a company ordered by registration.
    async fn list_vehicles(&self, company_id: CompanyId) -> AppResult<Vec<Vehicle>>;

    /// Updates a vehicle status if it still equals `expected`.
    async fn update_vehicle_status(
        &self,
        vehicle_id: VehicleId,
        expected: VehicleStatus,
        status: VehicleStatus,
    ) -> AppResult<bool>;

    /// Inserts a driver.
    async fn insert_driver(&self, driver: Driver) -> AppResult<()>;

    /// Loads a driver by id regardless of company.
    async fn find_driver(&self, driver_id: DriverId) -> AppResult<Option<Driver>>;

    /// Lists drivers of a company ordered by name.
    async fn list_drivers(&self, company_id: CompanyId) -> AppResult<Vec<Driver>>;

    /// Updates a driver status if it still equals `expected`.
    ///
    /// Moving away from `active` must also fail while the driver holds an assignment.
    async fn update_driver_status(
        &self,
        driver_id: DriverId,
        expected: DriverStatus,
        status: DriverStatus,
    ) -> AppResult<bool>;
}
