use async_trait::async_trait;
use fleetgate_core::{AppResult, CompanyId};
use fleetgate_domain::{
    Assignment, AssignmentId, Driver, DriverId, Vehicle, VehicleId, VehicleStatus,
};

use crate::LedgerError;

/// Filters for assignment listing inside one company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AssignmentListQuery {
    /// Restrict to one driver.
    pub driver_id: Option<DriverId>,
    /// Restrict to one vehicle.
    pub vehicle_id: Option<VehicleId>,
    /// Only return active assignments.
    pub active_only: bool,
}

/// Repository port for assignments.
#[async_trait]
pub trait AssignmentRepository: Send + Sync {
    /// Opens a transaction in which the ledger checks preconditions and writes.
    async fn begin(&self) -> AppResult<Box<dyn AssignmentTransaction>>;

    /// Loads an assignment outside of any transaction.
    async fn find_assignment(&self, assignment_id: AssignmentId)
    -> AppResult<Option<Assignment>>;

    /// Loads the active assignment of a vehicle outside of any transaction.
    async fn find_active_for_vehicle(&self, vehicle_id: VehicleId)
    -> AppResult<Option<Assignment>>;

    /// Lists assignments of a company, most recent start first.
    async fn list_assignments(
        &self,
        company_id: CompanyId,
        query: AssignmentListQuery,
    ) -> AppResult<Vec<Assignment>>;
}

/// Unit of work over drivers, vehicles and assignments.
///
/// Rows returned by the `lock_*` methods stay locked against concurrent ledger transactions
/// until the transaction finishes. Implementations lock in the order driver, vehicle,
/// assignment. Dropping the transaction without [`AssignmentTransaction::commit`] discards
/// every write.
#[async_trait]
pub trait AssignmentTransaction: Send {
    /// Loads and locks a driver.
    async fn lock_driver(&mut self, driver_id: DriverId) -> AppResult<Option<Driver>>;

    /// Loads and locks a vehicle.
    async fn lock_vehicle(&mut self, vehicle_id: VehicleId) -> AppResult<Option<Vehicle>>;

    /// Loads and locks an assignment.
    async fn lock_assignment(
        &mut self,
        assignment_id: AssignmentId,
    ) -> AppResult<Option<Assignment>>;

    /// Returns the active assignment id held by a driver, if any.
    async fn active_assignment_for_driver(
        &mut self,
        driver_id: DriverId,
    ) -> AppResult<Option<AssignmentId>>;

    /// Returns the active assignment id holding a vehicle, if any.
    async fn active_assignment_for_vehicle(
        &mut self,
        vehicle_id: VehicleId,
    ) -> AppResult<Option<AssignmentId>>;

    /// Inserts a new active assignment.
    ///
    /// A uniqueness violation on the active driver or vehicle must be reported as the matching
    /// [`fleetgate_domain::AssignmentRejection`], never as a storage error.
    async fn insert_assignment(&mut self, assignment: &Assignment) -> Result<(), LedgerError>;

    /// Persists the ended state of an assignment.
    async fn update_assignment(&mut self, assignment: &Assignment) -> AppResult<()>;

    /// Sets a vehicle status.
    async fn set_vehicle_status(
        &mut self,
        vehicle_id: VehicleId,
        status: VehicleStatus,
    ) -> AppResult<()>;

    /// Sets or clears the driver's active assignment pointer.
    async fn set_driver_assignment(
        &mut self,
        driver_id: DriverId,
        assignment_id: Option<AssignmentId>,
    ) -> AppResult<()>;

    /// Commits every write of the transaction atomically.
    async fn commit(self: Box<Self>) -> Result<(), LedgerError>;
}
