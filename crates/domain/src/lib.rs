//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod assignment;
mod audit;
mod document;
mod fleet;
mod permission;
mod profile;
mod role;

pub use assignment::{
    Assignment, AssignmentId, AssignmentRecord, AssignmentRejection, AssignmentStatus,
    ensure_driver_assignable, ensure_vehicle_assignable, ensure_vehicle_marked_available,
};
pub use audit::AuditAction;
pub use document::{
    Document, DocumentId, DocumentStatus, EXPIRING_SOON_WINDOW_DAYS, derive_status,
};
pub use fleet::{Driver, DriverId, DriverStatus, Vehicle, VehicleId, VehicleStatus};
pub use permission::{Action, Permission, PermissionCatalog, Resource};
pub use profile::{Company, Profile};
pub use role::Role;
