use serde::{Deserialize, Serialize};

/// Stable audit actions emitted by application use-cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Emitted when a company and its first admin are created.
    CompanyCreated,
    /// Emitted when a profile is added to a company.
    ProfileCreated,
    /// Emitted when a profile's role changes.
    ProfileRoleChanged,
    /// Emitted when explicit permissions are granted to a profile.
    ProfilePermissionsGranted,
    /// Emitted when a profile is activated or deactivated.
    ProfileActivationChanged,
    /// Emitted when a vehicle is registered.
    VehicleRegistered,
    /// Emitted when a vehicle status is changed by a user.
    VehicleStatusChanged,
    /// Emitted when a driver is registered.
    DriverRegistered,
    /// Emitted when a driver status is changed by a user.
    DriverStatusChanged,
    /// Emitted when an assignment is created.
    AssignmentCreated,
    /// Emitted when an assignment is ended.
    AssignmentEnded,
    /// Emitted when a document upload target is issued.
    DocumentUploadPrepared,
    /// Emitted when a document is deleted.
    DocumentDeleted,
}

impl AuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CompanyCreated => "company.created",
            Self::ProfileCreated => "profile.created",
            Self::ProfileRoleChanged => "profile.role_changed",
            Self::ProfilePermissionsGranted => "profile.permissions_granted",
            Self::ProfileActivationChanged => "profile.activation_changed",
            Self::VehicleRegistered => "vehicle.registered",
            Self::VehicleStatusChanged => "vehicle.status_changed",
            Self::DriverRegistered => "driver.registered",
            Self::DriverStatusChanged => "driver.status_changed",
            Self::AssignmentCreated => "assignment.created",
            Self::AssignmentEnded => "assignment.ended",
            Self::DocumentUploadPrepared => "document.upload_prepared",
            Self::DocumentDeleted => "document.deleted",
        }
    }
}
