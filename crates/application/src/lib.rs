//! Application services and ports.

#![forbid(unsafe_code)]

mod assignment_ledger;
mod assignment_ports;
mod audit_ports;
mod authorization_guard;
mod document_ports;
mod document_service;
mod fleet_ports;
mod fleet_service;
mod profile_ports;
mod profile_service;

pub use assignment_ledger::{
    AssignmentLedger, CreateAssignmentInput, EndAssignmentInput, LedgerError,
};
pub use assignment_ports::{AssignmentListQuery, AssignmentRepository, AssignmentTransaction};
pub use audit_ports::{AuditEvent, AuditRepository};
pub use authorization_guard::{
    AccessDenied, AuthorizationDecision, AuthorizationGuard, Caller, DenialReason,
};
pub use document_ports::{DocumentRepository, StorageCapability, UploadTarget};
pub use document_service::{
    DocumentService, DocumentView, PrepareUploadInput, PreparedUpload, UploadRefusal,
};
pub use fleet_ports::FleetRepository;
pub use fleet_service::{FleetService, RegisterDriverInput, RegisterVehicleInput};
pub use profile_ports::ProfileRepository;
pub use profile_service::{AddMemberInput, CallerDescription, ProfileService};
