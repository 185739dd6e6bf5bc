//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_fleet_store;
mod postgres_assignment_repository;
mod postgres_audit_repository;
mod postgres_document_repository;
mod postgres_fleet_repository;
mod postgres_fleet_rows;
mod postgres_profile_repository;
#[cfg(test)]
mod postgres_test_support;
mod signed_url_storage;

pub use in_memory_fleet_store::InMemoryFleetStore;
pub use postgres_assignment_repository::PostgresAssignmentRepository;
pub use postgres_audit_repository::PostgresAuditRepository;
pub use postgres_document_repository::PostgresDocumentRepository;
pub use postgres_fleet_repository::PostgresFleetRepository;
pub use postgres_profile_repository::PostgresProfileRepository;
pub use signed_url_storage::SignedUrlStorage;
