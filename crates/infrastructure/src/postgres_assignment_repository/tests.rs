use std::sync::Arc;

use chrono::Utc;
use fleetgate_application::{
    AssignmentLedger, AssignmentListQuery, AssignmentRepository, AuthorizationGuard, Caller,
    CreateAssignmentInput, EndAssignmentInput, FleetRepository, LedgerError,
};
use fleetgate_core::CompanyId;
use fleetgate_domain::{
    Assignment, AssignmentRejection, AssignmentStatus, Driver, DriverId, DriverStatus,
    PermissionCatalog, Role, Vehicle, VehicleId, VehicleStatus,
};
use sqlx::PgPool;

use super::PostgresAssignmentRepository;
use crate::postgres_test_support::{seed_company, test_pool};
use crate::{PostgresAuditRepository, PostgresFleetRepository};

fn ledger(pool: &PgPool) -> AssignmentLedger {
    let guard =
        AuthorizationGuard::new(PermissionCatalog::standard()).unwrap_or_else(|_| unreachable!());
    AssignmentLedger::new(
        guard,
        Arc::new(PostgresFleetRepository::new(pool.clone())),
        Arc::new(PostgresAssignmentRepository::new(pool.clone())),
        Arc::new(PostgresAuditRepository::new(pool.clone())),
    )
}

async fn driver(pool: &PgPool, company_id: CompanyId) -> Driver {
    let driver = Driver::new(DriverId::new(), company_id, "Pat Postgres", DriverStatus::Active)
        .unwrap_or_else(|_| unreachable!());
    let repository = PostgresFleetRepository::new(pool.clone());
    assert!(repository.insert_driver(driver.clone()).await.is_ok());
    driver
}

async fn vehicle(pool: &PgPool, company_id: CompanyId) -> Vehicle {
    let vehicle_id = VehicleId::new();
    let vehicle = Vehicle::new(
        vehicle_id,
        company_id,
        format!("PG-{}", &vehicle_id.to_string()[..8]),
        VehicleStatus::Available,
    )
    .unwrap_or_else(|_| unreachable!());
    let repository = PostgresFleetRepository::new(pool.clone());
    assert!(repository.insert_vehicle(vehicle.clone()).await.is_ok());
    vehicle
}

fn input(driver_id: DriverId, vehicle_id: VehicleId) -> CreateAssignmentInput {
    CreateAssignmentInput {
        driver_id,
        vehicle_id,
        start_date: None,
        notes: None,
    }
}

#[tokio::test]
async fn ledger_round_trip_keeps_rows_in_step() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let (company_id, manager) = seed_company(&pool, Role::Manager).await;
    let manager = Caller::from_profile(Some(manager));
    let driver = driver(&pool, company_id).await;
    let vehicle = vehicle(&pool, company_id).await;
    let ledger = ledger(&pool);
    let fleet = PostgresFleetRepository::new(pool.clone());
    let assignments = PostgresAssignmentRepository::new(pool.clone());

    let created = ledger.create(&manager, input(driver.id(), vehicle.id())).await;
    assert!(created.is_ok());
    let created = created.unwrap_or_else(|_| unreachable!());

    let stored_vehicle = fleet.find_vehicle(vehicle.id()).await;
    assert!(matches!(
        stored_vehicle,
        Ok(Some(ref stored)) if stored.status() == VehicleStatus::Assigned
    ));
    let stored_driver = fleet.find_driver(driver.id()).await;
    assert!(matches!(
        stored_driver,
        Ok(Some(ref stored)) if stored.current_assignment_id() == Some(created.id())
    ));

    let active = assignments.find_active_for_vehicle(vehicle.id()).await;
    assert!(matches!(active, Ok(Some(ref found)) if found.id() == created.id()));

    let ended = ledger
        .end(&manager, created.id(), EndAssignmentInput::default())
        .await;
    assert!(matches!(ended, Ok(ref ended) if ended.status() == AssignmentStatus::Ended));

    let stored_vehicle = fleet.find_vehicle(vehicle.id()).await;
    assert!(matches!(
        stored_vehicle,
        Ok(Some(ref stored)) if stored.status() == VehicleStatus::Available
    ));
    let stored_driver = fleet.find_driver(driver.id()).await;
    assert!(matches!(
        stored_driver,
        Ok(Some(ref stored)) if stored.current_assignment_id().is_none()
    ));

    let history = assignments
        .list_assignments(
            company_id,
            AssignmentListQuery {
                driver_id: Some(driver.id()),
                ..AssignmentListQuery::default()
            },
        )
        .await;
    assert!(matches!(history, Ok(ref rows) if rows.len() == 1));
}

#[tokio::test]
async fn concurrent_creates_admit_one_assignment_per_vehicle() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let (company_id, dispatcher) = seed_company(&pool, Role::Dispatcher).await;
    let dispatcher = Caller::from_profile(Some(dispatcher));
    let vehicle = vehicle(&pool, company_id).await;
    let ledger = ledger(&pool);

    let mut handles = Vec::new();
    for _ in 0..6 {
        let driver = driver(&pool, company_id).await;
        let ledger = ledger.clone();
        let dispatcher = dispatcher.clone();
        let vehicle_id = vehicle.id();
        handles.push(tokio::spawn(async move {
            ledger
                .create(&dispatcher, input(driver.id(), vehicle_id))
                .await
        }));
    }

    let mut admitted = 0;
    for handle in handles {
        match handle.await.unwrap_or_else(|_| unreachable!()) {
            Ok(_) => admitted += 1,
            Err(error) => assert_eq!(
                error.rejection(),
                Some(AssignmentRejection::VehicleAlreadyAssigned)
            ),
        }
    }
    assert_eq!(admitted, 1);

    let active = PostgresAssignmentRepository::new(pool.clone())
        .list_assignments(
            company_id,
            AssignmentListQuery {
                vehicle_id: Some(vehicle.id()),
                active_only: true,
                ..AssignmentListQuery::default()
            },
        )
        .await;
    assert!(matches!(active, Ok(ref rows) if rows.len() == 1));
}

#[tokio::test]
async fn active_indexes_map_to_rejections() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let (company_id, manager) = seed_company(&pool, Role::Manager).await;
    let first_driver = driver(&pool, company_id).await;
    let other_driver = driver(&pool, company_id).await;
    let first_vehicle = vehicle(&pool, company_id).await;
    let other_vehicle = vehicle(&pool, company_id).await;
    let repository = PostgresAssignmentRepository::new(pool.clone());

    let first = Assignment::start(
        &first_driver,
        &first_vehicle,
        Utc::now(),
        manager.user_id(),
        None,
    );
    let transaction = repository.begin().await;
    assert!(transaction.is_ok());
    let mut transaction = transaction.unwrap_or_else(|_| unreachable!());
    assert!(transaction.insert_assignment(&first).await.is_ok());
    assert!(transaction.commit().await.is_ok());

    let same_driver =
        Assignment::start(&first_driver, &other_vehicle, Utc::now(), manager.user_id(), None);
    let transaction = repository.begin().await;
    let mut transaction = transaction.unwrap_or_else(|_| unreachable!());
    let result = transaction.insert_assignment(&same_driver).await;
    assert!(matches!(
        result,
        Err(LedgerError::Rejected(AssignmentRejection::DriverAlreadyAssigned))
    ));
    drop(transaction);

    let same_vehicle =
        Assignment::start(&other_driver, &first_vehicle, Utc::now(), manager.user_id(), None);
    let transaction = repository.begin().await;
    let mut transaction = transaction.unwrap_or_else(|_| unreachable!());
    let result = transaction.insert_assignment(&same_vehicle).await;
    assert!(matches!(
        result,
        Err(LedgerError::Rejected(AssignmentRejection::VehicleAlreadyAssigned))
    ));
}
