use fleetgate_application::FleetRepository;
use fleetgate_core::{AppError, CompanyId};
use fleetgate_domain::{Driver, DriverId, DriverStatus, Role, Vehicle, VehicleId, VehicleStatus};

use super::PostgresFleetRepository;
use crate::postgres_test_support::{seed_company, test_pool};

fn vehicle(company_id: CompanyId, registration: &str, status: VehicleStatus) -> Vehicle {
    Vehicle::new(VehicleId::new(), company_id, registration, status)
        .unwrap_or_else(|_| unreachable!())
}

#[tokio::test]
async fn registration_is_unique_per_company() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let (company_id, _) = seed_company(&pool, Role::Admin).await;
    let (other_company, _) = seed_company(&pool, Role::Admin).await;
    let repository = PostgresFleetRepository::new(pool);

    let registration = format!("UQ-{}", &VehicleId::new().to_string()[..8]);
    assert!(
        repository
            .insert_vehicle(vehicle(company_id, &registration, VehicleStatus::Available))
            .await
            .is_ok()
    );

    let duplicate = repository
        .insert_vehicle(vehicle(company_id, &registration, VehicleStatus::Available))
        .await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));

    assert!(
        repository
            .insert_vehicle(vehicle(other_company, &registration, VehicleStatus::Available))
            .await
            .is_ok()
    );

    let listed = repository.list_vehicles(company_id).await;
    assert!(matches!(listed, Ok(ref vehicles) if vehicles.len() == 1));
}

#[tokio::test]
async fn status_updates_compare_and_set() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let (company_id, _) = seed_company(&pool, Role::Admin).await;
    let repository = PostgresFleetRepository::new(pool);
    let registration = format!("CAS-{}", &VehicleId::new().to_string()[..8]);
    let stored = vehicle(company_id, &registration, VehicleStatus::Available);
    let vehicle_id = stored.id();
    assert!(repository.insert_vehicle(stored).await.is_ok());

    let moved = repository
        .update_vehicle_status(
            vehicle_id,
            VehicleStatus::Available,
            VehicleStatus::Maintenance,
        )
        .await;
    assert!(matches!(moved, Ok(true)));

    let stale = repository
        .update_vehicle_status(vehicle_id, VehicleStatus::Available, VehicleStatus::Inactive)
        .await;
    assert!(matches!(stale, Ok(false)));

    let driver = Driver::new(DriverId::new(), company_id, "Casey", DriverStatus::Active)
        .unwrap_or_else(|_| unreachable!());
    let driver_id = driver.id();
    assert!(repository.insert_driver(driver).await.is_ok());

    let suspended = repository
        .update_driver_status(driver_id, DriverStatus::Active, DriverStatus::Suspended)
        .await;
    assert!(matches!(suspended, Ok(true)));

    let found = repository.find_driver(driver_id).await;
    assert!(matches!(
        found,
        Ok(Some(ref driver)) if driver.status() == DriverStatus::Suspended
    ));
}
