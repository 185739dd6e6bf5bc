use std::str::FromStr;

use fleetgate_application::{RegisterDriverInput, RegisterVehicleInput};
use fleetgate_core::{AppResult, CompanyId};
use fleetgate_domain::{Driver, DriverStatus, Vehicle, VehicleStatus};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::common::parse_optional;

#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/register-vehicle-request.ts"
)]
pub struct RegisterVehicleRequest {
    /// Owning company, defaults to the caller's.
    pub company_id: Option<String>,
    pub registration: String,
}

impl RegisterVehicleRequest {
    pub fn into_input(self) -> AppResult<RegisterVehicleInput> {
        Ok(RegisterVehicleInput {
            company_id: parse_optional(self.company_id.as_deref(), CompanyId::parse)?,
            registration: self.registration,
        })
    }
}

#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/vehicle-response.ts"
)]
pub struct VehicleResponse {
    pub id: String,
    pub company_id: String,
    pub registration: String,
    pub status: String,
}

impl From<Vehicle> for VehicleResponse {
    fn from(value: Vehicle) -> Self {
        Self {
            id: value.id().to_string(),
            company_id: value.company_id().to_string(),
            registration: value.registration().as_str().to_owned(),
            status: value.status().as_str().to_owned(),
        }
    }
}

#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/change-vehicle-status-request.ts"
)]
pub struct ChangeVehicleStatusRequest {
    pub status: String,
}

impl ChangeVehicleStatusRequest {
    pub fn status(&self) -> AppResult<VehicleStatus> {
        VehicleStatus::from_str(self.status.as_str())
    }
}

#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/register-driver-request.ts"
)]
pub struct RegisterDriverRequest {
    /// Owning company, defaults to the caller's.
    pub company_id: Option<String>,
    pub full_name: String,
}

impl RegisterDriverRequest {
    pub fn into_input(self) -> AppResult<RegisterDriverInput> {
        Ok(RegisterDriverInput {
            company_id: parse_optional(self.company_id.as_deref(), CompanyId::parse)?,
            full_name: self.full_name,
        })
    }
}

#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/driver-response.ts"
)]
pub struct DriverResponse {
    pub id: String,
    pub company_id: String,
    pub full_name: String,
    pub status: String,
    pub current_assignment_id: Option<String>,
}

impl From<Driver> for DriverResponse {
    fn from(value: Driver) -> Self {
        Self {
            id: value.id().to_string(),
            company_id: value.company_id().to_string(),
            full_name: value.full_name().as_str().to_owned(),
            status: value.status().as_str().to_owned(),
            current_assignment_id: value
                .current_assignment_id()
                .map(|assignment_id| assignment_id.to_string()),
        }
    }
}

#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/change-driver-status-request.ts"
)]
pub struct ChangeDriverStatusRequest {
    pub status: String,
}

impl ChangeDriverStatusRequest {
    pub fn status(&self) -> AppResult<DriverStatus> {
        DriverStatus::from_str(self.status.as_str())
    }
}
