use fleetgate_application::{AssignmentListQuery, CreateAssignmentInput, EndAssignmentInput};
use fleetgate_core::{AppResult, CompanyId};
use fleetgate_domain::{Assignment, DriverId, VehicleId};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::common::{format_timestamp, parse_optional, parse_timestamp};

#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/create-assignment-request.ts"
)]
pub struct CreateAssignmentRequest {
    pub driver_id: String,
    pub vehicle_id: String,
    /// RFC 3339 start, defaults to now.
    pub start_date: Option<String>,
    pub notes: Option<String>,
}

impl CreateAssignmentRequest {
    pub fn into_input(self) -> AppResult<CreateAssignmentInput> {
        Ok(CreateAssignmentInput {
            driver_id: DriverId::parse(self.driver_id.as_str())?,
            vehicle_id: VehicleId::parse(self.vehicle_id.as_str())?,
            start_date: parse_optional(self.start_date.as_deref(), parse_timestamp)?,
            notes: self.notes,
        })
    }
}

#[derive(Debug, Default, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/end-assignment-request.ts"
)]
pub struct EndAssignmentRequest {
    /// RFC 3339 end, defaults to now.
    pub end_date: Option<String>,
    pub notes: Option<String>,
}

impl EndAssignmentRequest {
    pub fn into_input(self) -> AppResult<EndAssignmentInput> {
        Ok(EndAssignmentInput {
            end_date: parse_optional(self.end_date.as_deref(), parse_timestamp)?,
            notes: self.notes,
        })
    }
}

/// Query string of `GET /api/assignments`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssignmentListParams {
    pub company_id: Option<String>,
    pub driver_id: Option<String>,
    pub vehicle_id: Option<String>,
    #[serde(default)]
    pub active_only: bool,
}

impl AssignmentListParams {
    pub fn into_query(self) -> AppResult<(Option<CompanyId>, AssignmentListQuery)> {
        Ok((
            parse_optional(self.company_id.as_deref(), CompanyId::parse)?,
            AssignmentListQuery {
                driver_id: parse_optional(self.driver_id.as_deref(), DriverId::parse)?,
                vehicle_id: parse_optional(self.vehicle_id.as_deref(), VehicleId::parse)?,
                active_only: self.active_only,
            },
        ))
    }
}

#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/assignment-response.ts"
)]
pub struct AssignmentResponse {
    pub id: String,
    pub company_id: String,
    pub driver_id: String,
    pub vehicle_id: String,
    pub start_date: String,
    pub end_date: Option<String>,
    pub status: String,
    pub assigned_by: String,
    pub ended_by: Option<String>,
    pub notes: Option<String>,
    pub end_notes: Option<String>,
}

impl From<Assignment> for AssignmentResponse {
    fn from(value: Assignment) -> Self {
        Self {
            id: value.id().to_string(),
            company_id: value.company_id().to_string(),
            driver_id: value.driver_id().to_string(),
            vehicle_id: value.vehicle_id().to_string(),
            start_date: format_timestamp(value.start_date()),
            end_date: value.end_date().map(format_timestamp),
            status: value.status().as_str().to_owned(),
            assigned_by: value.assigned_by().to_string(),
            ended_by: value.ended_by().map(|user_id| user_id.to_string()),
            notes: value.notes().map(ToOwned::to_owned),
            end_notes: value.end_notes().map(ToOwned::to_owned),
        }
    }
}
