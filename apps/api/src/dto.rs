mod assignments;
mod common;
mod documents;
mod fleet;
mod profiles;
mod session;

pub use assignments::{
    AssignmentListParams, AssignmentResponse, CreateAssignmentRequest, EndAssignmentRequest,
};
pub use common::{CompanyScopeQuery, HealthResponse};
pub use documents::{DocumentResponse, PrepareUploadRequest, PreparedUploadResponse};
pub use fleet::{
    ChangeDriverStatusRequest, ChangeVehicleStatusRequest, DriverResponse, RegisterDriverRequest,
    RegisterVehicleRequest, VehicleResponse,
};
pub use profiles::{AddMemberRequest, ChangeRoleRequest, GrantPermissionsRequest, SetActiveRequest};
pub use session::{
    CompanyResponse, MeResponse, ProfileResponse, SessionRequest, SessionResponse, SignUpRequest,
    SignUpResponse,
};

#[cfg(test)]
mod tests {
    use super::{
        AddMemberRequest, AssignmentResponse, ChangeDriverStatusRequest, ChangeRoleRequest,
        ChangeVehicleStatusRequest, CompanyResponse, CreateAssignmentRequest,
        DocumentResponse, DriverResponse, EndAssignmentRequest, GrantPermissionsRequest,
        HealthResponse, MeResponse, PrepareUploadRequest, PreparedUploadResponse, ProfileResponse,
        RegisterDriverRequest, RegisterVehicleRequest, SessionRequest, SessionResponse,
        SetActiveRequest, SignUpRequest, SignUpResponse, VehicleResponse,
    };

    use crate::error::ErrorResponse;
    use ts_rs::Config;
    use ts_rs::TS;

    #[test]
    fn export_ts_bindings() -> Result<(), ts_rs::ExportError> {
        let config = Config::default();

        HealthResponse::export(&config)?;
        ErrorResponse::export(&config)?;
        SessionRequest::export(&config)?;
        SessionResponse::export(&config)?;
        SignUpRequest::export(&config)?;
        SignUpResponse::export(&config)?;
        CompanyResponse::export(&config)?;
        ProfileResponse::export(&config)?;
        MeResponse::export(&config)?;
        RegisterVehicleRequest::export(&config)?;
        ChangeVehicleStatusRequest::export(&config)?;
        VehicleResponse::export(&config)?;
        RegisterDriverRequest::export(&config)?;
        ChangeDriverStatusRequest::export(&config)?;
        DriverResponse::export(&config)?;
        CreateAssignmentRequest::export(&config)?;
        EndAssignmentRequest::export(&config)?;
        AssignmentResponse::export(&config)?;
        PrepareUploadRequest::export(&config)?;
        DocumentResponse::export(&config)?;
        PreparedUploadResponse::export(&config)?;
        AddMemberRequest::export(&config)?;
        ChangeRoleRequest::export(&config)?;
        GrantPermissionsRequest::export(&config)?;
        SetActiveRequest::export(&config)?;

        Ok(())
    }

    #[test]
    fn blank_optional_fields_are_treated_as_absent() {
        let request = EndAssignmentRequest {
            end_date: Some("  ".to_owned()),
            notes: None,
        };
        let input = request.into_input();
        assert!(matches!(input, Ok(ref input) if input.end_date.is_none()));
    }

    #[test]
    fn malformed_identifiers_are_validation_errors() {
        let request = CreateAssignmentRequest {
            driver_id: "not-a-uuid".to_owned(),
            vehicle_id: "also-not".to_owned(),
            start_date: None,
            notes: None,
        };
        assert!(matches!(
            request.into_input(),
            Err(fleetgate_core::AppError::Validation(_))
        ));
    }
}
