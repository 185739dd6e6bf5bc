use fleetgate_application::CallerDescription;
use fleetgate_domain::{Company, Profile};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Development sign-in payload, exchanged for a session cookie.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/session-request.ts"
)]
pub struct SessionRequest {
    pub token: String,
    pub display_name: String,
    /// Existing user id to sign in as. A new id is issued when omitted.
    pub user_id: Option<String>,
}

/// Signed-in session identity.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/session-response.ts"
)]
pub struct SessionResponse {
    pub user_id: String,
    pub display_name: String,
}

#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/sign-up-request.ts"
)]
pub struct SignUpRequest {
    pub company_name: String,
}

#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/company-response.ts"
)]
pub struct CompanyResponse {
    pub id: String,
    pub name: String,
}

impl From<Company> for CompanyResponse {
    fn from(value: Company) -> Self {
        Self {
            id: value.id().to_string(),
            name: value.name().as_str().to_owned(),
        }
    }
}

#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/profile-response.ts"
)]
pub struct ProfileResponse {
    pub user_id: String,
    pub company_id: String,
    pub display_name: String,
    pub role: String,
    /// Explicit grants on top of the role's base permissions.
    pub permissions: Vec<String>,
    pub is_active: bool,
}

impl From<Profile> for ProfileResponse {
    fn from(value: Profile) -> Self {
        Self {
            user_id: value.user_id().to_string(),
            company_id: value.company_id().to_string(),
            display_name: value.display_name().as_str().to_owned(),
            role: value.role().as_str().to_owned(),
            permissions: value
                .explicit_permissions()
                .iter()
                .map(ToString::to_string)
                .collect(),
            is_active: value.is_active(),
        }
    }
}

#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/sign-up-response.ts"
)]
pub struct SignUpResponse {
    pub company: CompanyResponse,
    pub profile: ProfileResponse,
}

/// The signed-in caller with the permissions every check will see.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/me-response.ts"
)]
pub struct MeResponse {
    pub profile: ProfileResponse,
    pub company: Option<CompanyResponse>,
    pub effective_permissions: Vec<String>,
}

impl From<CallerDescription> for MeResponse {
    fn from(value: CallerDescription) -> Self {
        Self {
            profile: ProfileResponse::from(value.profile),
            company: value.company.map(CompanyResponse::from),
            effective_permissions: value
                .effective_permissions
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}
