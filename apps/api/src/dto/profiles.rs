use std::str::FromStr;

use fleetgate_application::AddMemberInput;
use fleetgate_core::{AppResult, UserId};
use fleetgate_domain::Role;
use serde::Deserialize;
use ts_rs::TS;

#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/add-member-request.ts"
)]
pub struct AddMemberRequest {
    pub user_id: String,
    pub display_name: String,
    pub role: String,
}

impl AddMemberRequest {
    pub fn into_input(self) -> AppResult<AddMemberInput> {
        Ok(AddMemberInput {
            user_id: UserId::parse(self.user_id.as_str())?,
            display_name: self.display_name,
            role: Role::from_str(self.role.as_str())?,
        })
    }
}

#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/change-role-request.ts"
)]
pub struct ChangeRoleRequest {
    pub role: String,
}

impl ChangeRoleRequest {
    pub fn role(&self) -> AppResult<Role> {
        Role::from_str(self.role.as_str())
    }
}

#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/grant-permissions-request.ts"
)]
pub struct GrantPermissionsRequest {
    /// Tokens in `resource:action` form.
    pub permissions: Vec<String>,
}

#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/set-active-request.ts"
)]
pub struct SetActiveRequest {
    pub is_active: bool,
}
