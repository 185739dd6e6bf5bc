use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use fleetgate_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::Role;

/// Resources guarded by the permission model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    /// Fleet vehicles.
    Vehicles,
    /// Fleet drivers.
    Drivers,
    /// Driver to vehicle assignments.
    Assignments,
    /// Driver documents.
    Documents,
    /// User profiles of a company.
    Profiles,
    /// Company settings.
    Companies,
}

impl Resource {
    /// Returns the token prefix for this resource.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vehicles => "vehicles",
            Self::Drivers => "drivers",
            Self::Assignments => "assignments",
            Self::Documents => "documents",
            Self::Profiles => "profiles",
            Self::Companies => "companies",
        }
    }
}

/// Actions that can be performed on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Read access.
    Read,
    /// Create access.
    Create,
    /// Update access.
    Update,
    /// Delete access.
    Delete,
    /// Administrative access over the resource.
    Manage,
}

impl Action {
    /// Returns the token suffix for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Manage => "manage",
        }
    }
}

/// Permission token of shape `resource:action`.
///
/// Tokens outside the built-in [`Resource`] and [`Action`] vocabulary are accepted as explicit
/// grants as long as they are well formed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Permission(String);

impl Permission {
    /// Builds a permission from the built-in vocabulary.
    #[must_use]
    pub fn new(resource: Resource, action: Action) -> Self {
        Self(format!("{}:{}", resource.as_str(), action.as_str()))
    }

    /// Parses and validates a transport or storage token.
    pub fn parse(value: &str) -> AppResult<Self> {
        let value = value.trim();
        let Some((resource, action)) = value.split_once(':') else {
            return Err(AppError::Validation(format!(
                "permission '{value}' must have the shape 'resource:action'"
            )));
        };

        if !is_token_segment(resource) || !is_token_segment(action) {
            return Err(AppError::Validation(format!(
                "permission '{value}' must use lowercase letters, digits, '_' or '-' on both sides of ':'"
            )));
        }

        Ok(Self(value.to_owned()))
    }

    /// Returns the token value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the resource half of the token.
    #[must_use]
    pub fn resource(&self) -> &str {
        self.0.split_once(':').map_or("", |(resource, _)| resource)
    }

    /// Returns the action half of the token.
    #[must_use]
    pub fn action(&self) -> &str {
        self.0.split_once(':').map_or("", |(_, action)| action)
    }
}

fn is_token_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment.bytes().all(|byte| {
            byte.is_ascii_lowercase() || byte.is_ascii_digit() || byte == b'_' || byte == b'-'
        })
}

impl FromStr for Permission {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl TryFrom<String> for Permission {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value.as_str())
    }
}

impl From<Permission> for String {
    fn from(value: Permission) -> Self {
        value.0
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

const CRUD: &[Action] = &[Action::Read, Action::Create, Action::Update, Action::Delete];
const READ_ONLY: &[Action] = &[Action::Read];
const ASSIGNMENT_LIFECYCLE: &[Action] = &[Action::Read, Action::Create, Action::Update];

type RoleGrants = &'static [(Resource, &'static [Action])];

const ADMIN_GRANTS: RoleGrants = &[
    (Resource::Vehicles, CRUD),
    (Resource::Drivers, CRUD),
    (Resource::Assignments, ASSIGNMENT_LIFECYCLE),
    (Resource::Documents, CRUD),
    (Resource::Profiles, &[Action::Read, Action::Manage]),
    (Resource::Companies, &[Action::Read, Action::Update]),
];

const MANAGER_GRANTS: RoleGrants = &[
    (Resource::Vehicles, CRUD),
    (Resource::Drivers, CRUD),
    (Resource::Assignments, ASSIGNMENT_LIFECYCLE),
    (Resource::Documents, CRUD),
    (Resource::Profiles, READ_ONLY),
    (Resource::Companies, READ_ONLY),
];

const DISPATCHER_GRANTS: RoleGrants = &[
    (Resource::Vehicles, &[Action::Read, Action::Update]),
    (Resource::Drivers, READ_ONLY),
    (Resource::Assignments, ASSIGNMENT_LIFECYCLE),
    (Resource::Documents, &[Action::Read, Action::Create]),
];

const USER_GRANTS: RoleGrants = &[
    (Resource::Vehicles, READ_ONLY),
    (Resource::Drivers, READ_ONLY),
    (Resource::Assignments, READ_ONLY),
    (Resource::Documents, READ_ONLY),
];

fn grants_for(role: Role) -> RoleGrants {
    match role {
        Role::Admin => ADMIN_GRANTS,
        Role::Manager => MANAGER_GRANTS,
        Role::Dispatcher => DISPATCHER_GRANTS,
        Role::User => USER_GRANTS,
    }
}

static NO_PERMISSIONS: BTreeSet<Permission> = BTreeSet::new();

/// Role to base permission table.
///
/// The table is read-only after construction. Effective permissions are the union of a role's
/// base set and the explicit grants stored on a profile; grants never remove anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionCatalog {
    base: BTreeMap<Role, BTreeSet<Permission>>,
}

impl PermissionCatalog {
    /// Builds the standard catalog shipped with the product.
    #[must_use]
    pub fn standard() -> Self {
        let base = Role::all()
            .iter()
            .map(|role| {
                let permissions = grants_for(*role)
                    .iter()
                    .flat_map(|(resource, actions)| {
                        actions
                            .iter()
                            .map(|action| Permission::new(*resource, *action))
                    })
                    .collect();
                (*role, permissions)
            })
            .collect();

        Self { base }
    }

    /// Builds a catalog from an explicit table.
    #[must_use]
    pub fn from_table(base: BTreeMap<Role, BTreeSet<Permission>>) -> Self {
        Self { base }
    }

    /// Checks that every role has a base permission set.
    ///
    /// A catalog that fails this check is a configuration error and must stop startup.
    pub fn verify(&self) -> AppResult<()> {
        for role in Role::all() {
            match self.base.get(role) {
                Some(permissions) if !permissions.is_empty() => {}
                _ => {
                    return Err(AppError::Internal(format!(
                        "permission catalog has no base permissions for role '{role}'"
                    )));
                }
            }
        }

        Ok(())
    }

    /// Returns the fixed base permission set for a role.
    #[must_use]
    pub fn base_permissions(&self, role: Role) -> &BTreeSet<Permission> {
        self.base.get(&role).unwrap_or(&NO_PERMISSIONS)
    }

    /// Returns the base set of the role unioned with explicit grants.
    #[must_use]
    pub fn effective_permissions(
        &self,
        role: Role,
        explicit_grants: &BTreeSet<Permission>,
    ) -> BTreeSet<Permission> {
        self.base_permissions(role)
            .union(explicit_grants)
            .cloned()
            .collect()
    }

    /// Returns whether the role plus explicit grants include the permission.
    #[must_use]
    pub fn allows(
        &self,
        role: Role,
        explicit_grants: &BTreeSet<Permission>,
        permission: &Permission,
    ) -> bool {
        self.base_permissions(role).contains(permission) || explicit_grants.contains(permission)
    }
}

impl Default for PermissionCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
