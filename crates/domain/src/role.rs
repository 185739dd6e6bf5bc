use std::str::FromStr;

use fleetgate_core::AppError;
use serde::{Deserialize, Serialize};

/// Closed set of roles a profile can hold inside its company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full control of the company, and the only role allowed to act across companies.
    Admin,
    /// Manages the fleet registry, assignments and documents.
    Manager,
    /// Moves vehicles between drivers and files driver documents.
    Dispatcher,
    /// Read-only access.
    User,
}

impl Role {
    /// Returns a stable storage value for this role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::Dispatcher => "dispatcher",
            Self::User => "user",
        }
    }

    /// Returns every known role.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Role] = &[Role::Admin, Role::Manager, Role::Dispatcher, Role::User];

        ALL
    }

    /// Returns whether this role may act on resources owned by another company.
    #[must_use]
    pub fn crosses_company_boundaries(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "admin" => Ok(Self::Admin),
            "manager" => Ok(Self::Manager),
            "dispatcher" => Ok(Self::Dispatcher),
            "user" => Ok(Self::User),
            _ => Err(AppError::Validation(format!("unknown role '{value}'"))),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::Role;

    #[test]
    fn role_roundtrip_storage_value() {
        for role in Role::all() {
            let restored = Role::from_str(role.as_str());
            assert!(restored.is_ok());
            assert_eq!(restored.unwrap_or(Role::User), *role);
        }
    }

    #[test]
    fn unknown_role_is_rejected() {
        assert!(Role::from_str("owner").is_err());
        assert!(Role::from_str("Admin").is_err());
    }

    #[test]
    fn only_admin_crosses_company_boundaries() {
        let crossing: Vec<Role> = Role::all()
            .iter()
            .copied()
            .filter(Role::crosses_company_boundaries)
            .collect();
        assert_eq!(crossing, vec![Role::Admin]);
    }
}
