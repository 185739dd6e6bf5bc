use std::collections::BTreeSet;

use fleetgate_core::{AppError, AppResult, CompanyId, NonEmptyString, UserId};
use serde::{Deserialize, Serialize};

use crate::{Permission, Role};

/// Company (tenant) record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    id: CompanyId,
    name: NonEmptyString,
}

impl Company {
    /// Creates a validated company.
    pub fn new(id: CompanyId, name: impl Into<String>) -> AppResult<Self> {
        let name: String = name.into();
        Ok(Self {
            id,
            name: NonEmptyString::new(name.trim())?,
        })
    }

    /// Returns the company id.
    #[must_use]
    pub fn id(&self) -> CompanyId {
        self.id
    }

    /// Returns the company display name.
    #[must_use]
    pub fn name(&self) -> &NonEmptyString {
        &self.name
    }
}

/// Authorization profile of a user inside exactly one company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    user_id: UserId,
    company_id: CompanyId,
    display_name: NonEmptyString,
    role: Role,
    explicit_permissions: BTreeSet<Permission>,
    is_active: bool,
}

impl Profile {
    /// Creates an active profile without explicit grants.
    pub fn new(
        user_id: UserId,
        company_id: CompanyId,
        display_name: impl Into<String>,
        role: Role,
    ) -> AppResult<Self> {
        Ok(Self {
            user_id,
            company_id,
            display_name: NonEmptyString::new(display_name)?,
            role,
            explicit_permissions: BTreeSet::new(),
            is_active: true,
        })
    }

    /// Creates the first profile of a new company, which is always an admin.
    pub fn company_owner(
        user_id: UserId,
        company_id: CompanyId,
        display_name: impl Into<String>,
    ) -> AppResult<Self> {
        Self::new(user_id, company_id, display_name, Role::Admin)
    }

    /// Rebuilds a profile from persisted state.
    pub fn restore(
        user_id: UserId,
        company_id: CompanyId,
        display_name: impl Into<String>,
        role: Role,
        explicit_permissions: BTreeSet<Permission>,
        is_active: bool,
    ) -> AppResult<Self> {
        Ok(Self {
            user_id,
            company_id,
            display_name: NonEmptyString::new(display_name)?,
            role,
            explicit_permissions,
            is_active,
        })
    }

    /// Returns the user id.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the owning company.
    #[must_use]
    pub fn company_id(&self) -> CompanyId {
        self.company_id
    }

    /// Returns the display name.
    #[must_use]
    pub fn display_name(&self) -> &NonEmptyString {
        &self.display_name
    }

    /// Returns the role.
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Returns the explicit grants stored on the profile.
    #[must_use]
    pub fn explicit_permissions(&self) -> &BTreeSet<Permission> {
        &self.explicit_permissions
    }

    /// Returns whether the profile may authenticate.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Changes the role.
    pub fn change_role(&mut self, role: Role) {
        self.role = role;
    }

    /// Adds explicit grants. Returns the grants that were not already present.
    pub fn grant(&mut self, permissions: impl IntoIterator<Item = Permission>) -> Vec<Permission> {
        permissions
            .into_iter()
            .filter(|permission| self.explicit_permissions.insert(permission.clone()))
            .collect()
    }

    /// Activates or deactivates the profile.
    pub fn set_active(&mut self, is_active: bool) {
        self.is_active = is_active;
    }

    /// Ensures the profile belongs to the given company.
    pub fn ensure_company(&self, company_id: CompanyId) -> AppResult<()> {
        if self.company_id != company_id {
            return Err(AppError::NotFound(format!(
                "profile '{}' does not exist in company '{company_id}'",
                self.user_id
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use fleetgate_core::{CompanyId, UserId};

    use super::{Company, Profile};
    use crate::{Permission, Role};

    #[test]
    fn company_owner_is_admin_and_active() {
        let profile = Profile::company_owner(UserId::new(), CompanyId::new(), "Ada");
        assert!(profile.is_ok());

        let profile = profile.unwrap_or_else(|_| unreachable!());
        assert_eq!(profile.role(), Role::Admin);
        assert!(profile.is_active());
        assert!(profile.explicit_permissions().is_empty());
    }

    #[test]
    fn blank_company_name_is_rejected() {
        assert!(Company::new(CompanyId::new(), "   ").is_err());
    }

    #[test]
    fn grant_reports_only_new_permissions() {
        let mut profile = Profile::new(UserId::new(), CompanyId::new(), "Bo", Role::User)
            .unwrap_or_else(|_| unreachable!());
        let export = Permission::parse("reports:export").unwrap_or_else(|_| unreachable!());

        let first = profile.grant([export.clone()]);
        let second = profile.grant([export.clone()]);

        assert_eq!(first, vec![export]);
        assert!(second.is_empty());
        assert_eq!(profile.explicit_permissions().len(), 1);
    }
}
