use std::collections::BTreeSet;
use std::sync::Arc;

use fleetgate_core::{AppError, AppResult, CompanyId, UserId};
use fleetgate_domain::{Permission, PermissionCatalog, Profile};
use tracing::warn;

/// Why an authorization request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DenialReason {
    /// No caller, or the caller's profile is inactive.
    Unauthenticated,
    /// The caller's effective permissions lack the requested action.
    InsufficientPermission,
    /// The resource belongs to another company and the caller may not cross over.
    CrossTenantAccess,
}

impl DenialReason {
    /// Returns a stable label for logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::InsufficientPermission => "insufficient_permission",
            Self::CrossTenantAccess => "cross_tenant_access",
        }
    }
}

/// Outcome of one authorization request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationDecision {
    /// The caller may proceed.
    Allowed,
    /// The caller must be stopped before touching persistence.
    Denied(DenialReason),
}

impl AuthorizationDecision {
    /// Returns whether the decision allows the request.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Refused authorization together with the context recorded in internal logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessDenied {
    /// Why access was refused.
    pub reason: DenialReason,
    /// Requested permission.
    pub permission: Permission,
    /// Caller user, when known.
    pub caller: Option<UserId>,
    /// Caller company, when known.
    pub caller_company: Option<CompanyId>,
    /// Company owning the resource, when known.
    pub resource_company: Option<CompanyId>,
}

impl From<AccessDenied> for AppError {
    fn from(value: AccessDenied) -> Self {
        match value.reason {
            DenialReason::Unauthenticated => {
                AppError::Unauthorized("authentication required".to_owned())
            }
            DenialReason::InsufficientPermission => AppError::Forbidden(format!(
                "missing permission '{}'",
                value.permission
            )),
            DenialReason::CrossTenantAccess => AppError::Forbidden(format!(
                "permission '{}' does not extend to company '{}'",
                value.permission,
                value
                    .resource_company
                    .map(|company_id| company_id.to_string())
                    .unwrap_or_default()
            )),
        }
    }
}

/// Caller of one request, resolved from the session and the profile store.
///
/// An absent profile is kept rather than rejected early so that every operation reaches the
/// guard and is refused there.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Caller {
    profile: Option<Profile>,
}

impl Caller {
    /// Creates a caller without identity.
    #[must_use]
    pub fn anonymous() -> Self {
        Self { profile: None }
    }

    /// Creates a caller from a loaded profile.
    #[must_use]
    pub fn from_profile(profile: Option<Profile>) -> Self {
        Self { profile }
    }

    /// Returns the profile, if one was found.
    #[must_use]
    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }
}

/// Single decision point for every read and write in the system.
#[derive(Clone)]
pub struct AuthorizationGuard {
    catalog: Arc<PermissionCatalog>,
}

impl AuthorizationGuard {
    /// Creates a guard over a verified catalog.
    ///
    /// Returns an error when the catalog is incomplete; callers treat that as fatal at startup.
    pub fn new(catalog: PermissionCatalog) -> AppResult<Self> {
        catalog.verify()?;

        Ok(Self {
            catalog: Arc::new(catalog),
        })
    }

    /// Returns the permission catalog.
    #[must_use]
    pub fn catalog(&self) -> &PermissionCatalog {
        &self.catalog
    }

    /// Returns the effective permissions of a profile.
    #[must_use]
    pub fn effective_permissions(&self, profile: &Profile) -> BTreeSet<Permission> {
        self.catalog
            .effective_permissions(profile.role(), profile.explicit_permissions())
    }

    /// Decides whether the caller may perform `action` on a resource of `resource_company_id`.
    ///
    /// Admins may act on resources of other companies; every other role is confined to its
    /// own company.
    #[must_use]
    pub fn authorize(
        &self,
        caller: Option<&Profile>,
        action: &Permission,
        resource_company_id: Option<CompanyId>,
    ) -> AuthorizationDecision {
        let Some(caller) = caller.filter(|profile| profile.is_active()) else {
            return AuthorizationDecision::Denied(DenialReason::Unauthenticated);
        };

        if !self
            .catalog
            .allows(caller.role(), caller.explicit_permissions(), action)
        {
            return AuthorizationDecision::Denied(DenialReason::InsufficientPermission);
        }

        match resource_company_id {
            Some(company_id)
                if company_id != caller.company_id()
                    && !caller.role().crosses_company_boundaries() =>
            {
                AuthorizationDecision::Denied(DenialReason::CrossTenantAccess)
            }
            _ => AuthorizationDecision::Allowed,
        }
    }

    /// Same as [`AuthorizationGuard::authorize`] without the admin cross-company escalation.
    ///
    /// Used where the resource itself defines company membership, such as profiles.
    #[must_use]
    pub fn authorize_within_company(
        &self,
        caller: Option<&Profile>,
        action: &Permission,
        resource_company_id: CompanyId,
    ) -> AuthorizationDecision {
        match self.authorize(caller, action, Some(resource_company_id)) {
            AuthorizationDecision::Allowed => match caller {
                Some(caller) if caller.company_id() != resource_company_id => {
                    AuthorizationDecision::Denied(DenialReason::CrossTenantAccess)
                }
                _ => AuthorizationDecision::Allowed,
            },
            denied => denied,
        }
    }

    /// Authorizes the caller and returns its profile, logging refusals for audit.
    pub fn require<'a>(
        &self,
        caller: &'a Caller,
        action: Permission,
        resource_company_id: Option<CompanyId>,
    ) -> Result<&'a Profile, AccessDenied> {
        let decision = self.authorize(caller.profile(), &action, resource_company_id);
        settle(caller, action, resource_company_id, decision)
    }

    /// Authorizes the caller inside the resource company only, logging refusals for audit.
    pub fn require_within_company<'a>(
        &self,
        caller: &'a Caller,
        action: Permission,
        resource_company_id: CompanyId,
    ) -> Result<&'a Profile, AccessDenied> {
        let decision = self.authorize_within_company(caller.profile(), &action, resource_company_id);
        settle(caller, action, Some(resource_company_id), decision)
    }
}

fn settle(
    caller: &Caller,
    permission: Permission,
    resource_company: Option<CompanyId>,
    decision: AuthorizationDecision,
) -> Result<&Profile, AccessDenied> {
    match (decision, caller.profile()) {
        (AuthorizationDecision::Allowed, Some(profile)) => Ok(profile),
        (AuthorizationDecision::Allowed, None) => Err(denied(
            caller,
            permission,
            resource_company,
            DenialReason::Unauthenticated,
        )),
        (AuthorizationDecision::Denied(reason), _) => {
            Err(denied(caller, permission, resource_company, reason))
        }
    }
}

fn denied(
    caller: &Caller,
    permission: Permission,
    resource_company: Option<CompanyId>,
    reason: DenialReason,
) -> AccessDenied {
    let denial = AccessDenied {
        reason,
        permission,
        caller: caller.profile().map(Profile::user_id),
        caller_company: caller.profile().map(Profile::company_id),
        resource_company,
    };

    warn!(
        reason = denial.reason.as_str(),
        permission = %denial.permission,
        caller = ?denial.caller,
        caller_company = ?denial.caller_company,
        resource_company = ?denial.resource_company,
        "authorization denied"
    );

    denial
}

#[cfg(test)]
mod tests;
