use std::collections::BTreeSet;
use std::sync::Arc;

use fleetgate_core::{AppError, AppResult, CompanyId, UserId};
use fleetgate_domain::{Action, AuditAction, Company, Permission, Profile, Resource, Role};
use tracing::{info, warn};

use crate::{AuditEvent, AuditRepository, AuthorizationGuard, Caller, ProfileRepository};

/// Input for adding a member to the caller's company.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddMemberInput {
    /// Identity issued by the authentication provider.
    pub user_id: UserId,
    /// Display name.
    pub display_name: String,
    /// Initial role.
    pub role: Role,
}

/// Resolved caller with the permissions the guard would grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerDescription {
    /// Caller profile.
    pub profile: Profile,
    /// Company of the caller, when still present.
    pub company: Option<Company>,
    /// Base role permissions plus explicit grants.
    pub effective_permissions: BTreeSet<Permission>,
}

/// Companies, profiles and explicit grants.
#[derive(Clone)]
pub struct ProfileService {
    guard: AuthorizationGuard,
    profile_repository: Arc<dyn ProfileRepository>,
    audit_repository: Arc<dyn AuditRepository>,
}

impl ProfileService {
    /// Creates a new profile service.
    #[must_use]
    pub fn new(
        guard: AuthorizationGuard,
        profile_repository: Arc<dyn ProfileRepository>,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            guard,
            profile_repository,
            audit_repository,
        }
    }

    /// Resolves the caller of a request from the session identity.
    ///
    /// A missing identity or a user without profile resolves to an anonymous caller, which the
    /// guard then refuses.
    pub async fn resolve_caller(&self, user_id: Option<UserId>) -> AppResult<Caller> {
        let Some(user_id) = user_id else {
            return Ok(Caller::anonymous());
        };

        Ok(Caller::from_profile(
            self.profile_repository.find_profile(user_id).await?,
        ))
    }

    /// Describes the signed-in caller.
    pub async fn describe(&self, caller: &Caller) -> AppResult<CallerDescription> {
        let profile = caller
            .profile()
            .filter(|profile| profile.is_active())
            .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

        Ok(CallerDescription {
            company: self
                .profile_repository
                .find_company(profile.company_id())
                .await?,
            effective_permissions: self.guard.effective_permissions(profile),
            profile: profile.clone(),
        })
    }

    /// Creates a company owned by a user without a profile. The user becomes its admin.
    pub async fn sign_up(
        &self,
        user_id: UserId,
        display_name: &str,
        company_name: &str,
    ) -> AppResult<(Company, Profile)> {
        if self.profile_repository.find_profile(user_id).await?.is_some() {
            return Err(AppError::Conflict(
                "user already belongs to a company".to_owned(),
            ));
        }

        let company = Company::new(CompanyId::new(), company_name)?;
        let owner = Profile::company_owner(user_id, company.id(), display_name.trim())?;
        self.profile_repository
            .create_company_with_owner(company.clone(), owner.clone())
            .await?;

        info!(company_id = %company.id(), user_id = %user_id, "company created");
        self.record(
            &owner,
            company.id(),
            AuditAction::CompanyCreated,
            "company",
            company.id().to_string(),
            Some(company.name().as_str().to_owned()),
        )
        .await;

        Ok((company, owner))
    }

    /// Lists the profiles of the caller's company.
    pub async fn list_profiles(&self, caller: &Caller) -> AppResult<Vec<Profile>> {
        let company_id = caller
            .profile()
            .map(Profile::company_id)
            .unwrap_or_default();
        self.guard.require_within_company(
            caller,
            Permission::new(Resource::Profiles, Action::Read),
            company_id,
        )?;

        self.profile_repository.list_profiles(company_id).await
    }

    /// Adds a member to the caller's company.
    pub async fn add_member(&self, caller: &Caller, input: AddMemberInput) -> AppResult<Profile> {
        let company_id = caller
            .profile()
            .map(Profile::company_id)
            .unwrap_or_default();
        let actor = self.guard.require_within_company(
            caller,
            Permission::new(Resource::Profiles, Action::Manage),
            company_id,
        )?;

        let profile = Profile::new(
            input.user_id,
            company_id,
            input.display_name.trim(),
            input.role,
        )?;
        self.profile_repository.insert_profile(profile.clone()).await?;

        info!(user_id = %profile.user_id(), company_id = %company_id, role = profile.role().as_str(), "profile created");
        self.record(
            actor,
            company_id,
            AuditAction::ProfileCreated,
            "profile",
            profile.user_id().to_string(),
            Some(profile.role().as_str().to_owned()),
        )
        .await;

        Ok(profile)
    }

    /// Changes the role of a profile in the caller's company.
    pub async fn change_role(
        &self,
        caller: &Caller,
        user_id: UserId,
        role: Role,
    ) -> AppResult<Profile> {
        let (actor, mut profile) = self.load_managed(caller, user_id).await?;

        if actor.user_id() == user_id && role != actor.role() {
            return Err(AppError::Conflict(
                "you cannot change your own role".to_owned(),
            ));
        }

        let previous = profile.role();
        profile.change_role(role);
        self.profile_repository.update_profile(&profile).await?;

        info!(user_id = %user_id, from = previous.as_str(), to = role.as_str(), "profile role changed");
        self.record(
            actor,
            profile.company_id(),
            AuditAction::ProfileRoleChanged,
            "profile",
            user_id.to_string(),
            Some(format!("{} -> {}", previous.as_str(), role.as_str())),
        )
        .await;

        Ok(profile)
    }

    /// Adds explicit permission grants to a profile. Grants are additive only.
    pub async fn grant_permissions(
        &self,
        caller: &Caller,
        user_id: UserId,
        permissions: &[String],
    ) -> AppResult<Profile> {
        let requested = permissions
            .iter()
            .map(|permission| Permission::parse(permission))
            .collect::<AppResult<Vec<_>>>()?;
        let (actor, mut profile) = self.load_managed(caller, user_id).await?;

        let added = profile.grant(requested);
        if added.is_empty() {
            return Ok(profile);
        }
        self.profile_repository.update_profile(&profile).await?;

        let detail = added
            .iter()
            .map(Permission::as_str)
            .collect::<Vec<_>>()
            .join(",");
        info!(user_id = %user_id, permissions = %detail, "permissions granted");
        self.record(
            actor,
            profile.company_id(),
            AuditAction::ProfilePermissionsGranted,
            "profile",
            user_id.to_string(),
            Some(detail),
        )
        .await;

        Ok(profile)
    }

    /// Activates or deactivates a profile. Deactivated profiles are treated as signed out.
    pub async fn set_active(
        &self,
        caller: &Caller,
        user_id: UserId,
        is_active: bool,
    ) -> AppResult<Profile> {
        let (actor, mut profile) = self.load_managed(caller, user_id).await?;

        if actor.user_id() == user_id && !is_active {
            return Err(AppError::Conflict(
                "you cannot deactivate your own profile".to_owned(),
            ));
        }

        if profile.is_active() == is_active {
            return Ok(profile);
        }

        profile.set_active(is_active);
        self.profile_repository.update_profile(&profile).await?;

        info!(user_id = %user_id, is_active, "profile activation changed");
        self.record(
            actor,
            profile.company_id(),
            AuditAction::ProfileActivationChanged,
            "profile",
            user_id.to_string(),
            Some(is_active.to_string()),
        )
        .await;

        Ok(profile)
    }

    async fn load_managed<'a>(
        &self,
        caller: &'a Caller,
        user_id: UserId,
    ) -> AppResult<(&'a Profile, Profile)> {
        let target = self.profile_repository.find_profile(user_id).await?;
        let company_id = target
            .as_ref()
            .or(caller.profile())
            .map(Profile::company_id)
            .unwrap_or_default();
        let actor = self.guard.require_within_company(
            caller,
            Permission::new(Resource::Profiles, Action::Manage),
            company_id,
        )?;

        let target = target.ok_or_else(|| {
            AppError::NotFound(format!("profile '{user_id}' does not exist"))
        })?;
        target.ensure_company(actor.company_id())?;

        Ok((actor, target))
    }

    async fn record(
        &self,
        actor: &Profile,
        company_id: CompanyId,
        action: AuditAction,
        resource_type: &str,
        resource_id: String,
        detail: Option<String>,
    ) {
        let event = AuditEvent {
            company_id,
            actor: actor.user_id(),
            action,
            resource_type: resource_type.to_owned(),
            resource_id,
            detail,
        };

        if let Err(error) = self.audit_repository.append_event(event).await {
            warn!(action = action.as_str(), error = %error, "failed to append audit event");
        }
    }
}
