use fleetgate_core::{AppError, CompanyId, UserId};
use fleetgate_domain::{Action, Permission, PermissionCatalog, Profile, Resource, Role};
use proptest::prelude::*;

use super::{AuthorizationDecision, AuthorizationGuard, Caller, DenialReason};

fn guard() -> AuthorizationGuard {
    AuthorizationGuard::new(PermissionCatalog::standard()).unwrap_or_else(|_| unreachable!())
}

fn profile(company_id: CompanyId, role: Role) -> Profile {
    Profile::new(UserId::new(), company_id, "Test User", role).unwrap_or_else(|_| unreachable!())
}

#[test]
fn dispatcher_without_vehicle_delete_is_denied() {
    let company_id = CompanyId::new();
    let dispatcher = profile(company_id, Role::Dispatcher);

    let decision = guard().authorize(
        Some(&dispatcher),
        &Permission::new(Resource::Vehicles, Action::Delete),
        Some(company_id),
    );

    assert_eq!(
        decision,
        AuthorizationDecision::Denied(DenialReason::InsufficientPermission)
    );
}

#[test]
fn absent_caller_is_unauthenticated() {
    let decision = guard().authorize(
        None,
        &Permission::new(Resource::Vehicles, Action::Read),
        None,
    );

    assert_eq!(
        decision,
        AuthorizationDecision::Denied(DenialReason::Unauthenticated)
    );
}

#[test]
fn inactive_caller_is_unauthenticated_even_as_admin() {
    let company_id = CompanyId::new();
    let mut admin = profile(company_id, Role::Admin);
    admin.set_active(false);

    let decision = guard().authorize(
        Some(&admin),
        &Permission::new(Resource::Vehicles, Action::Read),
        Some(company_id),
    );

    assert_eq!(
        decision,
        AuthorizationDecision::Denied(DenialReason::Unauthenticated)
    );
}

#[test]
fn permission_is_checked_before_tenant() {
    let user = profile(CompanyId::new(), Role::User);

    let decision = guard().authorize(
        Some(&user),
        &Permission::new(Resource::Assignments, Action::Create),
        Some(CompanyId::new()),
    );

    assert_eq!(
        decision,
        AuthorizationDecision::Denied(DenialReason::InsufficientPermission)
    );
}

#[test]
fn manager_cannot_reach_another_company() {
    let manager = profile(CompanyId::new(), Role::Manager);

    let decision = guard().authorize(
        Some(&manager),
        &Permission::new(Resource::Vehicles, Action::Read),
        Some(CompanyId::new()),
    );

    assert_eq!(
        decision,
        AuthorizationDecision::Denied(DenialReason::CrossTenantAccess)
    );
}

#[test]
fn admin_crosses_company_boundaries() {
    let admin = profile(CompanyId::new(), Role::Admin);

    let decision = guard().authorize(
        Some(&admin),
        &Permission::new(Resource::Assignments, Action::Create),
        Some(CompanyId::new()),
    );

    assert_eq!(decision, AuthorizationDecision::Allowed);
}

#[test]
fn admin_stays_inside_company_for_profile_management() {
    let admin = profile(CompanyId::new(), Role::Admin);
    let manage = Permission::new(Resource::Profiles, Action::Manage);

    let foreign = guard().authorize_within_company(Some(&admin), &manage, CompanyId::new());
    let own = guard().authorize_within_company(Some(&admin), &manage, admin.company_id());

    assert_eq!(
        foreign,
        AuthorizationDecision::Denied(DenialReason::CrossTenantAccess)
    );
    assert_eq!(own, AuthorizationDecision::Allowed);
}

#[test]
fn explicit_grant_unlocks_action() {
    let company_id = CompanyId::new();
    let mut dispatcher = profile(company_id, Role::Dispatcher);
    let delete = Permission::new(Resource::Vehicles, Action::Delete);
    dispatcher.grant([delete.clone()]);

    let decision = guard().authorize(Some(&dispatcher), &delete, Some(company_id));

    assert!(decision.is_allowed());
}

#[test]
fn missing_resource_company_only_checks_permission() {
    let user = profile(CompanyId::new(), Role::User);

    let decision = guard().authorize(
        Some(&user),
        &Permission::new(Resource::Drivers, Action::Read),
        None,
    );

    assert_eq!(decision, AuthorizationDecision::Allowed);
}

#[test]
fn require_returns_the_authorized_profile() {
    let company_id = CompanyId::new();
    let caller = Caller::from_profile(Some(profile(company_id, Role::Manager)));

    let authorized = guard().require(
        &caller,
        Permission::new(Resource::Drivers, Action::Create),
        Some(company_id),
    );

    assert!(authorized.is_ok());
    assert_eq!(
        authorized.map(Profile::company_id).ok(),
        Some(company_id)
    );
}

#[test]
fn denials_map_to_generic_error_categories() {
    let caller = Caller::anonymous();
    let unauthenticated = guard()
        .require(
            &caller,
            Permission::new(Resource::Vehicles, Action::Read),
            None,
        )
        .map_err(AppError::from);
    assert!(matches!(unauthenticated, Err(AppError::Unauthorized(_))));

    let user = Caller::from_profile(Some(profile(CompanyId::new(), Role::User)));
    let cross_tenant = guard().require(
        &user,
        Permission::new(Resource::Vehicles, Action::Read),
        Some(CompanyId::new()),
    );
    assert!(matches!(
        cross_tenant.as_ref().map_err(|denial| denial.reason),
        Err(DenialReason::CrossTenantAccess)
    ));
    assert!(matches!(
        cross_tenant.map_err(AppError::from),
        Err(AppError::Forbidden(_))
    ));
}

#[test]
fn incomplete_catalog_is_refused_at_construction() {
    let catalog = PermissionCatalog::from_table(std::collections::BTreeMap::new());
    assert!(AuthorizationGuard::new(catalog).is_err());
}

fn non_admin_role() -> impl Strategy<Value = Role> {
    prop::sample::select(vec![Role::Manager, Role::Dispatcher, Role::User])
}

proptest! {
    #[test]
    fn non_admin_is_always_denied_across_companies(
        role in non_admin_role(),
        token in "[a-z]{1,10}:[a-z]{1,10}",
    ) {
        let action = Permission::parse(token.as_str()).unwrap_or_else(|_| unreachable!());
        let mut caller = profile(CompanyId::new(), role);
        caller.grant([action.clone()]);

        let decision = guard().authorize(Some(&caller), &action, Some(CompanyId::new()));

        prop_assert_eq!(
            decision,
            AuthorizationDecision::Denied(DenialReason::CrossTenantAccess)
        );
    }
}
