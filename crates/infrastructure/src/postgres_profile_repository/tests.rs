use fleetgate_application::ProfileRepository;
use fleetgate_core::{AppError, UserId};
use fleetgate_domain::{Permission, Role};

use super::PostgresProfileRepository;
use crate::postgres_test_support::{seed_company, test_pool};

#[tokio::test]
async fn grants_and_role_changes_are_persisted() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let (company_id, member) = seed_company(&pool, Role::User).await;
    let repository = PostgresProfileRepository::new(pool);

    let mut updated = member.clone();
    updated.change_role(Role::Dispatcher);
    let permission = Permission::parse("documents:delete").unwrap_or_else(|_| unreachable!());
    let added = updated.grant([permission]);
    assert_eq!(added.len(), 1);
    assert!(repository.update_profile(&updated).await.is_ok());

    let found = repository.find_profile(member.user_id()).await;
    assert!(found.is_ok());
    let found = found.unwrap_or_else(|_| unreachable!());
    assert_eq!(found.as_ref(), Some(&updated));

    updated.set_active(false);
    assert!(repository.update_profile(&updated).await.is_ok());

    let listed = repository.list_profiles(company_id).await;
    assert!(matches!(
        listed,
        Ok(ref profiles)
            if profiles.len() == 2
                && profiles.iter().any(|profile| profile == &updated)
    ));
}

#[tokio::test]
async fn second_profile_for_a_user_conflicts() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let (_, member) = seed_company(&pool, Role::Manager).await;
    let repository = PostgresProfileRepository::new(pool);

    let duplicate = repository.insert_profile(member).await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));

    let missing = repository.find_profile(UserId::new()).await;
    assert!(matches!(missing, Ok(None)));
}
