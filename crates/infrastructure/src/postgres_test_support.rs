use fleetgate_application::ProfileRepository;
use fleetgate_core::{CompanyId, UserId};
use fleetgate_domain::{Company, Profile, Role};
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;

use crate::PostgresProfileRepository;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Connects to `DATABASE_URL` and applies migrations. Returns `None` when the variable is unset.
pub(crate) async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(4)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for postgres tests: {error}");
    }

    Some(pool)
}

/// Creates a company with an owner profile and, unless `role` is admin, a member with `role`.
pub(crate) async fn seed_company(pool: &PgPool, role: Role) -> (CompanyId, Profile) {
    let repository = PostgresProfileRepository::new(pool.clone());
    let company_id = CompanyId::new();
    let company = Company::new(company_id, "Postgres Fleet").unwrap_or_else(|_| unreachable!());
    let owner = Profile::company_owner(UserId::new(), company_id, "Owner")
        .unwrap_or_else(|_| unreachable!());
    assert!(
        repository
            .create_company_with_owner(company, owner.clone())
            .await
            .is_ok()
    );

    if role == Role::Admin {
        return (company_id, owner);
    }

    let member = Profile::new(UserId::new(), company_id, "Member", role)
        .unwrap_or_else(|_| unreachable!());
    assert!(repository.insert_profile(member.clone()).await.is_ok());
    (company_id, member)
}
