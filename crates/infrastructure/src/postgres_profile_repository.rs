use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;

use async_trait::async_trait;
use fleetgate_application::ProfileRepository;
use fleetgate_core::{AppError, AppResult, CompanyId, UserId};
use fleetgate_domain::{Company, Permission, Profile, Role};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

/// PostgreSQL-backed company and profile repository.
#[derive(Clone)]
pub struct PostgresProfileRepository {
    pool: PgPool,
}

impl PostgresProfileRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ProfileRow {
    user_id: Uuid,
    company_id: Uuid,
    display_name: String,
    role: String,
    is_active: bool,
}

#[derive(Debug, FromRow)]
struct PermissionRow {
    user_id: Uuid,
    permission: String,
}

#[derive(Debug, FromRow)]
struct CompanyRow {
    id: Uuid,
    name: String,
}

#[async_trait]
impl ProfileRepository for PostgresProfileRepository {
    async fn find_profile(&self, user_id: UserId) -> AppResult<Option<Profile>> {
        let Some(row) = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT user_id, company_id, display_name, role, is_active
            FROM profiles
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load profile: {error}")))?
        else {
            return Ok(None);
        };

        let grants = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT user_id, permission
            FROM profile_permissions
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to load profile permissions: {error}"))
        })?;

        let mut grants = group_grants(grants)?;
        profile_from_row(row, &mut grants).map(Some)
    }

    async fn list_profiles(&self, company_id: CompanyId) -> AppResult<Vec<Profile>> {
        let rows = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT user_id, company_id, display_name, role, is_active
            FROM profiles
            WHERE company_id = $1
            ORDER BY display_name, user_id
            "#,
        )
        .bind(company_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list profiles: {error}")))?;

        let grants = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT grants.user_id, grants.permission
            FROM profile_permissions AS grants
            INNER JOIN profiles
                ON profiles.user_id = grants.user_id
            WHERE profiles.company_id = $1
            "#,
        )
        .bind(company_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list profile permissions: {error}"))
        })?;

        let mut grants = group_grants(grants)?;
        rows.into_iter()
            .map(|row| profile_from_row(row, &mut grants))
            .collect()
    }

    async fn find_company(&self, company_id: CompanyId) -> AppResult<Option<Company>> {
        let row = sqlx::query_as::<_, CompanyRow>("SELECT id, name FROM companies WHERE id = $1")
            .bind(company_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to load company: {error}")))?;

        row.map(|row| Company::new(CompanyId::from_uuid(row.id), row.name))
            .transpose()
    }

    async fn create_company_with_owner(&self, company: Company, owner: Profile) -> AppResult<()> {
        let mut transaction =
            self.pool.begin().await.map_err(|error| {
                AppError::Internal(format!("failed to begin transaction: {error}"))
            })?;

        sqlx::query("INSERT INTO companies (id, name) VALUES ($1, $2)")
            .bind(company.id().as_uuid())
            .bind(company.name().as_str())
            .execute(&mut *transaction)
            .await
            .map_err(|error| AppError::Internal(format!("failed to create company: {error}")))?;

        insert_profile_row(&mut transaction, &owner).await?;
        replace_grants(&mut transaction, &owner).await?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(())
    }

    async fn insert_profile(&self, profile: Profile) -> AppResult<()> {
        let mut transaction =
            self.pool.begin().await.map_err(|error| {
                AppError::Internal(format!("failed to begin transaction: {error}"))
            })?;

        insert_profile_row(&mut transaction, &profile).await?;
        replace_grants(&mut transaction, &profile).await?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(())
    }

    async fn update_profile(&self, profile: &Profile) -> AppResult<()> {
        let mut transaction =
            self.pool.begin().await.map_err(|error| {
                AppError::Internal(format!("failed to begin transaction: {error}"))
            })?;

        let result = sqlx::query(
            r#"
            UPDATE profiles
            SET display_name = $2,
                role = $3,
                is_active = $4
            WHERE user_id = $1
            "#,
        )
        .bind(profile.user_id().as_uuid())
        .bind(profile.display_name().as_str())
        .bind(profile.role().as_str())
        .bind(profile.is_active())
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to update profile: {error}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "profile '{}' does not exist",
                profile.user_id()
            )));
        }

        replace_grants(&mut transaction, profile).await?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(())
    }
}

async fn insert_profile_row(
    transaction: &mut Transaction<'_, Postgres>,
    profile: &Profile,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO profiles (user_id, company_id, display_name, role, is_active)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(profile.user_id().as_uuid())
    .bind(profile.company_id().as_uuid())
    .bind(profile.display_name().as_str())
    .bind(profile.role().as_str())
    .bind(profile.is_active())
    .execute(&mut **transaction)
    .await
    .map_err(|error| map_profile_conflict(error, profile.user_id()))?;

    Ok(())
}

async fn replace_grants(
    transaction: &mut Transaction<'_, Postgres>,
    profile: &Profile,
) -> AppResult<()> {
    let permissions: Vec<String> = profile
        .explicit_permissions()
        .iter()
        .map(|permission| permission.as_str().to_owned())
        .collect();

    sqlx::query(
        r#"
        DELETE FROM profile_permissions
        WHERE user_id = $1
            AND NOT (permission = ANY($2))
        "#,
    )
    .bind(profile.user_id().as_uuid())
    .bind(&permissions)
    .execute(&mut **transaction)
    .await
    .map_err(|error| AppError::Internal(format!("failed to prune permissions: {error}")))?;

    sqlx::query(
        r#"
        INSERT INTO profile_permissions (user_id, permission)
        SELECT $1, permission
        FROM UNNEST($2::text[]) AS permission
        ON CONFLICT (user_id, permission) DO NOTHING
        "#,
    )
    .bind(profile.user_id().as_uuid())
    .bind(&permissions)
    .execute(&mut **transaction)
    .await
    .map_err(|error| AppError::Internal(format!("failed to store permissions: {error}")))?;

    Ok(())
}

fn group_grants(rows: Vec<PermissionRow>) -> AppResult<HashMap<Uuid, BTreeSet<Permission>>> {
    let mut grants: HashMap<Uuid, BTreeSet<Permission>> = HashMap::new();
    for row in rows {
        let permission = Permission::from_str(row.permission.as_str()).map_err(|error| {
            AppError::Internal(format!(
                "failed to decode permission '{}' for user '{}': {error}",
                row.permission, row.user_id
            ))
        })?;
        grants.entry(row.user_id).or_default().insert(permission);
    }

    Ok(grants)
}

fn profile_from_row(
    row: ProfileRow,
    grants: &mut HashMap<Uuid, BTreeSet<Permission>>,
) -> AppResult<Profile> {
    let role = Role::from_str(row.role.as_str()).map_err(|error| {
        AppError::Internal(format!(
            "failed to decode role for user '{}': {error}",
            row.user_id
        ))
    })?;

    Profile::restore(
        UserId::from_uuid(row.user_id),
        CompanyId::from_uuid(row.company_id),
        row.display_name,
        role,
        grants.remove(&row.user_id).unwrap_or_default(),
        row.is_active,
    )
}

fn map_profile_conflict(error: sqlx::Error, user_id: UserId) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23505")
    {
        return AppError::Conflict(format!("user '{user_id}' already has a profile"));
    }

    AppError::Internal(format!("failed to insert profile: {error}"))
}

#[cfg(test)]
mod tests;
