use async_trait::async_trait;
use fleetgate_core::{AppResult, CompanyId, UserId};
use fleetgate_domain::{Company, Profile};

/// Repository port for companies and the profiles that belong to them.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Loads the profile of a user. `None` means the user has no usable identity.
    async fn find_profile(&self, user_id: UserId) -> AppResult<Option<Profile>>;

    /// Lists profiles of one company ordered by display name.
    async fn list_profiles(&self, company_id: CompanyId) -> AppResult<Vec<Profile>>;

    /// Loads a company.
    async fn find_company(&self, company_id: CompanyId) -> AppResult<Option<Company>>;

    /// Creates a company together with its first profile in one transaction.
    ///
    /// Fails with a conflict when the user already has a profile.
    async fn create_company_with_owner(&self, company: Company, owner: Profile) -> AppResult<()>;

    /// Inserts a profile into an existing company.
    ///
    /// Fails with a conflict when the user already has a profile.
    async fn insert_profile(&self, profile: Profile) -> AppResult<()>;

    /// Persists role, activation and explicit grants of an existing profile.
    async fn update_profile(&self, profile: &Profile) -> AppResult<()>;
}
