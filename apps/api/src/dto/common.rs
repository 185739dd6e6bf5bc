use chrono::{DateTime, Utc};
use fleetgate_core::{AppError, AppResult, CompanyId};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Health response payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/health-response.ts"
)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Optional company scope for list endpoints. Defaults to the caller's company.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompanyScopeQuery {
    pub company_id: Option<String>,
}

impl CompanyScopeQuery {
    pub fn company_id(&self) -> AppResult<Option<CompanyId>> {
        parse_optional(self.company_id.as_deref(), CompanyId::parse)
    }
}

/// Parses an optional transport value, treating blank strings as absent.
pub(crate) fn parse_optional<T>(
    value: Option<&str>,
    parse: impl FnOnce(&str) -> AppResult<T>,
) -> AppResult<Option<T>> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(parse)
        .transpose()
}

/// Parses an RFC 3339 timestamp.
pub(crate) fn parse_timestamp(value: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|error| AppError::Validation(format!("invalid timestamp '{value}': {error}")))
}

pub(crate) fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339()
}
