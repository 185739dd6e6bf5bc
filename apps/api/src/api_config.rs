use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use chrono::Duration;
use fleetgate_core::AppError;
use tracing_subscriber::EnvFilter;
use url::Url;

const DEFAULT_UPLOAD_TTL_SECONDS: i64 = 900;

/// Runtime configuration read from the environment.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub database_url: String,
    pub frontend_url: String,
    pub bootstrap_token: String,
    pub api_host: String,
    pub api_port: u16,
    pub cookie_secure: bool,
    pub storage_base_url: String,
    pub storage_signing_secret: String,
    pub storage_upload_ttl: Duration,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");

        let database_url = required_env("DATABASE_URL")?;
        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());
        let frontend_url = normalize_origin(frontend_url.as_str())?;
        let bootstrap_token = required_non_empty_env("AUTH_BOOTSTRAP_TOKEN")?;

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let api_port = env::var("API_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3001);

        let cookie_secure = env::var("SESSION_COOKIE_SECURE")
            .unwrap_or_else(|_| "false".to_owned())
            .eq_ignore_ascii_case("true");

        let storage_base_url = required_non_empty_env("STORAGE_BASE_URL")?;
        let storage_signing_secret = required_non_empty_env("STORAGE_SIGNING_SECRET")?;
        let storage_upload_ttl = match env::var("STORAGE_UPLOAD_TTL_SECONDS") {
            Ok(value) => parse_upload_ttl(value.as_str())?,
            Err(_) => Duration::seconds(DEFAULT_UPLOAD_TTL_SECONDS),
        };

        Ok(Self {
            migrate_only,
            database_url,
            frontend_url,
            bootstrap_token,
            api_host,
            api_port,
            cookie_secure,
            storage_base_url,
            storage_signing_secret,
            storage_upload_ttl,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

/// Reduces a frontend URL to the origin browsers send in the `Origin` header.
fn normalize_origin(value: &str) -> Result<String, AppError> {
    let url = Url::parse(value)
        .map_err(|error| AppError::Validation(format!("invalid FRONTEND_URL: {error}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(AppError::Validation(format!(
            "FRONTEND_URL must use http or https, got '{}'",
            url.scheme()
        )));
    }

    Ok(url.origin().ascii_serialization())
}

fn parse_upload_ttl(value: &str) -> Result<Duration, AppError> {
    let seconds = value.trim().parse::<i64>().map_err(|error| {
        AppError::Validation(format!("invalid STORAGE_UPLOAD_TTL_SECONDS: {error}"))
    })?;

    Duration::try_seconds(seconds).ok_or_else(|| {
        AppError::Validation(format!("STORAGE_UPLOAD_TTL_SECONDS is out of range: {seconds}"))
    })
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn required_non_empty_env(name: &str) -> Result<String, AppError> {
    let value = required_env(name)?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::{normalize_origin, parse_upload_ttl};

    #[test]
    fn frontend_url_is_reduced_to_its_origin() {
        assert_eq!(
            normalize_origin("https://fleet.example.test/app/").ok().as_deref(),
            Some("https://fleet.example.test")
        );
        assert_eq!(
            normalize_origin("http://localhost:3000").ok().as_deref(),
            Some("http://localhost:3000")
        );
    }

    #[test]
    fn upload_ttl_out_of_range_is_rejected() {
        assert_eq!(parse_upload_ttl("900").ok(), Some(Duration::seconds(900)));
        assert!(parse_upload_ttl("9223372036854775807").is_err());
        assert!(parse_upload_ttl("soon").is_err());
    }

    #[test]
    fn non_http_frontend_url_is_rejected() {
        assert!(normalize_origin("ftp://fleet.example.test").is_err());
        assert!(normalize_origin("not a url").is_err());
    }
}
