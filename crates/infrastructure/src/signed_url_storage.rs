use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use fleetgate_application::{StorageCapability, UploadTarget};
use fleetgate_core::{AppError, AppResult};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use url::Url;

const MIN_SECRET_LENGTH: usize = 32;
const MAX_UPLOAD_TTL_DAYS: i64 = 7;

/// Storage capability issuing HMAC-signed, expiring upload URLs for an object store gateway.
///
/// The gateway recomputes the signature over path, content type and expiry with the shared
/// secret.
#[derive(Clone)]
pub struct SignedUrlStorage {
    base_url: Url,
    signing_secret: String,
    upload_ttl: Duration,
}

impl SignedUrlStorage {
    /// Creates a signer for the given gateway base URL.
    pub fn new(base_url: &str, signing_secret: &str, upload_ttl: Duration) -> AppResult<Self> {
        let mut base_url = Url::parse(base_url).map_err(|error| {
            AppError::Validation(format!("invalid storage base url '{base_url}': {error}"))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::Validation(format!(
                "storage base url '{base_url}' cannot carry object paths"
            )));
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(path.as_str());
        }

        if signing_secret.len() < MIN_SECRET_LENGTH {
            return Err(AppError::Validation(format!(
                "storage signing secret must be at least {MIN_SECRET_LENGTH} characters"
            )));
        }

        if upload_ttl <= Duration::zero() {
            return Err(AppError::Validation(
                "storage upload ttl must be positive".to_owned(),
            ));
        }
        if upload_ttl > Duration::days(MAX_UPLOAD_TTL_DAYS) {
            return Err(AppError::Validation(format!(
                "storage upload ttl must not exceed {MAX_UPLOAD_TTL_DAYS} days"
            )));
        }

        Ok(Self {
            base_url,
            signing_secret: signing_secret.to_owned(),
            upload_ttl,
        })
    }

    /// Checks a signature the way the gateway does.
    #[cfg(test)]
    fn verify(
        &self,
        path: &str,
        content_type: &str,
        expires: i64,
        signature: &str,
        now: DateTime<Utc>,
    ) -> bool {
        if now.timestamp() > expires {
            return false;
        }

        let Ok(signature) = hex::decode(signature) else {
            return false;
        };

        self.mac(path, content_type, expires)
            .is_ok_and(|mac| mac.verify_slice(signature.as_slice()).is_ok())
    }

    fn mac(&self, path: &str, content_type: &str, expires: i64) -> AppResult<Hmac<Sha256>> {
        let mut mac = Hmac::<Sha256>::new_from_slice(self.signing_secret.as_bytes())
            .map_err(|error| AppError::Internal(format!("invalid storage signing key: {error}")))?;
        mac.update(path.as_bytes());
        mac.update(b"\n");
        mac.update(content_type.as_bytes());
        mac.update(b"\n");
        mac.update(expires.to_string().as_bytes());

        Ok(mac)
    }
}

#[async_trait]
impl StorageCapability for SignedUrlStorage {
    async fn issue_upload_target(&self, path: &str, content_type: &str) -> AppResult<UploadTarget> {
        if content_type.is_empty() || content_type.contains(['\n', '\r']) {
            return Err(AppError::Validation(
                "content type must be a single non-empty line".to_owned(),
            ));
        }

        let expires_at = Utc::now()
            .checked_add_signed(self.upload_ttl)
            .ok_or_else(|| AppError::Internal("upload expiry is out of range".to_owned()))?;
        let expires = expires_at.timestamp();
        let signature = hex::encode(
            self.mac(path, content_type, expires)?
                .finalize()
                .into_bytes(),
        );

        let mut url = self.base_url.join(path).map_err(|error| {
            AppError::Internal(format!("failed to build upload url for '{path}': {error}"))
        })?;
        url.query_pairs_mut()
            .append_pair("content_type", content_type)
            .append_pair("expires", expires.to_string().as_str())
            .append_pair("signature", signature.as_str());

        Ok(UploadTarget {
            url: url.into(),
            expires_at,
        })
    }
}
