use chrono::{DateTime, Duration, Utc};
use fleetgate_core::{AppError, AppResult, CompanyId, NonEmptyString, uuid_identifier};
use serde::{Deserialize, Serialize};

use crate::DriverId;

uuid_identifier!(
    /// Unique identifier of a driver document.
    DocumentId
);

/// Days before expiry during which a document is reported as expiring soon.
pub const EXPIRING_SOON_WINDOW_DAYS: i64 = 30;

/// Validity of a document, always derived from its expiry date and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    /// Not expiring within the window.
    Valid,
    /// Expires within the window.
    ExpiringSoon,
    /// Already expired.
    Expired,
}

impl DocumentStatus {
    /// Returns a stable transport value for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::ExpiringSoon => "expiring_soon",
            Self::Expired => "expired",
        }
    }
}

/// Derives the validity status of a document at `now`.
///
/// Documents without an expiry date never expire.
#[must_use]
pub fn derive_status(expiry_date: Option<DateTime<Utc>>, now: DateTime<Utc>) -> DocumentStatus {
    let Some(expiry_date) = expiry_date else {
        return DocumentStatus::Valid;
    };

    if expiry_date < now {
        DocumentStatus::Expired
    } else if expiry_date < now + Duration::days(EXPIRING_SOON_WINDOW_DAYS) {
        DocumentStatus::ExpiringSoon
    } else {
        DocumentStatus::Valid
    }
}

/// Document attached to a driver. Ownership follows the driver's company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    id: DocumentId,
    driver_id: DriverId,
    company_id: CompanyId,
    file_path: NonEmptyString,
    document_type: NonEmptyString,
    expiry_date: Option<DateTime<Utc>>,
}

impl Document {
    /// Creates a validated document record.
    pub fn new(
        id: DocumentId,
        driver_id: DriverId,
        company_id: CompanyId,
        file_path: impl Into<String>,
        document_type: impl Into<String>,
        expiry_date: Option<DateTime<Utc>>,
    ) -> AppResult<Self> {
        let document_type: String = document_type.into();
        let document_type = document_type.trim().to_lowercase();
        if document_type.len() > 64 {
            return Err(AppError::Validation(
                "document type must not exceed 64 characters".to_owned(),
            ));
        }

        Ok(Self {
            id,
            driver_id,
            company_id,
            file_path: NonEmptyString::new(file_path)?,
            document_type: NonEmptyString::new(document_type)?,
            expiry_date,
        })
    }

    /// Returns the document id.
    #[must_use]
    pub fn id(&self) -> DocumentId {
        self.id
    }

    /// Returns the owning driver.
    #[must_use]
    pub fn driver_id(&self) -> DriverId {
        self.driver_id
    }

    /// Returns the owning company.
    #[must_use]
    pub fn company_id(&self) -> CompanyId {
        self.company_id
    }

    /// Returns the storage path of the file.
    #[must_use]
    pub fn file_path(&self) -> &NonEmptyString {
        &self.file_path
    }

    /// Returns the document type, e.g. `license` or `insurance`.
    #[must_use]
    pub fn document_type(&self) -> &NonEmptyString {
        &self.document_type
    }

    /// Returns the expiry date.
    #[must_use]
    pub fn expiry_date(&self) -> Option<DateTime<Utc>> {
        self.expiry_date
    }

    /// Returns the derived validity status at `now`.
    #[must_use]
    pub fn status_at(&self, now: DateTime<Utc>) -> DocumentStatus {
        derive_status(self.expiry_date, now)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use fleetgate_core::CompanyId;

    use super::{Document, DocumentId, DocumentStatus, derive_status};
    use crate::DriverId;

    #[test]
    fn status_boundaries() {
        let now = Utc::now();

        assert_eq!(
            derive_status(Some(now - Duration::seconds(1)), now),
            DocumentStatus::Expired
        );
        assert_eq!(
            derive_status(Some(now + Duration::days(29)), now),
            DocumentStatus::ExpiringSoon
        );
        assert_eq!(
            derive_status(Some(now + Duration::days(31)), now),
            DocumentStatus::Valid
        );
    }

    #[test]
    fn exact_instants_fall_on_the_later_side() {
        let now = Utc::now();

        assert_eq!(derive_status(Some(now), now), DocumentStatus::ExpiringSoon);
        assert_eq!(
            derive_status(Some(now + Duration::days(30)), now),
            DocumentStatus::Valid
        );
    }

    #[test]
    fn missing_expiry_is_valid() {
        assert_eq!(derive_status(None, Utc::now()), DocumentStatus::Valid);
    }

    #[test]
    fn document_type_is_normalized() {
        let document = Document::new(
            DocumentId::new(),
            DriverId::new(),
            CompanyId::new(),
            "c/d/license.pdf",
            "  License ",
            None,
        );
        assert!(document.is_ok());
        assert_eq!(
            document
                .unwrap_or_else(|_| unreachable!())
                .document_type()
                .as_str(),
            "license"
        );
    }

    #[test]
    fn blank_document_type_is_rejected() {
        let document = Document::new(
            DocumentId::new(),
            DriverId::new(),
            CompanyId::new(),
            "c/d/file.pdf",
            "   ",
            None,
        );
        assert!(document.is_err());
    }
}
