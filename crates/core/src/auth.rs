use serde::{Deserialize, Serialize};

use crate::UserId;

/// Caller identity persisted in the authenticated session.
///
/// The session only carries who the caller is. Role, company and permissions are always
/// reloaded from the profile store so that deactivation takes effect on the next request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    user_id: UserId,
    display_name: String,
}

impl SessionUser {
    /// Creates a session identity for an authenticated user.
    #[must_use]
    pub fn new(user_id: UserId, display_name: impl Into<String>) -> Self {
        Self {
            user_id,
            display_name: display_name.into(),
        }
    }

    /// Returns the authenticated user id.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the display name captured at sign-in.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }
}
