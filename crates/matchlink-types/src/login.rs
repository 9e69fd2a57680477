//! Account login types.

use serde::{Deserialize, Serialize};

/// Credentials handed to the provider's login operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginCredentials {
    /// Account id (provider-specific meaning; may be empty for portal flows).
    pub id: String,
    /// Auth token (ditto).
    pub token: String,
    /// The provider's login-flow selector, e.g. `"developer"`.
    pub auth_type: String,
}

impl LoginCredentials {
    /// Creates explicit credentials.
    pub fn new(
        id: impl Into<String>,
        token: impl Into<String>,
        auth_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            token: token.into(),
            auth_type: auth_type.into(),
        }
    }

    /// The interactive account-portal flow: no inline id or token, the
    /// provider drives its own prompt.
    pub fn portal() -> Self {
        Self::new("", "", "accountportal")
    }
}

/// Who the local user is logged in as.
///
/// Set only by a successful login completion; the default is the
/// unauthenticated `"Unknown"` identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginIdentity {
    /// The provider-reported display name.
    pub display_name: String,
    /// Whether the local user is currently authenticated.
    pub authenticated: bool,
}

impl LoginIdentity {
    /// An authenticated identity with the given display name.
    pub fn logged_in(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            authenticated: true,
        }
    }
}

impl Default for LoginIdentity {
    fn default() -> Self {
        Self {
            display_name: "Unknown".to_string(),
            authenticated: false,
        }
    }
}
