//! Signed-in user profile.

use serde::{Deserialize, Serialize};

use crate::auth::Claims;

/// Externally visible identity of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    /// Subject ID from the access token
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    /// Role name (may be the configured "unassigned" role)
    pub role: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    /// Account active flag; true unless the API says otherwise
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl SessionUser {
    /// Derive the user view from decoded claims.
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            id: claims.sub.clone(),
            email: claims.email.clone(),
            full_name: claims.full_name.clone(),
            role: claims.role.clone(),
            phone_number: claims.phone_number.clone(),
            is_active: true,
        }
    }

    /// Name to show in the UI, falling back to the email.
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.email)
    }
}
