// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Token pair and auth API payloads.

use serde::{Deserialize, Serialize};

use super::SessionUser;

/// Access + refresh token pair as issued by the auth API.
///
/// Never mutated after creation; a refresh produces a new pair.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    /// Short-lived bearer token carrying the claims
    pub access_token: String,
    /// Long-lived token used only to obtain a new pair (never decoded)
    pub refresh_token: String,
    /// Access token lifetime in seconds, as reported by the API
    pub expires_in: u64,
    /// Token type, usually "Bearer"
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

// Tokens stay out of logs.
impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("expires_in", &self.expires_in)
            .field("token_type", &self.token_type)
            .finish()
    }
}

/// Response body of login, register and refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub tokens: TokenPair,
    /// Profile as reported by the API; claims remain authoritative
    #[serde(default)]
    pub user: Option<SessionUser>,
}

/// Login credentials.
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Account registration details.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterDetails {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub phone_number: String,
}

impl std::fmt::Debug for RegisterDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterDetails")
            .field("full_name", &self.full_name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("phone_number", &self.phone_number)
            .finish()
    }
}

/// Body of the refresh call.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
}
