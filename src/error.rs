// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Error types for the session lifecycle.
//!
//! Each concern gets its own enum so callers can tell a malformed token
//! apart from a failed auth call or a storage hiccup:
//! - `DecodeError`: the access token could not be turned into claims
//! - `AuthCallError`: login/register/refresh against the auth API failed
//! - `PersistenceError`: the token slot could not be read or written
//!
//! Only `SessionError` ever reaches consumers (from `login`/`register`).

use reqwest::StatusCode;

/// Access token could not be decoded into claims.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Malformed token: {0}")]
    Malformed(String),

    #[error("Invalid claims: {0}")]
    Claims(String),
}

/// Failure of a call to the auth API.
#[derive(Debug, thiserror::Error)]
pub enum AuthCallError {
    #[error("Auth request failed: {0}")]
    Transport(String),

    #[error("Auth API returned HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("Invalid auth response: {0}")]
    InvalidResponse(String),
}

impl AuthCallError {
    /// True when the API rejected the credentials or refresh token.
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            AuthCallError::Status { status, .. }
                if *status == StatusCode::UNAUTHORIZED || *status == StatusCode::FORBIDDEN
        )
    }

    /// True for failures where the server never gave an answer.
    pub fn is_transport(&self) -> bool {
        matches!(self, AuthCallError::Transport(_))
    }
}

impl From<reqwest::Error> for AuthCallError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AuthCallError::InvalidResponse(err.to_string())
        } else {
            AuthCallError::Transport(err.to_string())
        }
    }
}

/// Token storage read/write failure. Never surfaced to consumers.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Stored record is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
}

/// Error returned by session-mutating operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Auth(#[from] AuthCallError),

    #[error("Auth API returned an unusable token: {0}")]
    Decode(#[from] DecodeError),
}

impl SessionError {
    /// True when the login/register was rejected for bad credentials.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, SessionError::Auth(e) if e.is_unauthorized())
    }
}

/// Result type alias for session operations
pub type Result<T> = std::result::Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_classification() {
        let err = AuthCallError::Status {
            status: StatusCode::UNAUTHORIZED,
            body: "bad token".to_string(),
        };
        assert!(err.is_unauthorized());
        assert!(SessionError::from(err).is_unauthorized());

        let err = AuthCallError::Status {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: String::new(),
        };
        assert!(!err.is_unauthorized());

        let err = AuthCallError::Transport("connection refused".to_string());
        assert!(!err.is_unauthorized());
        assert!(err.is_transport());
    }

    #[test]
    fn test_decode_error_is_not_unauthorized() {
        let err = SessionError::from(DecodeError::Malformed("x".to_string()));
        assert!(!err.is_unauthorized());
        assert!(err.to_string().contains("unusable token"));
    }
}
