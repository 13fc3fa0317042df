// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Access token claims decoding.
//!
//! The client only reads claims out of tokens it received directly from
//! its own login/refresh calls. Signatures are NOT verified here and the
//! expiry is used for scheduling only; the refresh token is never decoded.

use std::collections::HashSet;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::error::DecodeError;

/// Claims carried by an access token.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    pub email: String,
    pub role: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    /// Issued at (Unix timestamp)
    #[serde(default)]
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Expiry in Unix milliseconds.
    pub fn expires_at_ms(&self) -> i64 {
        self.exp.saturating_mul(1000)
    }

    /// Milliseconds of lifetime left at `now_ms` (negative once expired).
    pub fn remaining_ms(&self, now_ms: i64) -> i64 {
        self.expires_at_ms() - now_ms
    }

    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        self.remaining_ms(now_ms) <= 0
    }
}

/// Decode the claims of an access token without verifying its signature.
pub fn decode(access_token: &str) -> Result<Claims, DecodeError> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims = HashSet::from(["exp".to_string(), "sub".to_string()]);

    let token_data =
        jsonwebtoken::decode::<Claims>(access_token, &DecodingKey::from_secret(&[]), &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::Json(_) | ErrorKind::MissingRequiredClaim(_) => {
                    DecodeError::Claims(e.to_string())
                }
                _ => DecodeError::Malformed(e.to_string()),
            })?;

    let claims = token_data.claims;
    if claims.sub.trim().is_empty() {
        return Err(DecodeError::Claims("empty subject".to_string()));
    }

    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
    use serde_json::json;

    fn sign(payload: serde_json::Value) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            &payload,
            &EncodingKey::from_secret(b"issuer-only-secret"),
        )
        .expect("Failed to create JWT")
    }

    #[test]
    fn test_decode_reads_all_claims() {
        let token = sign(json!({
            "sub": "17",
            "email": "user@example.com",
            "role": "Manager",
            "fullName": "Pat Doe",
            "phoneNumber": "+15550100",
            "iat": 1_700_000_000,
            "exp": 1_700_003_600
        }));

        let claims = decode(&token).unwrap();
        assert_eq!(claims.sub, "17");
        assert_eq!(claims.email, "user@example.com");
        assert_eq!(claims.role, "Manager");
        assert_eq!(claims.full_name.as_deref(), Some("Pat Doe"));
        assert_eq!(claims.phone_number.as_deref(), Some("+15550100"));
        assert_eq!(claims.iat, 1_700_000_000);
        assert_eq!(claims.exp, 1_700_003_600);
    }

    #[test]
    fn test_decode_ignores_signature_and_expiry() {
        // Signed with a key the client never sees, and long expired.
        let token = sign(json!({
            "sub": "17",
            "email": "user@example.com",
            "role": "Manager",
            "iat": 1,
            "exp": 2
        }));
        let claims = decode(&token).unwrap();
        assert!(claims.is_expired_at(3_000));
        assert!(claims.full_name.is_none());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(decode("not-a-token"), Err(DecodeError::Malformed(_))));
        assert!(matches!(decode("a.b.c"), Err(DecodeError::Malformed(_))));
        assert!(decode("").is_err());
    }

    #[test]
    fn test_decode_rejects_missing_claims() {
        let no_exp = sign(json!({ "sub": "1", "email": "e", "role": "r" }));
        assert!(matches!(decode(&no_exp), Err(DecodeError::Claims(_))));

        let no_email = sign(json!({ "sub": "1", "role": "r", "exp": 10 }));
        assert!(matches!(decode(&no_email), Err(DecodeError::Claims(_))));

        let blank_sub = sign(json!({ "sub": " ", "email": "e", "role": "r", "exp": 10 }));
        assert!(matches!(decode(&blank_sub), Err(DecodeError::Claims(_))));
    }

    #[test]
    fn test_remaining_lifetime() {
        let claims = Claims {
            sub: "1".to_string(),
            email: "e".to_string(),
            role: "r".to_string(),
            full_name: None,
            phone_number: None,
            iat: 0,
            exp: 600,
        };
        assert_eq!(claims.remaining_ms(0), 600_000);
        assert!(!claims.is_expired_at(599_999));
        assert!(claims.is_expired_at(600_000));
    }
}
