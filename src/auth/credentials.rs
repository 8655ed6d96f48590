// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Credential issuing and verification.
//!
//! Credentials are HS256 JWTs signed with the configured secret. A valid
//! signature only proves the server issued the token; callers must still
//! find a live session carrying the same token before trusting it.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use super::{claims::Claims, AuthError, AuthenticatedUser, Role};

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

/// Signing configuration for the credential authority.
#[derive(Clone)]
pub struct CredentialConfig {
    /// HMAC secret
    pub secret: String,
    /// Credential lifetime in seconds
    pub ttl_secs: i64,
}

impl std::fmt::Debug for CredentialConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialConfig")
            .field("secret", &"<redacted>")
            .field("ttl_secs", &self.ttl_secs)
            .finish()
    }
}

/// A freshly signed credential.
#[derive(Debug, Clone)]
pub struct IssuedCredential {
    pub token: String,
    pub claims: Claims,
}

/// Issues and verifies signed credentials.
pub struct CredentialAuthority {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl CredentialAuthority {
    pub fn new(config: &CredentialConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = CLOCK_SKEW_LEEWAY;
        validation.validate_aud = false;

        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            ttl: Duration::seconds(config.ttl_secs),
        }
    }

    /// Sign a credential asserting `user_id` and `role`, stamped with the current time.
    pub fn issue(&self, user_id: u64, role: Role) -> Result<IssuedCredential, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            role,
            iat_ms: now.timestamp_millis(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::InternalError(format!("Failed to sign token: {e}")))?;

        Ok(IssuedCredential { token, claims })
    }

    /// Verify signature and expiry, reporting why a token was refused.
    pub fn verify(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                jsonwebtoken::errors::ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                _ => AuthError::MalformedToken,
            })?;

        AuthenticatedUser::from_claims(token_data.claims, token)
    }

    /// Decode a token without consulting sessions; `None` for anything invalid.
    pub fn decode(&self, token: &str) -> Option<AuthenticatedUser> {
        self.verify(token).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authority(secret: &str, ttl_secs: i64) -> CredentialAuthority {
        CredentialAuthority::new(&CredentialConfig {
            secret: secret.to_string(),
            ttl_secs,
        })
    }

    #[test]
    fn issue_then_decode() {
        let authority = authority("test-secret", 3600);
        let issued = authority.issue(7, Role::Seller).unwrap();

        let user = authority.decode(&issued.token).unwrap();
        assert_eq!(user.user_id, 7);
        assert_eq!(user.role, Role::Seller);
        assert_eq!(user.issued_at.timestamp_millis(), issued.claims.iat_ms);
        assert_eq!(user.token, issued.token);
    }

    #[test]
    fn payload_carries_identity_and_issue_time() {
        use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

        let issued = authority("test-secret", 3600).issue(9, Role::Buyer).unwrap();
        let payload = issued.token.split('.').nth(1).unwrap();
        let claims: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(payload).unwrap()).unwrap();

        assert_eq!(claims["sub"], "9");
        assert_eq!(claims["role"], "buyer");
        assert_eq!(claims["iat_ms"], issued.claims.iat_ms);
        assert_eq!(claims["exp"].as_i64().unwrap() - claims["iat"].as_i64().unwrap(), 3600);
        assert!(claims["jti"].is_string());
    }

    #[test]
    fn tokens_are_unique_per_issue() {
        let authority = authority("test-secret", 3600);
        let first = authority.issue(1, Role::Buyer).unwrap();
        let second = authority.issue(1, Role::Buyer).unwrap();
        assert_ne!(first.token, second.token);
    }

    #[test]
    fn foreign_secret_is_rejected() {
        let issued = authority("secret-a", 3600).issue(1, Role::Buyer).unwrap();
        let result = authority("secret-b", 3600).verify(&issued.token);
        assert!(matches!(result, Err(AuthError::InvalidSignature)));
    }

    #[test]
    fn expired_token_is_rejected() {
        let authority = authority("test-secret", -3600);
        let issued = authority.issue(1, Role::Buyer).unwrap();
        assert!(matches!(
            authority.verify(&issued.token),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn garbage_decodes_to_none() {
        let authority = authority("test-secret", 3600);
        assert!(authority.decode("").is_none());
        assert!(authority.decode("not.a.jwt").is_none());
        assert!(matches!(
            authority.verify("not-even-dotted"),
            Err(AuthError::MalformedToken)
        ));
    }
}
