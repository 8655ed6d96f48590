// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWT claims and authenticated user representation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{roles::Role, AuthError};

/// Claims carried by a vending machine credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: decimal user id
    pub sub: String,

    /// Role at the time the credential was issued
    pub role: Role,

    /// Issued at, epoch milliseconds
    pub iat_ms: i64,

    /// Issued at, epoch seconds
    pub iat: i64,

    /// Expiration, epoch seconds
    pub exp: i64,

    /// Unique token id, keeps tokens issued in the same millisecond distinct
    pub jti: String,
}

/// Authenticated user information extracted from a session-checked JWT.
///
/// This is the primary type used throughout the application to represent
/// the caller of a request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    /// Canonical user id
    pub user_id: u64,

    /// Role claimed by the credential
    pub role: Role,

    /// When the credential was issued
    pub issued_at: DateTime<Utc>,

    /// Raw token, needed to revoke the session on logout
    #[serde(skip)]
    pub token: String,
}

impl AuthenticatedUser {
    /// Build from verified claims and the token they came from.
    pub fn from_claims(claims: Claims, token: impl Into<String>) -> Result<Self, AuthError> {
        let user_id = claims
            .sub
            .parse::<u64>()
            .map_err(|_| AuthError::MalformedToken)?;
        let issued_at =
            DateTime::from_timestamp_millis(claims.iat_ms).ok_or(AuthError::MalformedToken)?;

        Ok(Self {
            user_id,
            role: claims.role,
            issued_at,
            token: token.into(),
        })
    }

    /// Check if the user has the required role.
    pub fn has_role(&self, required: Role) -> bool {
        self.role.permits(required)
    }
}
