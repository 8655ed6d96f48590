// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for authenticated users.
//!
//! Use the `Auth` extractor in handlers to require a live session:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(user): Auth) -> impl IntoResponse {
//!     // user is AuthenticatedUser
//! }
//! ```
//!
//! `BuyerOnly` and `SellerOnly` additionally require the role carried by
//! the credential.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use super::{AuthError, AuthenticatedUser, Role};
use crate::state::AppState;
use crate::storage::SessionRepository;

/// Resolve a bearer token to its user.
///
/// The token must verify and a session carrying it must still exist.
pub fn authenticate(state: &AppState, token: &str) -> Result<AuthenticatedUser, AuthError> {
    let user = state.credentials().verify(token)?;

    let session = SessionRepository::new(state.store())
        .find_by_token(token)
        .map_err(|e| AuthError::InternalError(format!("Session lookup failed: {e}")))?;

    match session {
        Some(session) if session.owner_user_id == user.user_id => Ok(user),
        _ => Err(AuthError::SessionNotFound),
    }
}

/// Reject users whose credential does not carry `required`.
pub fn require_role(user: &AuthenticatedUser, required: Role) -> Result<(), AuthError> {
    if user.has_role(required) {
        Ok(())
    } else {
        Err(AuthError::InsufficientPermissions)
    }
}

fn bearer_token(parts: &Parts) -> Result<&str, AuthError> {
    let auth_header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::InvalidAuthHeader)
}

/// Extractor for authenticated users.
///
/// # Example
///
/// ```rust,ignore
/// async fn whoami(Auth(user): Auth) -> Json<AuthenticatedUser> {
///     Json(user)
/// }
/// ```
pub struct Auth(pub AuthenticatedUser);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // Already resolved earlier in this request
        if let Some(user) = parts.extensions.get::<AuthenticatedUser>().cloned() {
            return Ok(Auth(user));
        }

        let token = bearer_token(parts)?;
        let user = authenticate(state, token)?;
        parts.extensions.insert(user.clone());

        Ok(Auth(user))
    }
}

/// Extractor that requires the buyer role.
pub struct BuyerOnly(pub AuthenticatedUser);

impl FromRequestParts<AppState> for BuyerOnly {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Auth(user) = Auth::from_request_parts(parts, state).await?;
        require_role(&user, Role::Buyer)?;
        Ok(BuyerOnly(user))
    }
}

/// Extractor that requires the seller role.
pub struct SellerOnly(pub AuthenticatedUser);

impl FromRequestParts<AppState> for SellerOnly {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Auth(user) = Auth::from_request_parts(parts, state).await?;
        require_role(&user, Role::Seller)?;
        Ok(SellerOnly(user))
    }
}
