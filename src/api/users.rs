// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User endpoints.
//!
//! Registration is open. Everything else is limited to the caller's own
//! account; any other id is answered with 401.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::StatusResponse;
use crate::auth::{Auth, AuthError, AuthenticatedUser, Role};
use crate::error::ApiError;
use crate::state::AppState;
use crate::storage::{NewUser, StoredUser, UserError, UserPatch, UserRepository};

/// Request body for POST /users
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// `buyer` or `seller`
    #[serde(default)]
    pub role: String,
    /// Opening balance in cents; buyers only
    #[serde(default)]
    pub deposit: Option<i64>,
}

/// Request body for PATCH /users/{id}
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub deposit: Option<i64>,
}

/// Public view of a user; never carries the password hash.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub user_id: u64,
    pub username: String,
    pub role: Role,
    /// Balance in cents
    pub deposit: u64,
}

impl From<StoredUser> for UserResponse {
    fn from(user: StoredUser) -> Self {
        Self {
            user_id: user.user_id,
            username: user.username,
            role: user.role,
            deposit: user.deposit,
        }
    }
}

fn ensure_self(user: &AuthenticatedUser, user_id: u64) -> Result<(), AuthError> {
    if user.user_id == user_id {
        Ok(())
    } else {
        Err(AuthError::ForeignAccount)
    }
}

/// Map a repository result onto the status envelope.
fn status_of(result: Result<StoredUser, UserError>) -> Result<StatusResponse, ApiError> {
    match result {
        Ok(user) => Ok(StatusResponse::user(user.user_id)),
        Err(UserError::Invalid(message)) => Ok(StatusResponse::rejected(message)),
        Err(e) => Err(e.into()),
    }
}

/// Register a new account.
///
/// Validation failures are answered with 200 and `status: false`.
#[utoipa::path(
    post,
    path = "/users",
    tag = "Users",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created", body = StatusResponse),
        (status = 200, description = "Rejected; see message", body = StatusResponse),
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<StatusResponse>), ApiError> {
    let result = UserRepository::new(state.store()).create(NewUser {
        username: request.username,
        password: request.password,
        role: request.role,
        deposit: request.deposit,
    });

    let response = status_of(result)?;
    let code = if response.status {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((code, Json(response)))
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "Users",
    security(("bearer" = [])),
    params(("id" = u64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User", body = UserResponse),
        (status = 401, description = "Not your account"),
        (status = 404, description = "User not found"),
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    Auth(user): Auth,
    Path(user_id): Path<u64>,
) -> Result<Json<UserResponse>, ApiError> {
    ensure_self(&user, user_id)?;
    let stored = UserRepository::new(state.store())
        .find_by_id(user_id)?
        .ok_or_else(|| ApiError::not_found(format!("User {user_id} not found")))?;
    Ok(Json(stored.into()))
}

/// Update the caller's own account.
///
/// Changing role zeroes the balance; becoming a buyer also deletes the
/// caller's products.
#[utoipa::path(
    patch,
    path = "/users/{id}",
    tag = "Users",
    security(("bearer" = [])),
    params(("id" = u64, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated, or rejected with a message", body = StatusResponse),
        (status = 401, description = "Not your account"),
        (status = 404, description = "User not found"),
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    Auth(user): Auth,
    Path(user_id): Path<u64>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    ensure_self(&user, user_id)?;
    let result = UserRepository::new(state.store()).update(
        user_id,
        UserPatch {
            username: request.username,
            password: request.password,
            role: request.role,
            deposit: request.deposit,
        },
    );
    Ok(Json(status_of(result)?))
}

/// Delete the caller's own account together with its sessions and products.
#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "Users",
    security(("bearer" = [])),
    params(("id" = u64, Path, description = "User ID")),
    responses(
        (status = 200, description = "Deleted", body = StatusResponse),
        (status = 401, description = "Not your account"),
        (status = 404, description = "User not found"),
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Auth(user): Auth,
    Path(user_id): Path<u64>,
) -> Result<Json<StatusResponse>, ApiError> {
    ensure_self(&user, user_id)?;
    let deleted = UserRepository::new(state.store()).delete(user_id)?;
    tracing::info!(user_id, "account deleted");
    Ok(Json(StatusResponse::user(deleted.user_id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::test_state;

    fn caller(state: &AppState, user_id: u64, role: Role) -> AuthenticatedUser {
        let issued = state.credentials().issue(user_id, role).unwrap();
        state.credentials().verify(&issued.token).unwrap()
    }

    fn request(username: &str, role: &str, deposit: Option<i64>) -> Json<RegisterRequest> {
        Json(RegisterRequest {
            username: username.to_string(),
            password: "secret".to_string(),
            role: role.to_string(),
            deposit,
        })
    }

    #[tokio::test]
    async fn register_returns_created_with_id() {
        let (state, _dir) = test_state();
        let (code, Json(body)) = register(State(state), request("bea", "buyer", Some(15)))
            .await
            .unwrap();
        assert_eq!(code, StatusCode::CREATED);
        assert!(body.status);
        assert_eq!(body.user_id, Some(1));
    }

    #[tokio::test]
    async fn register_validation_failure_is_ok_with_message() {
        let (state, _dir) = test_state();
        let (code, Json(body)) = register(State(state.clone()), request("sam", "seller", Some(5)))
            .await
            .unwrap();
        assert_eq!(code, StatusCode::OK);
        assert!(!body.status);
        assert!(body.message.is_some());

        let _registered = register(State(state.clone()), request("bea", "buyer", None))
            .await
            .unwrap();
        let (_, Json(dup)) = register(State(state), request("bea", "buyer", None))
            .await
            .unwrap();
        assert!(!dup.status);
    }

    #[tokio::test]
    async fn register_with_huge_deposit_is_rejected() {
        let (state, _dir) = test_state();
        let (code, Json(body)) = register(
            State(state.clone()),
            request("whale", "buyer", Some(9_223_372_036_854_775_805)),
        )
        .await
        .unwrap();
        assert_eq!(code, StatusCode::OK);
        assert!(!body.status);
        assert!(UserRepository::new(state.store())
            .find_by_username("whale")
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn other_accounts_are_unauthorized() {
        let (state, _dir) = test_state();
        let _registered = register(State(state.clone()), request("bea", "buyer", None))
            .await
            .unwrap();
        let _registered = register(State(state.clone()), request("ben", "buyer", None))
            .await
            .unwrap();

        let err = get_user(State(state.clone()), Auth(caller(&state, 1, Role::Buyer)), Path(2))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);

        let err = delete_user(State(state.clone()), Auth(caller(&state, 1, Role::Buyer)), Path(2))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
        assert!(UserRepository::new(state.store())
            .find_by_id(2)
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn get_own_account_hides_hash() {
        let (state, _dir) = test_state();
        let _registered = register(State(state.clone()), request("bea", "buyer", Some(20)))
            .await
            .unwrap();

        let Json(me) = get_user(State(state.clone()), Auth(caller(&state, 1, Role::Buyer)), Path(1))
            .await
            .unwrap();
        assert_eq!(me.username, "bea");
        assert_eq!(me.deposit, 20);

        let json = serde_json::to_value(&me).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["userId"], 1);
    }

    #[tokio::test]
    async fn update_to_seller_zeroes_balance() {
        let (state, _dir) = test_state();
        let _registered = register(State(state.clone()), request("bea", "buyer", Some(50)))
            .await
            .unwrap();

        let patch = UpdateUserRequest {
            role: Some("seller".to_string()),
            ..Default::default()
        };
        let Json(body) = update_user(
            State(state.clone()),
            Auth(caller(&state, 1, Role::Buyer)),
            Path(1),
            Json(patch),
        )
        .await
        .unwrap();
        assert!(body.status);

        let stored = UserRepository::new(state.store()).find_by_id(1).unwrap().unwrap();
        assert_eq!(stored.role, Role::Seller);
        assert_eq!(stored.deposit, 0);
    }

    #[tokio::test]
    async fn update_rejection_is_reported_in_body() {
        let (state, _dir) = test_state();
        let _registered = register(State(state.clone()), request("bea", "buyer", None))
            .await
            .unwrap();

        let patch = UpdateUserRequest {
            deposit: Some(7),
            ..Default::default()
        };
        let Json(body) = update_user(
            State(state.clone()),
            Auth(caller(&state, 1, Role::Buyer)),
            Path(1),
            Json(patch),
        )
        .await
        .unwrap();
        assert!(!body.status);
    }
}
