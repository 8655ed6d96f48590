// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Login, logout and identity endpoints.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::{Auth, AuthError, Role};
use crate::error::ApiError;
use crate::state::AppState;
use crate::storage::{SessionRepository, UserRepository};

/// Reported on login when the account already has a live session.
pub const ACTIVE_SESSION_WARNING: &str = "There is already an active session using your account";

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub username: String,
    pub role: Role,
    /// Balance in cents
    pub balance: u64,
    /// Empty unless there is something to warn about
    pub message: String,
    /// Bearer credential for later requests
    pub token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WhoAmIResponse {
    pub user_id: u64,
    pub username: String,
    pub role: Role,
    pub balance: u64,
}

/// Exchange username and password for a credential.
///
/// A second login does not revoke earlier sessions; it only reports that
/// one exists.
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 401, description = "Invalid username or password"),
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = UserRepository::new(state.store())
        .authenticate(&request.username, &request.password)?
        .ok_or(AuthError::InvalidCredentials)?;

    let sessions = SessionRepository::new(state.store());
    let message = if sessions.count(user.user_id)? > 0 {
        tracing::warn!(user_id = user.user_id, "login while another session is active");
        ACTIVE_SESSION_WARNING.to_string()
    } else {
        String::new()
    };

    let issued = state.credentials().issue(user.user_id, user.role)?;
    let issued_at = DateTime::from_timestamp_millis(issued.claims.iat_ms).unwrap_or_else(Utc::now);
    sessions.create(&issued.token, user.user_id, issued_at)?;

    tracing::info!(user_id = user.user_id, role = %user.role, "user logged in");
    Ok(Json(LoginResponse {
        username: user.username,
        role: user.role,
        balance: user.deposit,
        message,
        token: issued.token,
    }))
}

/// Revoke the session carrying the presented credential.
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "Auth",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Session revoked", body = MessageResponse),
        (status = 401, description = "Unauthorized - invalid or missing token"),
    )
)]
pub async fn logout(
    State(state): State<AppState>,
    Auth(user): Auth,
) -> Result<Json<MessageResponse>, ApiError> {
    SessionRepository::new(state.store()).delete(&user.token)?;
    tracing::info!(user_id = user.user_id, "user logged out");
    Ok(Json(MessageResponse {
        message: "Logout successful".to_string(),
    }))
}

/// Revoke every session of the caller, including the current one.
#[utoipa::path(
    post,
    path = "/auth/logout/all",
    tag = "Auth",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "All sessions revoked", body = MessageResponse),
        (status = 401, description = "Unauthorized - invalid or missing token"),
    )
)]
pub async fn logout_all(
    State(state): State<AppState>,
    Auth(user): Auth,
) -> Result<Json<MessageResponse>, ApiError> {
    let removed = SessionRepository::new(state.store()).delete_all(user.user_id)?;
    tracing::info!(user_id = user.user_id, removed, "all sessions revoked");
    Ok(Json(MessageResponse {
        message: "Logout all active sessions successful".to_string(),
    }))
}

/// Current identity and balance, read from the store rather than the credential.
#[utoipa::path(
    get,
    path = "/auth/whoami",
    tag = "Auth",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Caller identity", body = WhoAmIResponse),
        (status = 401, description = "Unauthorized - invalid or missing token"),
    )
)]
pub async fn whoami(
    State(state): State<AppState>,
    Auth(user): Auth,
) -> Result<Json<WhoAmIResponse>, ApiError> {
    let stored = UserRepository::new(state.store())
        .find_by_id(user.user_id)?
        .ok_or_else(|| ApiError::unauthorized("Invalid token"))?;

    Ok(Json(WhoAmIResponse {
        user_id: stored.user_id,
        username: stored.username,
        role: stored.role,
        balance: stored.deposit,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::test_state;
    use crate::storage::NewUser;
    use axum::http::StatusCode;

    fn register(state: &AppState, username: &str, role: &str, deposit: i64) -> u64 {
        UserRepository::new(state.store())
            .create(NewUser {
                username: username.to_string(),
                password: "secret".to_string(),
                role: role.to_string(),
                deposit: Some(deposit),
            })
            .unwrap()
            .user_id
    }

    fn credentials(username: &str, password: &str) -> Json<LoginRequest> {
        Json(LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    #[tokio::test]
    async fn login_issues_token_and_records_session() {
        let (state, _dir) = test_state();
        let user_id = register(&state, "bea", "buyer", 25);

        let Json(response) = login(State(state.clone()), credentials("bea", "secret"))
            .await
            .unwrap();
        assert_eq!(response.username, "bea");
        assert_eq!(response.role, Role::Buyer);
        assert_eq!(response.balance, 25);
        assert!(response.message.is_empty());

        let session = SessionRepository::new(state.store())
            .find_by_token(&response.token)
            .unwrap()
            .unwrap();
        assert_eq!(session.owner_user_id, user_id);
    }

    #[tokio::test]
    async fn second_login_warns_but_succeeds() {
        let (state, _dir) = test_state();
        let user_id = register(&state, "bea", "buyer", 0);

        let _session = login(State(state.clone()), credentials("bea", "secret"))
            .await
            .unwrap();
        let Json(second) = login(State(state.clone()), credentials("bea", "secret"))
            .await
            .unwrap();

        assert_eq!(second.message, ACTIVE_SESSION_WARNING);
        assert_eq!(
            SessionRepository::new(state.store()).count(user_id).unwrap(),
            2
        );
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let (state, _dir) = test_state();
        register(&state, "bea", "buyer", 0);

        let err = login(State(state.clone()), credentials("bea", "nope"))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);

        let err = login(State(state), credentials("nobody", "secret"))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn logout_all_revokes_every_session() {
        let (state, _dir) = test_state();
        let user_id = register(&state, "sam", "seller", 0);
        let Json(first) = login(State(state.clone()), credentials("sam", "secret"))
            .await
            .unwrap();
        let _session = login(State(state.clone()), credentials("sam", "secret"))
            .await
            .unwrap();

        let caller = state.credentials().verify(&first.token).unwrap();
        let Json(body) = logout_all(State(state.clone()), Auth(caller)).await.unwrap();
        assert_eq!(body.message, "Logout all active sessions successful");
        assert_eq!(
            SessionRepository::new(state.store()).count(user_id).unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn whoami_reads_current_balance() {
        let (state, _dir) = test_state();
        let user_id = register(&state, "bea", "buyer", 10);
        let Json(session) = login(State(state.clone()), credentials("bea", "secret"))
            .await
            .unwrap();
        crate::machine::VendingMachine::new(state.store())
            .deposit(user_id, 20)
            .unwrap();

        let caller = state.credentials().verify(&session.token).unwrap();
        let Json(me) = whoami(State(state), Auth(caller)).await.unwrap();
        assert_eq!(me.user_id, user_id);
        assert_eq!(me.balance, 30);
    }
}
