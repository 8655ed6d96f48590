// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::auth::AuthError;
use crate::machine::VendingError;
use crate::storage::{CatalogError, StorageError, UserError};

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    /// Log the cause and hide it from the caller.
    pub fn internal(cause: impl std::fmt::Display) -> Self {
        tracing::error!(error = %cause, "internal error");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        if let AuthError::InternalError(cause) = &e {
            return ApiError::internal(cause);
        }
        ApiError::new(e.status_code(), e.to_string())
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound(what) => ApiError::not_found(what),
            StorageError::PermissionDenied { .. } => ApiError::forbidden("Forbidden"),
            other => ApiError::internal(other),
        }
    }
}

impl From<UserError> for ApiError {
    fn from(e: UserError) -> Self {
        match e {
            UserError::Invalid(message) => ApiError::bad_request(message),
            UserError::NotFound(_) => ApiError::not_found(e.to_string()),
            UserError::Password(_) | UserError::Storage(_) => ApiError::internal(e),
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::Invalid(message) => ApiError::bad_request(message),
            CatalogError::NotFound(_) => ApiError::not_found(e.to_string()),
            CatalogError::Storage(_) => ApiError::internal(e),
        }
    }
}

impl From<VendingError> for ApiError {
    fn from(e: VendingError) -> Self {
        match e {
            VendingError::NegativeAmount
            | VendingError::IllegalCoin(_)
            | VendingError::InvalidQuantity
            | VendingError::BalanceLimit
            | VendingError::ChangeUnavailable(_) => ApiError::bad_request(e.to_string()),
            VendingError::NotEnoughProducts { .. } => ApiError::bad_request("Not enough products"),
            VendingError::NotEnoughMoney { .. } => ApiError::bad_request("Not enough money"),
            VendingError::UserNotFound(_) | VendingError::ProductNotFound(_) => {
                ApiError::not_found(e.to_string())
            }
            VendingError::NotABuyer => ApiError::forbidden(e.to_string()),
            VendingError::Storage(_) => ApiError::internal(e),
        }
    }
}
