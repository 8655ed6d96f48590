// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Product catalog endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;

use super::StatusResponse;
use crate::auth::{Auth, AuthenticatedUser, SellerOnly};
use crate::error::ApiError;
use crate::state::AppState;
use crate::storage::{
    CatalogError, NewProduct, OwnershipCheck, ProductPatch, ProductRepository, StorageError,
    StoredProduct,
};

/// Request body for POST /products
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    #[serde(default)]
    pub product_name: String,
    /// Unit price in cents
    #[serde(default)]
    pub cost: i64,
    #[serde(default)]
    pub amount_available: i64,
}

/// Request body for PATCH /products/{id}
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub product_name: Option<String>,
    pub cost: Option<i64>,
    pub amount_available: Option<i64>,
}

/// Load a product the caller owns.
///
/// Missing and foreign products get the same 403.
fn owned_product(
    state: &AppState,
    product_id: u64,
    user: &AuthenticatedUser,
) -> Result<StoredProduct, ApiError> {
    ProductRepository::new(state.store())
        .find(product_id)
        .verify_owner(user)
        .map_err(|e| match e {
            StorageError::NotFound(_) | StorageError::PermissionDenied { .. } => {
                tracing::debug!(product_id, user_id = user.user_id, "product mutation refused");
                ApiError::forbidden("Forbidden")
            }
            other => other.into(),
        })
}

fn status_of(result: Result<StoredProduct, CatalogError>) -> Result<StatusResponse, ApiError> {
    match result {
        Ok(product) => Ok(StatusResponse::product(product.product_id)),
        Err(CatalogError::Invalid(message)) => Ok(StatusResponse::rejected(message)),
        Err(e) => Err(e.into()),
    }
}

#[utoipa::path(
    get,
    path = "/products",
    tag = "Products",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Whole catalog", body = Vec<StoredProduct>),
        (status = 401, description = "Unauthorized - invalid or missing token"),
    )
)]
pub async fn list_products(
    State(state): State<AppState>,
    Auth(_user): Auth,
) -> Result<Json<Vec<StoredProduct>>, ApiError> {
    Ok(Json(ProductRepository::new(state.store()).list()?))
}

#[utoipa::path(
    get,
    path = "/products/{id}",
    tag = "Products",
    security(("bearer" = [])),
    params(("id" = u64, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product", body = StoredProduct),
        (status = 404, description = "Product not found"),
    )
)]
pub async fn get_product(
    State(state): State<AppState>,
    Auth(_user): Auth,
    Path(product_id): Path<u64>,
) -> Result<Json<StoredProduct>, ApiError> {
    Ok(Json(ProductRepository::new(state.store()).get(product_id)?))
}

/// Products listed by the calling seller.
#[utoipa::path(
    get,
    path = "/products/mine",
    tag = "Products",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Caller's products", body = Vec<StoredProduct>),
        (status = 403, description = "Sellers only"),
    )
)]
pub async fn list_my_products(
    State(state): State<AppState>,
    SellerOnly(user): SellerOnly,
) -> Result<Json<Vec<StoredProduct>>, ApiError> {
    Ok(Json(
        ProductRepository::new(state.store()).list_by_seller(user.user_id)?,
    ))
}

#[utoipa::path(
    post,
    path = "/products",
    tag = "Products",
    security(("bearer" = [])),
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product listed", body = StatusResponse),
        (status = 200, description = "Rejected; see message", body = StatusResponse),
        (status = 403, description = "Sellers only"),
    )
)]
pub async fn create_product(
    State(state): State<AppState>,
    SellerOnly(user): SellerOnly,
    Json(request): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<StatusResponse>), ApiError> {
    let result = ProductRepository::new(state.store()).create(
        NewProduct {
            product_name: request.product_name,
            cost: request.cost,
            amount_available: request.amount_available,
        },
        user.user_id,
    );

    let response = status_of(result)?;
    let code = if response.status {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((code, Json(response)))
}

#[utoipa::path(
    patch,
    path = "/products/{id}",
    tag = "Products",
    security(("bearer" = [])),
    params(("id" = u64, Path, description = "Product ID")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Updated, or rejected with a message", body = StatusResponse),
        (status = 403, description = "Not the owner, or no such product"),
    )
)]
pub async fn update_product(
    State(state): State<AppState>,
    SellerOnly(user): SellerOnly,
    Path(product_id): Path<u64>,
    Json(request): Json<UpdateProductRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    owned_product(&state, product_id, &user)?;
    let result = ProductRepository::new(state.store()).update(
        product_id,
        ProductPatch {
            product_name: request.product_name,
            cost: request.cost,
            amount_available: request.amount_available,
        },
    );
    Ok(Json(status_of(result)?))
}

#[utoipa::path(
    delete,
    path = "/products/{id}",
    tag = "Products",
    security(("bearer" = [])),
    params(("id" = u64, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Deleted", body = StatusResponse),
        (status = 403, description = "Not the owner, or no such product"),
    )
)]
pub async fn delete_product(
    State(state): State<AppState>,
    SellerOnly(user): SellerOnly,
    Path(product_id): Path<u64>,
) -> Result<Json<StatusResponse>, ApiError> {
    owned_product(&state, product_id, &user)?;
    let deleted = ProductRepository::new(state.store()).delete(product_id)?;
    Ok(Json(StatusResponse::product(deleted.product_id)))
}
