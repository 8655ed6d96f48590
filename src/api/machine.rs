// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Vending machine endpoints. Buyers only.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::auth::BuyerOnly;
use crate::error::ApiError;
use crate::machine::{Purchase, VendingMachine};
use crate::state::AppState;

/// Request body for POST /deposit
#[derive(Debug, Deserialize, ToSchema)]
pub struct DepositRequest {
    /// A single coin: 5, 10, 20, 50 or 100
    pub amount: i64,
}

/// Request body for POST /buy
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BuyRequest {
    pub product_id: u64,
    /// Number of units
    pub amount: i64,
}

/// Malformed bodies (a string amount, a missing field) are plain 400s.
fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::bad_request(rejection.body_text()))
}

#[utoipa::path(
    post,
    path = "/deposit",
    tag = "Machine",
    security(("bearer" = [])),
    request_body = DepositRequest,
    responses(
        (status = 200, description = "Coin accepted"),
        (status = 400, description = "Not a legal coin"),
        (status = 403, description = "Buyers only"),
    )
)]
pub async fn deposit(
    State(state): State<AppState>,
    BuyerOnly(user): BuyerOnly,
    payload: Result<Json<DepositRequest>, JsonRejection>,
) -> Result<(), ApiError> {
    let request = body(payload)?;
    VendingMachine::new(state.store()).deposit(user.user_id, request.amount)?;
    Ok(())
}

#[utoipa::path(
    post,
    path = "/reset",
    tag = "Machine",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Balance set to 0"),
        (status = 403, description = "Buyers only"),
    )
)]
pub async fn reset(
    State(state): State<AppState>,
    BuyerOnly(user): BuyerOnly,
) -> Result<(), ApiError> {
    VendingMachine::new(state.store()).reset(user.user_id)?;
    Ok(())
}

/// Buy with the whole balance; whatever is left comes back as coins.
#[utoipa::path(
    post,
    path = "/buy",
    tag = "Machine",
    security(("bearer" = [])),
    request_body = BuyRequest,
    responses(
        (status = 200, description = "Purchase completed", body = Purchase),
        (status = 400, description = "Not enough products or money"),
        (status = 403, description = "Buyers only"),
        (status = 404, description = "Product not found"),
    )
)]
pub async fn buy(
    State(state): State<AppState>,
    BuyerOnly(user): BuyerOnly,
    payload: Result<Json<BuyRequest>, JsonRejection>,
) -> Result<Json<Purchase>, ApiError> {
    let request = body(payload)?;
    let purchase =
        VendingMachine::new(state.store()).buy(user.user_id, request.product_id, request.amount)?;
    Ok(Json(purchase))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthenticatedUser, Role};
    use crate::state::test_support::test_state;
    use crate::storage::{NewProduct, NewUser, ProductRepository, UserRepository};
    use axum::http::StatusCode;

    fn user(state: &AppState, username: &str, role: Role) -> AuthenticatedUser {
        let user_id = UserRepository::new(state.store())
            .create(NewUser {
                username: username.to_string(),
                password: "secret".to_string(),
                role: role.to_string(),
                deposit: None,
            })
            .unwrap()
            .user_id;
        let issued = state.credentials().issue(user_id, role).unwrap();
        state.credentials().verify(&issued.token).unwrap()
    }

    fn coin(amount: i64) -> Result<Json<DepositRequest>, JsonRejection> {
        Ok(Json(DepositRequest { amount }))
    }

    #[tokio::test]
    async fn deposit_then_buy_returns_change() {
        let (state, _dir) = test_state();
        let sam = user(&state, "sam", Role::Seller);
        let bea = user(&state, "bea", Role::Buyer);
        let product = ProductRepository::new(state.store())
            .create(
                NewProduct {
                    product_name: "Gum".to_string(),
                    cost: 5,
                    amount_available: 4,
                },
                sam.user_id,
            )
            .unwrap();

        deposit(State(state.clone()), BuyerOnly(bea.clone()), coin(5))
            .await
            .unwrap();
        deposit(State(state.clone()), BuyerOnly(bea.clone()), coin(10))
            .await
            .unwrap();

        let Json(purchase) = buy(
            State(state.clone()),
            BuyerOnly(bea.clone()),
            Ok(Json(BuyRequest {
                product_id: product.product_id,
                amount: 1,
            })),
        )
        .await
        .unwrap();

        assert_eq!(purchase.amount, 1);
        assert_eq!(purchase.product, "Gum");
        assert_eq!(purchase.change, vec![10]);

        let stored = UserRepository::new(state.store())
            .find_by_id(bea.user_id)
            .unwrap()
            .unwrap();
        assert_eq!(stored.deposit, 0);
    }

    #[tokio::test]
    async fn illegal_coin_is_bad_request() {
        let (state, _dir) = test_state();
        let bea = user(&state, "bea", Role::Buyer);

        let err = deposit(State(state.clone()), BuyerOnly(bea.clone()), coin(8))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let err = deposit(State(state), BuyerOnly(bea), coin(-5))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn reset_clears_balance() {
        let (state, _dir) = test_state();
        let bea = user(&state, "bea", Role::Buyer);
        deposit(State(state.clone()), BuyerOnly(bea.clone()), coin(100))
            .await
            .unwrap();

        reset(State(state.clone()), BuyerOnly(bea.clone())).await.unwrap();

        let stored = UserRepository::new(state.store())
            .find_by_id(bea.user_id)
            .unwrap()
            .unwrap();
        assert_eq!(stored.deposit, 0);
    }

    #[tokio::test]
    async fn buying_unknown_product_is_not_found() {
        let (state, _dir) = test_state();
        let bea = user(&state, "bea", Role::Buyer);

        let err = buy(
            State(state),
            BuyerOnly(bea),
            Ok(Json(BuyRequest {
                product_id: 404,
                amount: 1,
            })),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }
}
