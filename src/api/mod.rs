// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    routing::{get, post},
    Router,
};
use serde::Serialize;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi, ToSchema,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{AuthenticatedUser, Role},
    machine::Purchase,
    state::AppState,
    storage::StoredProduct,
};

pub mod auth;
pub mod health;
pub mod machine;
pub mod products;
pub mod users;

/// Outcome of a user or product mutation.
///
/// Validation failures are reported here with `status: false` rather than
/// as an HTTP error.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub status: bool,
}

impl StatusResponse {
    pub fn user(user_id: u64) -> Self {
        Self {
            user_id: Some(user_id),
            product_id: None,
            message: None,
            status: true,
        }
    }

    pub fn product(product_id: u64) -> Self {
        Self {
            user_id: None,
            product_id: Some(product_id),
            message: None,
            status: true,
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            user_id: None,
            product_id: None,
            message: Some(message.into()),
            status: false,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/logout/all", post(auth::logout_all))
        .route("/auth/whoami", get(auth::whoami))
        .route("/users", post(users::register))
        .route(
            "/users/{id}",
            get(users::get_user)
                .patch(users::update_user)
                .delete(users::delete_user),
        )
        .route(
            "/products",
            get(products::list_products).post(products::create_product),
        )
        .route("/products/mine", get(products::list_my_products))
        .route(
            "/products/{id}",
            get(products::get_product)
                .patch(products::update_product)
                .delete(products::delete_product),
        )
        .route("/deposit", post(machine::deposit))
        .route("/reset", post(machine::reset))
        .route("/buy", post(machine::buy))
        .with_state(state);

    Router::new()
        .merge(routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        health::readiness,
        auth::login,
        auth::logout,
        auth::logout_all,
        auth::whoami,
        users::register,
        users::get_user,
        users::update_user,
        users::delete_user,
        products::list_products,
        products::get_product,
        products::list_my_products,
        products::create_product,
        products::update_product,
        products::delete_product,
        machine::deposit,
        machine::reset,
        machine::buy
    ),
    components(
        schemas(
            Role,
            AuthenticatedUser,
            StatusResponse,
            StoredProduct,
            Purchase,
            auth::LoginRequest,
            auth::LoginResponse,
            auth::MessageResponse,
            auth::WhoAmIResponse,
            users::RegisterRequest,
            users::UpdateUserRequest,
            users::UserResponse,
            products::CreateProductRequest,
            products::UpdateProductRequest,
            machine::DepositRequest,
            machine::BuyRequest,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Auth", description = "Login and session management"),
        (name = "Users", description = "Account registration and self-service"),
        (name = "Products", description = "Product catalog"),
        (name = "Machine", description = "Deposit, reset and buy")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::test_state;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        app.clone().oneshot(request).await.unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn register(app: &Router, username: &str, role: &str) -> u64 {
        let response = send(
            app,
            Method::POST,
            "/users",
            None,
            Some(json!({"username": username, "password": "secret", "role": role})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        json_body(response).await["userId"].as_u64().unwrap()
    }

    async fn login(app: &Router, username: &str) -> String {
        let response = send(
            app,
            Method::POST,
            "/auth/login",
            None,
            Some(json!({"username": username, "password": "secret"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        json_body(response).await["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn router_builds_with_all_routes() {
        let (state, _dir) = test_state();
        let app = router(state);
        // Ensure the router can be converted into a service without panicking.
        let _ = app.into_make_service();
    }

    #[tokio::test]
    async fn openapi_lists_machine_routes() {
        let doc = serde_json::to_value(ApiDoc::openapi()).unwrap();
        assert!(doc["paths"]["/buy"].is_object());
        assert!(doc["components"]["securitySchemes"]["bearer"].is_object());
    }

    #[tokio::test]
    async fn session_routes_require_a_token() {
        let (state, _dir) = test_state();
        let app = router(state);

        for (method, uri) in [
            (Method::GET, "/products"),
            (Method::GET, "/auth/whoami"),
            (Method::POST, "/deposit"),
            (Method::POST, "/auth/logout"),
        ] {
            let response = send(&app, method, uri, None, None).await;
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
        }
    }

    #[tokio::test]
    async fn full_purchase_flow() {
        let (state, _dir) = test_state();
        let app = router(state);

        register(&app, "sam", "seller").await;
        register(&app, "bea", "buyer").await;
        let seller = login(&app, "sam").await;
        let buyer = login(&app, "bea").await;

        let response = send(
            &app,
            Method::POST,
            "/products",
            Some(&seller),
            Some(json!({"productName": "Gum", "cost": 5, "amountAvailable": 4})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let product_id = json_body(response).await["productId"].as_u64().unwrap();

        for coin in [5, 10] {
            let response = send(
                &app,
                Method::POST,
                "/deposit",
                Some(&buyer),
                Some(json!({"amount": coin})),
            )
            .await;
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = send(
            &app,
            Method::POST,
            "/buy",
            Some(&buyer),
            Some(json!({"productId": product_id, "amount": 1})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({"amount": 1, "product": "Gum", "change": [10]})
        );

        let response = send(&app, Method::GET, "/auth/whoami", Some(&buyer), None).await;
        assert_eq!(json_body(response).await["balance"], 0);

        let response = send(&app, Method::GET, &format!("/products/{product_id}"), Some(&buyer), None).await;
        assert_eq!(json_body(response).await["amountAvailable"], 3);
    }

    #[tokio::test]
    async fn roles_are_enforced() {
        let (state, _dir) = test_state();
        let app = router(state);
        register(&app, "sam", "seller").await;
        register(&app, "bea", "buyer").await;
        let seller = login(&app, "sam").await;
        let buyer = login(&app, "bea").await;

        let response = send(
            &app,
            Method::POST,
            "/deposit",
            Some(&seller),
            Some(json!({"amount": 5})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = send(
            &app,
            Method::POST,
            "/products",
            Some(&buyer),
            Some(json!({"productName": "Gum", "cost": 5, "amountAvailable": 4})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn non_numeric_deposit_is_bad_request() {
        let (state, _dir) = test_state();
        let app = router(state);
        register(&app, "bea", "buyer").await;
        let buyer = login(&app, "bea").await;

        let response = send(
            &app,
            Method::POST,
            "/deposit",
            Some(&buyer),
            Some(json!({"amount": "five"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(
            &app,
            Method::POST,
            "/deposit",
            Some(&buyer),
            Some(json!({"amount": 8})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn logout_revokes_the_token() {
        let (state, _dir) = test_state();
        let app = router(state);
        register(&app, "bea", "buyer").await;
        let token = login(&app, "bea").await;

        let response = send(&app, Method::POST, "/auth/logout", Some(&token), None).await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = send(&app, Method::GET, "/auth/whoami", Some(&token), None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["error_code"], "invalid_token");
    }

    #[tokio::test]
    async fn deleting_account_ends_its_sessions() {
        let (state, _dir) = test_state();
        let app = router(state);
        let user_id = register(&app, "bea", "buyer").await;
        let token = login(&app, "bea").await;

        let response = send(
            &app,
            Method::DELETE,
            &format!("/users/{user_id}"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = send(&app, Method::GET, "/products", Some(&token), None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn responses_carry_request_id() {
        let (state, _dir) = test_state();
        let app = router(state);
        let response = send(&app, Method::GET, "/health/live", None, None).await;
        assert!(response.headers().contains_key("x-request-id"));
    }
}
