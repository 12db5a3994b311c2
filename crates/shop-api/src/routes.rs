//! # Routes
//!
//! Axum router configuration for the checkout-session API.

use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router
///
/// Routes:
///   - GET  /health - Health check
///   - POST /checkout/create-checkout-session - Create a hosted checkout session
pub fn create_router(state: AppState) -> Router {
    // The storefront runs on its own origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let checkout_routes = Router::new().route(
        "/create-checkout-session",
        post(handlers::create_checkout_session),
    );

    Router::new()
        .route("/health", get(handlers::health))
        .route("/", get(handlers::health))
        .nest("/checkout", checkout_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::{CreateCheckoutResponse, ErrorResponse};
    use crate::state::AppConfig;
    use async_trait::async_trait;
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::json;
    use shop_core::{CheckoutSession, LineItem, PaymentStrategy, ShopError, ShopResult};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct FakeStrategy {
        seen: Mutex<Vec<(Vec<LineItem>, String, String)>>,
        fail: bool,
    }

    #[async_trait]
    impl PaymentStrategy for FakeStrategy {
        async fn create_checkout(
            &self,
            line_items: &[LineItem],
            success_url: &str,
            cancel_url: &str,
        ) -> ShopResult<CheckoutSession> {
            if self.fail {
                return Err(ShopError::ProviderError {
                    provider: "fake".into(),
                    message: "No such price".into(),
                });
            }
            self.seen.lock().unwrap().push((
                line_items.to_vec(),
                success_url.to_string(),
                cancel_url.to_string(),
            ));
            Ok(CheckoutSession::new(
                "cs_test_1",
                "fake",
                "https://checkout.example.com/cs_test_1",
            ))
        }

        fn provider_name(&self) -> &'static str {
            "fake"
        }
    }

    fn server(strategy: Arc<FakeStrategy>) -> TestServer {
        let state = AppState::with_strategy(strategy, AppConfig::default());
        TestServer::new(create_router(state)).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let server = server(Arc::new(FakeStrategy::default()));

        let response = server.get("/health").await;

        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["provider"], "fake");
    }

    #[tokio::test]
    async fn test_create_checkout_session() {
        let strategy = Arc::new(FakeStrategy::default());
        let server = server(strategy.clone());

        let response = server
            .post("/checkout/create-checkout-session")
            .json(&json!({
                "cartItems": [
                    { "name": "Mug", "price": 8.5, "quantity": 2 },
                    { "name": "T-Shirt", "price": 19.99, "quantity": 1 }
                ]
            }))
            .await;

        response.assert_status_ok();
        let body: CreateCheckoutResponse = response.json();
        assert_eq!(body.id, "cs_test_1");
        assert_eq!(body.url, "https://checkout.example.com/cs_test_1");

        let seen = strategy.seen.lock().unwrap();
        let (items, success_url, cancel_url) = &seen[0];
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].unit_amount_cents, 1999);
        assert_eq!(success_url, "http://localhost:4200/home/cart?status=success");
        assert_eq!(cancel_url, "http://localhost:4200/home/cart?status=cancel");
    }

    #[tokio::test]
    async fn test_empty_cart_is_bad_request() {
        let strategy = Arc::new(FakeStrategy::default());
        let server = server(strategy.clone());

        let response = server
            .post("/checkout/create-checkout-session")
            .json(&json!({ "cartItems": [] }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert!(strategy.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_price_is_bad_request() {
        let server = server(Arc::new(FakeStrategy::default()));

        let response = server
            .post("/checkout/create-checkout-session")
            .json(&json!({ "cartItems": [{ "name": "Mug", "price": -3, "quantity": 1 }] }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_provider_failure_is_bad_gateway() {
        let server = server(Arc::new(FakeStrategy {
            fail: true,
            ..Default::default()
        }));

        let response = server
            .post("/checkout/create-checkout-session")
            .json(&json!({ "cartItems": [{ "name": "Mug", "price": 8.5, "quantity": 1 }] }))
            .await;

        response.assert_status(StatusCode::BAD_GATEWAY);
        let body: ErrorResponse = response.json();
        assert!(body.error.contains("No such price"));
    }
}
