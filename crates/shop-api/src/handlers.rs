//! # Request Handlers
//!
//! Axum request handlers for the checkout-session API.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use shop_core::{dollars_to_cents, LineItem, ShopError};
use tracing::{error, info, instrument};

// =============================================================================
// Request/Response Types
// =============================================================================

/// Create checkout session request, as posted by the storefront cart page
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckoutRequest {
    #[serde(default)]
    pub cart_items: Vec<CartItemRequest>,
}

/// Cart entry in a checkout request. `price` is in dollars.
#[derive(Debug, Deserialize)]
pub struct CartItemRequest {
    pub name: String,
    pub price: f64,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

impl CartItemRequest {
    fn to_line_item(&self) -> Result<LineItem, ShopError> {
        if self.name.trim().is_empty() {
            return Err(ShopError::Validation("Cart item has no name".to_string()));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(ShopError::Validation(format!(
                "Invalid price for {}: {}",
                self.name, self.price
            )));
        }
        if self.quantity == 0 {
            return Err(ShopError::Validation(format!(
                "Invalid quantity for {}: 0",
                self.name
            )));
        }
        Ok(LineItem {
            name: self.name.clone(),
            unit_amount_cents: dollars_to_cents(self.price),
            quantity: self.quantity,
        })
    }
}

/// Create checkout session response
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateCheckoutResponse {
    /// Provider session ID
    pub id: String,
    /// Hosted checkout URL (redirect the customer here)
    pub url: String,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: u16) -> Self {
        Self {
            error: error.into(),
            code,
        }
    }
}

fn shop_error_to_response(err: ShopError) -> (StatusCode, Json<ErrorResponse>) {
    let code = err.status_code();
    let response = ErrorResponse::new(err.to_string(), code);
    (
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(response),
    )
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "shop-api",
        "provider": state.strategy.provider_name(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Create a hosted checkout session for the posted cart
#[instrument(skip(state, request), fields(items = request.cart_items.len()))]
pub async fn create_checkout_session(
    State(state): State<AppState>,
    Json(request): Json<CreateCheckoutRequest>,
) -> Result<Json<CreateCheckoutResponse>, (StatusCode, Json<ErrorResponse>)> {
    if request.cart_items.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("No items in checkout request", 400)),
        ));
    }

    let line_items = request
        .cart_items
        .iter()
        .map(CartItemRequest::to_line_item)
        .collect::<Result<Vec<_>, _>>()
        .map_err(shop_error_to_response)?;

    let success_url = state.urls.success_url();
    let cancel_url = state.urls.cancel_url();

    info!(
        "Creating checkout: {} items, total={}, success_url={}",
        line_items.len(),
        shop_core::format_cents(
            line_items
                .iter()
                .map(|item| item.unit_amount_cents * i64::from(item.quantity))
                .sum()
        ),
        success_url
    );

    let session = state
        .strategy
        .create_checkout(&line_items, &success_url, &cancel_url)
        .await
        .map_err(|e| {
            error!("Failed to create checkout: {}", e);
            shop_error_to_response(e)
        })?;

    info!("Created checkout session: {}", session.session_id);

    Ok(Json(CreateCheckoutResponse {
        id: session.session_id,
        url: session.checkout_url,
    }))
}
