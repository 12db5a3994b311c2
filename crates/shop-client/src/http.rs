//! # HTTP Backends
//!
//! `reqwest` implementations of the storefront seams:
//!
//! - [`HttpBackend`]: `POST /users/login`, `POST /users/signup` and
//!   `POST /orders` on the storefront backend
//! - [`HttpCheckoutGateway`]: `POST /checkout/create-checkout-session` on the
//!   checkout-session server

use crate::config::ClientConfig;
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use shop_core::{
    AuthBackend, CheckoutGateway, CheckoutSession, DeliveryAddress, LineItem,
    LoginToken, NewUser, OrderBackend, OrderRequest, ShopError, ShopResult,
};
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Message the order backend uses for a rejected token
const AUTHORIZATION_FAILED: &str = shop_core::messages::AUTHORIZATION_FAILED;

/// Error body returned by the backends: `{message}` or `{error}`
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        self.message.or(self.error).filter(|m| !m.is_empty())
    }
}

fn build_client(timeout: Duration) -> ShopResult<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ShopError::Configuration(format!("failed to build HTTP client: {}", e)))
}

fn join(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

async fn error_message(response: Response) -> Option<String> {
    let body = response.text().await.unwrap_or_default();
    serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(ErrorBody::into_message)
}

fn transport(err: reqwest::Error) -> ShopError {
    ShopError::Network(err.to_string())
}

/// Client for the storefront backend (users and orders)
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    api_url: String,
}

impl HttpBackend {
    pub fn new(api_url: impl Into<String>, timeout: Duration) -> ShopResult<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            api_url: api_url.into(),
        })
    }

    pub fn from_config(config: &ClientConfig) -> ShopResult<Self> {
        Self::new(&config.api_url, config.timeout())
    }
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[async_trait]
impl AuthBackend for HttpBackend {
    #[instrument(skip(self, password))]
    async fn login(&self, email: &str, password: &str) -> ShopResult<LoginToken> {
        let response = self
            .client
            .post(join(&self.api_url, "/users/login"))
            .json(&LoginRequest { email, password })
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            let message = error_message(response).await;
            debug!("Login rejected: status={}, message={:?}", status, message);
            return Err(match status {
                StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::NOT_FOUND => {
                    ShopError::Auth(message.unwrap_or_else(|| "invalid credentials".to_string()))
                }
                _ => ShopError::Rejected {
                    status: status.as_u16(),
                    message,
                },
            });
        }

        response
            .json::<LoginToken>()
            .await
            .map_err(|e| ShopError::Serialization(format!("invalid login response: {}", e)))
    }

    #[instrument(skip(self, user), fields(email = %user.profile.email))]
    async fn signup(&self, user: &NewUser) -> ShopResult<()> {
        let response = self
            .client
            .post(join(&self.api_url, "/users/signup"))
            .json(user)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        Err(ShopError::Rejected {
            status: status.as_u16(),
            message: error_message(response).await,
        })
    }
}

#[async_trait]
impl OrderBackend for HttpBackend {
    #[instrument(skip(self, token, delivery_address))]
    async fn save_order(
        &self,
        token: &str,
        delivery_address: &DeliveryAddress,
        email: &str,
    ) -> ShopResult<()> {
        let body = OrderRequest {
            delivery_address: delivery_address.clone(),
            email: email.to_string(),
        };
        let response = self
            .client
            .post(join(&self.api_url, "/orders"))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let message = error_message(response).await;
        warn!("Order rejected: status={}, message={:?}", status, message);
        if status == StatusCode::UNAUTHORIZED || message.as_deref() == Some(AUTHORIZATION_FAILED) {
            return Err(ShopError::Auth(
                message.unwrap_or_else(|| AUTHORIZATION_FAILED.to_string()),
            ));
        }
        Err(ShopError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

/// Cart entry as the checkout-session server expects it (price in dollars)
#[derive(Debug, Serialize)]
struct CartItemBody<'a> {
    name: &'a str,
    price: f64,
    quantity: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckoutRequest<'a> {
    cart_items: Vec<CartItemBody<'a>>,
}

#[derive(Debug, Deserialize)]
struct CheckoutResponse {
    id: String,
    url: String,
}

/// Checkout gateway backed by the checkout-session server
#[derive(Clone)]
pub struct HttpCheckoutGateway {
    client: Client,
    checkout_url: String,
}

impl HttpCheckoutGateway {
    pub const PROVIDER: &'static str = "shop-api";

    pub fn new(checkout_url: impl Into<String>, timeout: Duration) -> ShopResult<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            checkout_url: checkout_url.into(),
        })
    }

    pub fn from_config(config: &ClientConfig) -> ShopResult<Self> {
        Self::new(config.checkout_api_url(), config.timeout())
    }
}

#[async_trait]
impl CheckoutGateway for HttpCheckoutGateway {
    #[instrument(skip(self, line_items), fields(items = line_items.len()))]
    async fn create_checkout_session(
        &self,
        line_items: &[LineItem],
    ) -> ShopResult<CheckoutSession> {
        let body = CheckoutRequest {
            cart_items: line_items
                .iter()
                .map(|item| CartItemBody {
                    name: &item.name,
                    price: item.unit_amount_cents as f64 / 100.0,
                    quantity: item.quantity,
                })
                .collect(),
        };
        let response = self
            .client
            .post(join(&self.checkout_url, "/checkout/create-checkout-session"))
            .json(&body)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            let message = error_message(response).await;
            return Err(ShopError::ProviderError {
                provider: Self::PROVIDER.to_string(),
                message: message.unwrap_or_else(|| format!("HTTP {}", status)),
            });
        }

        let session: CheckoutResponse = response
            .json()
            .await
            .map_err(|e| ShopError::Serialization(format!("invalid checkout response: {}", e)))?;
        Ok(CheckoutSession::new(session.id, Self::PROVIDER, session.url))
    }
}
