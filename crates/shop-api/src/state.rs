//! # Application State
//!
//! Shared state for the Axum application: the payment strategy, the
//! storefront return URLs and the server configuration.

use shop_core::{BoxedPaymentStrategy, ReturnUrls, ShopError, ShopResult};
use shop_stripe::StripeCheckoutStrategy;
use std::net::SocketAddr;
use std::sync::Arc;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Storefront origin the provider returns the customer to
    pub storefront_url: String,
    /// Path of the cart page on the storefront
    pub return_path: String,
    /// Environment (development, staging, production)
    pub environment: String,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(5001),
            storefront_url: lookup("STOREFRONT_URL")
                .unwrap_or_else(|| "http://localhost:4200".to_string()),
            return_path: lookup("RETURN_PATH").unwrap_or_else(|| "/home/cart".to_string()),
            environment: lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> ShopResult<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ShopError::Configuration(format!("invalid bind address: {}", e)))
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn return_urls(&self) -> ReturnUrls {
        ReturnUrls::new(&self.storefront_url).with_return_path(&self.return_path)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Payment strategy
    pub strategy: BoxedPaymentStrategy,
    /// Where the provider sends the customer back to
    pub urls: ReturnUrls,
    /// Application config
    pub config: AppConfig,
}

impl AppState {
    /// Create a new AppState with the Stripe strategy
    pub fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env();
        let stripe_strategy = StripeCheckoutStrategy::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to initialize Stripe: {}", e))?;

        Ok(Self::with_strategy(Arc::new(stripe_strategy), config))
    }

    pub fn with_strategy(strategy: BoxedPaymentStrategy, config: AppConfig) -> Self {
        Self {
            strategy,
            urls: config.return_urls(),
            config,
        }
    }
}
