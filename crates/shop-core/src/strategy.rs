//! # Payment Strategy Traits
//!
//! Seams between the checkout flow and the outside world.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │ CheckoutInitiator                                           │
//! │   ├── CheckoutGateway::create_checkout_session()            │
//! │   └── Navigator::navigate(checkout_url)                     │
//! └─────────────────────────────────────────────────────────────┘
//!                  ▲                               ▲
//!      ┌───────────┴──────────┐          ┌─────────┴─────────┐
//!      │ DirectCheckout       │          │ HTTP gateway      │
//!      │ (PaymentStrategy +   │          │ (shop-client,     │
//!      │  ReturnUrls)         │          │  via shop-api)    │
//!      └──────────────────────┘          └───────────────────┘
//! ```

use crate::error::{ShopError, ShopResult};
use crate::order::{CheckoutSession, LineItem};
use async_trait::async_trait;
use std::sync::Arc;

/// Payment provider implementation (Stripe, ...).
#[async_trait]
pub trait PaymentStrategy: Send + Sync {
    /// Create a hosted checkout session.
    ///
    /// # Arguments
    /// * `line_items` - One entry per cart line
    /// * `success_url` - Where the provider sends the customer after paying
    /// * `cancel_url` - Where the provider sends the customer on cancel
    async fn create_checkout(
        &self,
        line_items: &[LineItem],
        success_url: &str,
        cancel_url: &str,
    ) -> ShopResult<CheckoutSession>;

    /// Get the provider name (for logging).
    fn provider_name(&self) -> &'static str;
}

/// Type alias for a boxed payment strategy (dynamic dispatch)
pub type BoxedPaymentStrategy = Arc<dyn PaymentStrategy>;

/// What the checkout initiator talks to: something that turns line items
/// into a hosted checkout session with the return targets already decided.
#[async_trait]
pub trait CheckoutGateway: Send + Sync {
    async fn create_checkout_session(&self, line_items: &[LineItem])
        -> ShopResult<CheckoutSession>;
}

/// Hands control to the provider's hosted page. This is the point of no
/// return for the current process.
pub trait Navigator: Send + Sync {
    fn navigate(&self, url: &str) -> ShopResult<()>;
}

/// Return targets for the redirect-based payment flow
#[derive(Debug, Clone)]
pub struct ReturnUrls {
    /// Base URL of the storefront (e.g., "http://localhost:4200")
    pub base_url: String,
    /// Page the provider returns to (e.g., "/home/cart")
    pub return_path: String,
}

impl ReturnUrls {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            return_path: "/home/cart".to_string(),
        }
    }

    pub fn with_return_path(mut self, path: impl Into<String>) -> Self {
        self.return_path = path.into();
        self
    }

    pub fn success_url(&self) -> String {
        format!("{}{}?status=success", self.base_url, self.return_path)
    }

    pub fn cancel_url(&self) -> String {
        format!("{}{}?status=cancel", self.base_url, self.return_path)
    }
}

impl Default for ReturnUrls {
    fn default() -> Self {
        Self::new("http://localhost:4200")
    }
}

/// Gateway that calls a payment strategy in-process with fixed return URLs
pub struct DirectCheckout {
    strategy: BoxedPaymentStrategy,
    urls: ReturnUrls,
}

impl DirectCheckout {
    pub fn new(strategy: BoxedPaymentStrategy, urls: ReturnUrls) -> Self {
        Self { strategy, urls }
    }
}

#[async_trait]
impl CheckoutGateway for DirectCheckout {
    async fn create_checkout_session(
        &self,
        line_items: &[LineItem],
    ) -> ShopResult<CheckoutSession> {
        self.strategy
            .create_checkout(line_items, &self.urls.success_url(), &self.urls.cancel_url())
            .await
            .map_err(|e| match e {
                ShopError::Network(message) => ShopError::ProviderError {
                    provider: self.strategy.provider_name().to_string(),
                    message,
                },
                other => other,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct EchoStrategy {
        seen: Mutex<Vec<(usize, String, String)>>,
    }

    #[async_trait]
    impl PaymentStrategy for EchoStrategy {
        async fn create_checkout(
            &self,
            line_items: &[LineItem],
            success_url: &str,
            cancel_url: &str,
        ) -> ShopResult<CheckoutSession> {
            self.seen.lock().unwrap().push((
                line_items.len(),
                success_url.to_string(),
                cancel_url.to_string(),
            ));
            if line_items.is_empty() {
                return Err(ShopError::Network("connection refused".into()));
            }
            Ok(CheckoutSession::new("cs_1", "echo", "https://pay.example/cs_1"))
        }

        fn provider_name(&self) -> &'static str {
            "echo"
        }
    }

    #[test]
    fn test_return_urls() {
        let urls = ReturnUrls::new("https://shop.example/");

        assert_eq!(urls.success_url(), "https://shop.example/home/cart?status=success");
        assert_eq!(urls.cancel_url(), "https://shop.example/home/cart?status=cancel");
    }

    #[tokio::test]
    async fn test_direct_checkout_passes_return_urls() {
        let strategy = Arc::new(EchoStrategy {
            seen: Mutex::new(Vec::new()),
        });
        let gateway = DirectCheckout::new(strategy.clone(), ReturnUrls::default());

        let item = LineItem {
            name: "Mug".into(),
            unit_amount_cents: 850,
            quantity: 1,
        };
        let session = gateway.create_checkout_session(&[item]).await.unwrap();
        assert_eq!(session.checkout_url, "https://pay.example/cs_1");

        let seen = strategy.seen.lock().unwrap();
        assert_eq!(seen[0].1, "http://localhost:4200/home/cart?status=success");
        assert_eq!(seen[0].2, "http://localhost:4200/home/cart?status=cancel");
    }

    #[tokio::test]
    async fn test_direct_checkout_tags_transport_errors_with_provider() {
        let strategy = Arc::new(EchoStrategy {
            seen: Mutex::new(Vec::new()),
        });
        let gateway = DirectCheckout::new(strategy, ReturnUrls::default());

        let err = gateway.create_checkout_session(&[]).await.unwrap_err();
        assert!(matches!(err, ShopError::ProviderError { ref provider, .. } if provider == "echo"));
    }
}
