//! # shop-stripe
//!
//! Stripe payment strategy for the estore checkout server.
//!
//! **StripeCheckoutStrategy** creates Checkout Sessions on Stripe's hosted
//! page: one-time card payments, USD line items built from the cart.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use shop_stripe::StripeCheckoutStrategy;
//! use shop_core::PaymentStrategy;
//!
//! // Create strategy from environment
//! let strategy = StripeCheckoutStrategy::from_env()?;
//!
//! // Create checkout session
//! let session = strategy.create_checkout(
//!     &cart.line_items(),
//!     "http://localhost:4200/home/cart?status=success",
//!     "http://localhost:4200/home/cart?status=cancel",
//! ).await?;
//!
//! // Redirect the customer to session.checkout_url
//! ```

pub mod checkout;
pub mod config;

// Re-exports
pub use checkout::StripeCheckoutStrategy;
pub use config::StripeConfig;
