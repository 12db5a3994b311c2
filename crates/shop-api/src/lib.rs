//! # shop-api
//!
//! Checkout-session server for the estore storefront.
//!
//! The storefront posts its cart here; the server creates a hosted checkout
//! session with the payment provider and returns where to send the customer.
//! The provider later returns the customer to
//! `<STOREFRONT_URL>/home/cart?status=success|cancel`.
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | POST | `/checkout/create-checkout-session` | Create checkout session |

pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::{AppConfig, AppState};
