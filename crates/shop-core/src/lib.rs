//! # shop-core
//!
//! Session and checkout orchestration for the estore client.
//!
//! This crate provides:
//! - `SessionManager` for the authenticated session, its persistence and
//!   auto-logout timer
//! - `PendingCheckout`, the single-slot handoff that carries the delivery form
//!   across the payment redirect
//! - `CheckoutInitiator`, `RedirectResolver` and `OrderFinalizer` for the
//!   checkout flow, and `Storefront` wiring them together
//! - `PaymentStrategy`, `CheckoutGateway`, `AuthBackend` and `OrderBackend`
//!   traits for the outside world
//! - `ShopError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use shop_core::{Arrival, Storefront, StorefrontDeps};
//!
//! let shop = Storefront::new(deps);
//! shop.start();
//!
//! // Before leaving for the provider
//! shop.login("ada@example.com", "secret").await?;
//! shop.checkout().await;
//!
//! // In a fresh process, after the provider redirects back
//! shop.start();
//! shop.arrive(&Arrival::from_query("status=success")).await;
//! ```

pub mod alert;
pub mod backend;
pub mod checkout;
pub mod clock;
pub mod error;
pub mod finalize;
pub mod form;
pub mod order;
pub mod pending;
pub mod redirect;
pub mod session;
pub mod storage;
pub mod storefront;
pub mod strategy;
pub mod user;
pub mod view;

#[cfg(test)]
mod testing;

// Re-exports for convenience
pub use alert::{messages, Alert, AlertKind};
pub use backend::{AuthBackend, OrderBackend, SharedAuthBackend, SharedOrderBackend};
pub use checkout::CheckoutInitiator;
pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use error::{ShopError, ShopResult};
pub use finalize::OrderFinalizer;
pub use form::{DeliveryForm, DeliveryFormPatch};
pub use order::{
    dollars_to_cents, format_cents, Cart, CartItem, CheckoutSession, DeliveryAddress, LineItem,
    OrderRequest,
};
pub use pending::PendingCheckout;
pub use redirect::{Arrival, RedirectOutcome, RedirectResolver, ResolverState};
pub use session::{Session, SessionManager};
pub use storage::{keys, FileStore, KeyValueStore, MemoryStore, SharedStore};
pub use storefront::{Storefront, StorefrontDeps};
pub use strategy::{
    BoxedPaymentStrategy, CheckoutGateway, DirectCheckout, Navigator, PaymentStrategy, ReturnUrls,
};
pub use user::{LoginToken, NewUser, UserProfile, DEFAULT_TOKEN_TTL_SECS};
pub use view::CheckoutView;
