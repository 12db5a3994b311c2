//! # shop-client
//!
//! Production wiring for the storefront core: `reqwest` backends, a console
//! navigator and the client configuration used by the `shop` binary.

pub mod config;
pub mod http;
pub mod navigator;

pub use config::ClientConfig;
pub use http::{HttpBackend, HttpCheckoutGateway};
pub use navigator::ConsoleNavigator;

use shop_core::{
    CheckoutView, FileStore, PendingCheckout, SessionManager, SharedStore, ShopResult,
    Storefront, StorefrontDeps, SystemClock,
};
use std::sync::Arc;

/// Build a storefront over the file store and HTTP backends named in `config`
pub fn build_storefront(config: &ClientConfig) -> ShopResult<Storefront> {
    let store: SharedStore = Arc::new(FileStore::open(&config.state_file));
    let backend = Arc::new(HttpBackend::from_config(config)?);
    let gateway = Arc::new(HttpCheckoutGateway::from_config(config)?);

    Ok(Storefront::new(StorefrontDeps {
        session: SessionManager::new(store.clone(), Arc::new(SystemClock)),
        pending: PendingCheckout::new(store),
        view: CheckoutView::new(),
        auth: backend.clone(),
        orders: backend,
        gateway,
        navigator: Arc::new(ConsoleNavigator),
    }))
}
