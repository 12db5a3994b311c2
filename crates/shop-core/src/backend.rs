//! Storefront backend seams: authentication and order placement.

use crate::error::ShopResult;
use crate::order::DeliveryAddress;
use crate::user::{LoginToken, NewUser};
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Exchange credentials for a token, its ttl and the user's profile.
    async fn login(&self, email: &str, password: &str) -> ShopResult<LoginToken>;

    async fn signup(&self, user: &NewUser) -> ShopResult<()>;
}

#[async_trait]
pub trait OrderBackend: Send + Sync {
    /// Place an order on behalf of the session holding `token`.
    ///
    /// A rejected token must come back as [`ShopError::Auth`](crate::ShopError::Auth);
    /// other failures reported by the server as [`ShopError::Rejected`](crate::ShopError::Rejected)
    /// carrying the server's message.
    async fn save_order(
        &self,
        token: &str,
        delivery_address: &DeliveryAddress,
        email: &str,
    ) -> ShopResult<()>;
}

pub type SharedAuthBackend = Arc<dyn AuthBackend>;
pub type SharedOrderBackend = Arc<dyn OrderBackend>;
