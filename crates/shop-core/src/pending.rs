//! # Pending Checkout Slot
//!
//! A durable queue of size one carrying the delivery form across the payment
//! redirect. The checkout initiator writes it right before navigating away,
//! the redirect resolver takes it once on return, and the order finalizer
//! clears it when an order has actually been placed.

use crate::error::{ShopError, ShopResult};
use crate::form::{DeliveryForm, DeliveryFormPatch};
use crate::storage::{keys, SharedStore};
use tracing::{debug, warn};

#[derive(Clone)]
pub struct PendingCheckout {
    store: SharedStore,
}

impl PendingCheckout {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Write the form into the slot, replacing any stale payload
    pub fn put(&self, form: &DeliveryForm) -> ShopResult<()> {
        let payload = serde_json::to_string(form)?;
        self.store.set(keys::PENDING_CHECKOUT, &payload)?;
        debug!("Pending checkout saved");
        Ok(())
    }

    /// Consume the payload.
    ///
    /// The slot is emptied before the contents are parsed, so a payload is
    /// handed out at most once. Malformed content is discarded and reported
    /// as a persistence error.
    pub fn take(&self) -> ShopResult<Option<DeliveryFormPatch>> {
        let raw = match self.store.get(keys::PENDING_CHECKOUT)? {
            Some(raw) => raw,
            None => return Ok(None),
        };
        self.store.remove(keys::PENDING_CHECKOUT)?;

        serde_json::from_str::<DeliveryFormPatch>(&raw)
            .map(Some)
            .map_err(|e| {
                warn!("Discarding unreadable pending checkout: {}", e);
                ShopError::Persistence(format!("pending checkout is unreadable: {}", e))
            })
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.store.get(keys::PENDING_CHECKOUT), Ok(Some(_)))
    }

    pub fn clear(&self) -> ShopResult<()> {
        self.store.remove(keys::PENDING_CHECKOUT)
    }
}
