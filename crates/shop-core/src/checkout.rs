//! # Checkout Initiator
//!
//! Persists the delivery form into the pending slot, asks the provider for a
//! hosted checkout session and navigates to it.
//!
//! Everything needed to resume must be in the pending slot before navigation:
//! the current process does not survive the trip to the provider.

use crate::alert::{messages, Alert};
use crate::error::ShopError;
use crate::order::CheckoutSession;
use crate::pending::PendingCheckout;
use crate::session::SessionManager;
use crate::strategy::{CheckoutGateway, Navigator};
use crate::view::CheckoutView;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

pub struct CheckoutInitiator {
    session: SessionManager,
    pending: PendingCheckout,
    gateway: Arc<dyn CheckoutGateway>,
    navigator: Arc<dyn Navigator>,
}

impl CheckoutInitiator {
    pub fn new(
        session: SessionManager,
        pending: PendingCheckout,
        gateway: Arc<dyn CheckoutGateway>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            session,
            pending,
            gateway,
            navigator,
        }
    }

    /// Start a checkout for the view's cart and form.
    ///
    /// Returns the provider session once navigation has been triggered.
    /// Every failure is reported through the view's alert instead.
    #[instrument(skip(self, view))]
    pub async fn checkout(&self, view: &CheckoutView) -> Option<CheckoutSession> {
        if view.checkout_disabled() {
            debug!("Checkout disabled for a completed order");
            return None;
        }

        if !self.session.is_authenticated() {
            view.raise(Alert::error(messages::LOGIN_TO_PAY));
            return None;
        }

        let cart = view.cart();
        let form = view.form();
        if cart.is_empty() || !form.is_valid() {
            debug!(
                "Checkout blocked: empty_cart={}, missing={:?}",
                cart.is_empty(),
                form.missing_fields()
            );
            view.raise(Alert::error(messages::COMPLETE_ADDRESS));
            return None;
        }

        if let Err(e) = self.pending.put(&form) {
            error!("Failed to persist pending checkout: {}", e);
            view.raise(Alert::error(messages::SAVE_ADDRESS_FAILED));
            return None;
        }

        let line_items = cart.line_items();
        info!("Creating checkout session for {} line items", line_items.len());

        let session = match self.gateway.create_checkout_session(&line_items).await {
            Ok(session) => session,
            Err(e) => {
                error!(
                    retryable = e.is_retryable(),
                    "Failed to create checkout session: {}",
                    e
                );
                view.raise(Alert::error(payment_start_message(&e)));
                return None;
            }
        };

        if let Err(e) = self.navigator.navigate(&session.checkout_url) {
            error!("Failed to navigate to provider: {}", e);
            view.raise(Alert::error(messages::PAYMENT_START_FAILED));
            return None;
        }

        info!(
            "Redirected to {} checkout session {}",
            session.provider, session.session_id
        );
        Some(session)
    }
}

fn payment_start_message(err: &ShopError) -> String {
    match err {
        ShopError::Rejected {
            message: Some(message),
            ..
        } => message.clone(),
        _ => messages::PAYMENT_START_FAILED.to_string(),
    }
}
