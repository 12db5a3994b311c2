//! # Order Finalizer
//!
//! Submits the order for the current delivery form and session user, exactly
//! once, then clears the transient checkout state.

use crate::alert::{messages, Alert};
use crate::backend::SharedOrderBackend;
use crate::error::ShopError;
use crate::pending::PendingCheckout;
use crate::session::SessionManager;
use crate::view::CheckoutView;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, info, instrument, warn};

pub struct OrderFinalizer {
    session: SessionManager,
    orders: SharedOrderBackend,
    pending: PendingCheckout,
    in_flight: AtomicBool,
}

impl OrderFinalizer {
    pub fn new(session: SessionManager, orders: SharedOrderBackend, pending: PendingCheckout) -> Self {
        Self {
            session,
            orders,
            pending,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Place the order. Returns true when the backend accepted it.
    ///
    /// A completed order disables checkout, and a submission already in
    /// flight makes concurrent calls no-ops, so residual UI state can not
    /// submit twice.
    #[instrument(skip(self, view))]
    pub async fn finalize(&self, view: &CheckoutView) -> bool {
        if view.checkout_disabled() {
            debug!("Order already placed, ignoring");
            return false;
        }

        if !self.session.is_authenticated() {
            view.raise(Alert::error(messages::LOGIN_TO_REGISTER));
            return false;
        }

        let form = view.form();
        if let Err(e) = form.validate() {
            warn!("Refusing to place order: {}", e);
            view.raise(Alert::error(messages::COMPLETE_FIELDS));
            return false;
        }

        let user = self.session.current_user();
        if !user.has_email() {
            view.raise(Alert::error(messages::EMAIL_MISSING));
            return false;
        }

        let Some(token) = self.session.token() else {
            view.raise(Alert::error(messages::LOGIN_TO_REGISTER));
            return false;
        };

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Order submission already in flight");
            return false;
        }

        let address = form.to_delivery_address();
        let result = self.orders.save_order(&token, &address, &user.email).await;
        self.in_flight.store(false, Ordering::SeqCst);

        match result {
            Ok(()) => {
                info!("Order placed for {}", user.email);
                view.clear_cart();
                view.reset_form(&self.session.current_user());
                view.disable_checkout();
                if let Err(e) = self.pending.clear() {
                    warn!("Failed to clear pending checkout: {}", e);
                }
                view.raise(Alert::success(messages::ORDER_PLACED));
                true
            }
            Err(e) => {
                error!("Order placement failed: {}", e);
                view.raise(Alert::error(failure_message(&e)));
                false
            }
        }
    }
}

fn failure_message(err: &ShopError) -> String {
    if err.is_auth() || err.upstream_message() == Some(messages::AUTHORIZATION_FAILED) {
        return messages::LOGIN_TO_REGISTER.to_string();
    }
    match err.upstream_message() {
        Some(message) if !message.is_empty() => message.to_string(),
        _ => messages::UNEXPECTED.to_string(),
    }
}
