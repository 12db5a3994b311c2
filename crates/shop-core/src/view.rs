//! # Checkout View State
//!
//! The observable state of the cart page: cart, delivery form, the current
//! alert and whether checkout is disabled. Each piece sits in a watch channel
//! so a renderer can subscribe late and still see the current value.

use crate::alert::Alert;
use crate::form::{DeliveryForm, DeliveryFormPatch};
use crate::order::{Cart, CartItem};
use crate::user::UserProfile;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Shared handle to the cart page state. Clones share state.
#[derive(Clone)]
pub struct CheckoutView {
    inner: Arc<ViewState>,
}

struct ViewState {
    cart: watch::Sender<Cart>,
    form: watch::Sender<DeliveryForm>,
    alert: watch::Sender<Option<Alert>>,
    checkout_disabled: watch::Sender<bool>,
    /// Set while a resumed checkout owns the form contents
    form_held: AtomicBool,
}

impl CheckoutView {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ViewState {
                cart: watch::channel(Cart::default()).0,
                form: watch::channel(DeliveryForm::default()).0,
                alert: watch::channel(None).0,
                checkout_disabled: watch::channel(false).0,
                form_held: AtomicBool::new(false),
            }),
        }
    }

    // -- cart ----------------------------------------------------------------

    pub fn cart(&self) -> Cart {
        self.inner.cart.borrow().clone()
    }

    /// Add to the cart. A new item re-enables checkout after a completed order.
    pub fn add_item(&self, item: CartItem) {
        self.inner.cart.send_modify(|cart| cart.add(item));
        self.inner.checkout_disabled.send_replace(false);
    }

    pub fn clear_cart(&self) {
        self.inner.cart.send_modify(Cart::clear);
    }

    pub fn subscribe_cart(&self) -> watch::Receiver<Cart> {
        self.inner.cart.subscribe()
    }

    // -- form ----------------------------------------------------------------

    pub fn form(&self) -> DeliveryForm {
        self.inner.form.borrow().clone()
    }

    pub fn set_form(&self, form: DeliveryForm) {
        self.inner.form.send_replace(form);
    }

    pub fn patch_form(&self, patch: &DeliveryFormPatch) {
        self.inner.form.send_modify(|form| form.apply(patch));
    }

    /// Replace the form with a fresh one derived from `user`
    pub fn reset_form(&self, user: &UserProfile) {
        self.inner.form.send_replace(DeliveryForm::from_user(user));
    }

    /// Re-derive the form from the session user, unless a resumed checkout
    /// currently holds it.
    pub fn prefill_from_user(&self, user: &UserProfile) {
        if self.is_form_held() {
            debug!("Form held by resumed checkout, skipping prefill");
            return;
        }
        self.reset_form(user);
    }

    pub fn hold_form(&self) {
        self.inner.form_held.store(true, Ordering::SeqCst);
    }

    pub fn release_form(&self) {
        self.inner.form_held.store(false, Ordering::SeqCst);
    }

    pub fn is_form_held(&self) -> bool {
        self.inner.form_held.load(Ordering::SeqCst)
    }

    pub fn subscribe_form(&self) -> watch::Receiver<DeliveryForm> {
        self.inner.form.subscribe()
    }

    // -- alert ---------------------------------------------------------------

    /// Show `alert`, replacing whatever was shown before
    pub fn raise(&self, alert: Alert) {
        if alert.is_error() {
            warn!(alert = %alert.message, "Alert raised");
        } else {
            info!(alert = %alert.message, "Alert raised");
        }
        self.inner.alert.send_replace(Some(alert));
    }

    pub fn alert(&self) -> Option<Alert> {
        self.inner.alert.borrow().clone()
    }

    pub fn dismiss_alert(&self) {
        self.inner.alert.send_replace(None);
    }

    pub fn subscribe_alert(&self) -> watch::Receiver<Option<Alert>> {
        self.inner.alert.subscribe()
    }

    // -- checkout button -----------------------------------------------------

    pub fn checkout_disabled(&self) -> bool {
        *self.inner.checkout_disabled.borrow()
    }

    pub fn disable_checkout(&self) {
        self.inner.checkout_disabled.send_replace(true);
    }
}

impl Default for CheckoutView {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::messages;
    use crate::testing::ada;

    #[test]
    fn test_newest_alert_wins() {
        let view = CheckoutView::new();
        view.raise(Alert::error(messages::PAYMENT_CANCELLED));
        view.raise(Alert::success(messages::ORDER_PLACED));

        assert_eq!(view.alert(), Some(Alert::success(messages::ORDER_PLACED)));
    }

    #[test]
    fn test_held_form_is_not_prefilled() {
        let view = CheckoutView::new();
        view.prefill_from_user(&ada());
        assert_eq!(view.form().name, "Ada Lovelace");

        view.set_form(DeliveryForm {
            city: "Restored".into(),
            ..Default::default()
        });
        view.hold_form();
        view.prefill_from_user(&UserProfile::default());
        assert_eq!(view.form().city, "Restored");

        view.release_form();
        view.prefill_from_user(&UserProfile::default());
        assert_eq!(view.form(), DeliveryForm::default());
    }

    #[tokio::test]
    async fn test_late_subscribers_see_current_state() {
        let view = CheckoutView::new();
        view.add_item(CartItem::new("mug", "Mug", 850, 1));
        view.raise(Alert::error(messages::PAYMENT_CANCELLED));

        let mut cart = view.subscribe_cart();
        let mut form = view.subscribe_form();
        let alert = view.subscribe_alert();
        assert_eq!(cart.borrow().item_count(), 1);
        assert_eq!(
            *alert.borrow(),
            Some(Alert::error(messages::PAYMENT_CANCELLED))
        );

        view.clear_cart();
        view.prefill_from_user(&ada());
        cart.changed().await.unwrap();
        form.changed().await.unwrap();
        assert!(cart.borrow_and_update().is_empty());
        assert_eq!(form.borrow_and_update().name, "Ada Lovelace");
    }

    #[test]
    fn test_adding_items_reenables_checkout() {
        let view = CheckoutView::new();
        view.disable_checkout();
        assert!(view.checkout_disabled());

        view.add_item(CartItem::new("mug", "Mug", 850, 1));
        assert!(!view.checkout_disabled());
        assert_eq!(view.cart().item_count(), 1);
    }
}
