//! # Storefront
//!
//! Wires the session manager, cart page state and the checkout components
//! together behind one cloneable handle. Front ends (the CLI, tests) drive the
//! whole flow through this type.

use crate::alert::{messages, Alert};
use crate::backend::{SharedAuthBackend, SharedOrderBackend};
use crate::checkout::CheckoutInitiator;
use crate::error::{ShopError, ShopResult};
use crate::finalize::OrderFinalizer;
use crate::form::DeliveryForm;
use crate::order::{CartItem, CheckoutSession};
use crate::pending::PendingCheckout;
use crate::redirect::{Arrival, RedirectResolver, ResolverState};
use crate::session::SessionManager;
use crate::strategy::{CheckoutGateway, Navigator};
use crate::user::{NewUser, UserProfile};
use crate::view::CheckoutView;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, instrument, warn};

/// Everything a [`Storefront`] is built from
pub struct StorefrontDeps {
    pub session: SessionManager,
    pub pending: PendingCheckout,
    pub view: CheckoutView,
    pub auth: SharedAuthBackend,
    pub orders: SharedOrderBackend,
    pub gateway: Arc<dyn CheckoutGateway>,
    pub navigator: Arc<dyn Navigator>,
}

#[derive(Clone)]
pub struct Storefront {
    session: SessionManager,
    view: CheckoutView,
    auth: SharedAuthBackend,
    initiator: Arc<CheckoutInitiator>,
    resolver: Arc<RedirectResolver>,
    finalizer: Arc<OrderFinalizer>,
}

impl Storefront {
    pub fn new(deps: StorefrontDeps) -> Self {
        let finalizer = Arc::new(OrderFinalizer::new(
            deps.session.clone(),
            deps.orders,
            deps.pending.clone(),
        ));
        let initiator = Arc::new(CheckoutInitiator::new(
            deps.session.clone(),
            deps.pending.clone(),
            deps.gateway,
            deps.navigator,
        ));
        let resolver = Arc::new(RedirectResolver::new(
            deps.session.clone(),
            deps.pending,
            finalizer.clone(),
        ));

        Self {
            session: deps.session,
            view: deps.view,
            auth: deps.auth,
            initiator,
            resolver,
            finalizer,
        }
    }

    /// Application start: restore the stored session and prefill the form
    pub fn start(&self) {
        self.session.restore();
        self.view.prefill_from_user(&self.session.current_user());
    }

    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> ShopResult<UserProfile> {
        let login = match self.auth.login(email, password).await {
            Ok(login) => login,
            Err(e) => {
                warn!("Login failed: {}", e);
                let message = if e.is_auth() {
                    messages::INVALID_CREDENTIALS.to_string()
                } else {
                    backend_message(&e)
                };
                self.view.raise(Alert::error(message));
                return Err(e);
            }
        };

        let ttl = login.ttl_seconds();
        let user = login.user.unwrap_or_default();
        if let Err(e) = self.session.activate(&login.token, ttl, user.clone()) {
            self.view.raise(Alert::error(backend_message(&e)));
            return Err(e);
        }
        self.view.prefill_from_user(&user);
        info!("Logged in as {}", user.email);
        Ok(user)
    }

    #[instrument(skip(self, user), fields(email = %user.profile.email))]
    pub async fn signup(&self, user: &NewUser) -> ShopResult<()> {
        if !user.profile.has_email() || user.password.is_empty() {
            let e = ShopError::Validation("email and password are required".to_string());
            self.view.raise(Alert::error(messages::COMPLETE_FIELDS));
            return Err(e);
        }
        match self.auth.signup(user).await {
            Ok(()) => {
                self.view.raise(Alert::success(messages::SIGNED_UP));
                Ok(())
            }
            Err(e) => {
                warn!("Signup failed: {}", e);
                self.view.raise(Alert::error(backend_message(&e)));
                Err(e)
            }
        }
    }

    pub fn logout(&self) {
        self.session.logout();
        self.view.prefill_from_user(&UserProfile::default());
        self.view.raise(Alert::info(messages::LOGGED_OUT));
    }

    pub fn add_to_cart(&self, item: CartItem) {
        self.view.add_item(item);
    }

    pub fn set_form(&self, form: DeliveryForm) {
        self.view.set_form(form);
    }

    pub async fn checkout(&self) -> Option<CheckoutSession> {
        self.initiator.checkout(&self.view).await
    }

    /// Handle a navigation arrival on the cart page
    pub async fn arrive(&self, arrival: &Arrival) -> ResolverState {
        self.resolver.resolve(arrival, &self.view).await
    }

    /// Submit the order from the current form, e.g. after logging in to
    /// complete a deferred resumption.
    pub async fn place_order(&self) -> bool {
        let placed = self.finalizer.finalize(&self.view).await;
        if placed {
            self.view.release_form();
        }
        placed
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn view(&self) -> &CheckoutView {
        &self.view
    }

    pub fn resolver_state(&self) -> ResolverState {
        self.resolver.state()
    }

    pub fn subscribe_resolver(&self) -> watch::Receiver<ResolverState> {
        self.resolver.subscribe_state()
    }
}

fn backend_message(err: &ShopError) -> String {
    match err.upstream_message() {
        Some(message) if !message.is_empty() => message.to_string(),
        _ => messages::UNEXPECTED.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::Clock;
    use crate::redirect::RedirectOutcome;
    use crate::storage::{keys, KeyValueStore};
    use crate::testing::{ada, store_session, valid_form, Harness, PASSWORD};
    use chrono::Duration;

    #[tokio::test]
    async fn test_unauthenticated_checkout() {
        let h = Harness::new();
        let shop = h.storefront();
        shop.start();
        shop.add_to_cart(CartItem::new("mug", "Mug", 850, 1));
        shop.add_to_cart(CartItem::new("tee", "T-Shirt", 1999, 1));

        assert!(shop.checkout().await.is_none());

        assert_eq!(shop.view().alert(), Some(Alert::error(messages::LOGIN_TO_PAY)));
        assert!(h.navigator.urls().is_empty());
        assert_eq!(h.store.get(keys::PENDING_CHECKOUT).unwrap(), None);
    }

    #[tokio::test]
    async fn test_authenticated_checkout() {
        let h = Harness::new();
        let shop = h.storefront();
        shop.start();
        shop.login(&ada().email, PASSWORD).await.unwrap();
        h.fill_cart_and_form();

        let session = shop.checkout().await.unwrap();

        assert!(h.pending.is_pending());
        assert_eq!(h.gateway.calls()[0].len(), 2);
        assert_eq!(h.navigator.urls(), vec![session.checkout_url]);
    }

    #[tokio::test]
    async fn test_success_joins_late_restore_across_reload() {
        // Process one: log in and leave for the provider.
        let first = Harness::new();
        let shop = first.storefront();
        shop.start();
        shop.login(&ada().email, PASSWORD).await.unwrap();
        first.fill_cart_and_form();
        shop.checkout().await.unwrap();

        // Process two: the provider sends the customer back before the
        // session has been restored.
        let second = first.reload();
        let shop = second.storefront();
        shop.add_to_cart(CartItem::new("mug", "Mug", 850, 2));

        let resolving = tokio::spawn({
            let shop = shop.clone();
            async move { shop.arrive(&Arrival::from_query("status=success")).await }
        });
        shop.subscribe_resolver()
            .wait_for(|s| *s == ResolverState::AwaitingRestore)
            .await
            .unwrap();
        assert_eq!(shop.view().form(), valid_form());
        assert!(second.orders.calls().is_empty());

        shop.start();
        assert_eq!(resolving.await.unwrap(), ResolverState::Done);

        let calls = second.orders.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, valid_form().to_delivery_address());
        assert!(shop.view().cart().is_empty());
        assert!(shop.view().checkout_disabled());
        assert!(!second.pending.is_pending());

        // The query is still on the page; a later evaluation does nothing.
        shop.arrive(&Arrival::from_query("status=success")).await;
        assert_eq!(second.orders.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_payload() {
        let h = Harness::new();
        h.login_stored();
        h.store.set(keys::PENDING_CHECKOUT, "not json").unwrap();
        let shop = h.storefront();
        shop.start();

        let state = shop.arrive(&Arrival::from_query("status=success")).await;

        assert_eq!(state, ResolverState::Failed);
        assert_eq!(
            shop.view().alert(),
            Some(Alert::error(messages::RESTORE_FAILED))
        );
        assert!(h.orders.calls().is_empty());
    }

    #[tokio::test]
    async fn test_login_after_failed_restore_prefills_form() {
        let h = Harness::new();
        h.store.set(keys::PENDING_CHECKOUT, "not json").unwrap();
        let shop = h.storefront();
        shop.start();

        let state = shop.arrive(&Arrival::from_query("status=success")).await;
        assert_eq!(state, ResolverState::Failed);

        shop.login(&ada().email, PASSWORD).await.unwrap();
        assert_eq!(shop.view().form(), DeliveryForm::from_user(&ada()));

        shop.logout();
        assert_eq!(shop.view().form(), DeliveryForm::default());
    }

    #[tokio::test]
    async fn test_cancel() {
        let h = Harness::new();
        h.login_stored();
        h.pending.put(&valid_form()).unwrap();
        let before = h.store.get(keys::PENDING_CHECKOUT).unwrap();
        let shop = h.storefront();
        shop.start();

        let state = shop.arrive(&Arrival::from_query("status=cancel")).await;

        assert_eq!(state, ResolverState::Cancelled);
        assert_eq!(
            shop.view().alert(),
            Some(Alert::error(messages::PAYMENT_CANCELLED))
        );
        assert_eq!(h.store.get(keys::PENDING_CHECKOUT).unwrap(), before);
    }

    #[tokio::test]
    async fn test_restore_of_just_expired_session() {
        let h = Harness::new();
        store_session(&*h.store, "tok-old", h.clock.now() - Duration::milliseconds(1));
        let shop = h.storefront();

        shop.start();

        assert!(!shop.session().is_authenticated());
        assert!(shop.session().is_restored());
        assert!(!shop.session().has_expiry_timer());
        assert_eq!(shop.view().form(), DeliveryForm::default());
    }

    #[tokio::test]
    async fn test_deferred_order_completes_after_login() {
        let h = Harness::new();
        h.pending.put(&valid_form()).unwrap();
        let shop = h.storefront();
        shop.start();

        let state = shop.arrive(&Arrival::new(RedirectOutcome::Success)).await;
        assert_eq!(state, ResolverState::AwaitingLogin);

        shop.login(&ada().email, PASSWORD).await.unwrap();
        // Login prefill must not clobber the restored address.
        assert_eq!(shop.view().form(), valid_form());

        assert!(shop.place_order().await);
        assert_eq!(h.orders.calls().len(), 1);
        assert!(!h.pending.is_pending());
        assert!(!shop.view().is_form_held());
    }

    #[tokio::test]
    async fn test_login_with_bad_password() {
        let h = Harness::new();
        let shop = h.storefront();
        shop.start();

        let result = shop.login(&ada().email, "wrong").await;

        assert!(matches!(result, Err(ShopError::Auth(_))));
        assert_eq!(
            shop.view().alert(),
            Some(Alert::error(messages::INVALID_CREDENTIALS))
        );
        assert!(!shop.session().is_authenticated());
    }

    #[tokio::test]
    async fn test_login_prefills_and_logout_clears_form() {
        let h = Harness::new();
        let shop = h.storefront();
        shop.start();

        shop.login(&ada().email, PASSWORD).await.unwrap();
        assert_eq!(shop.view().form(), DeliveryForm::from_user(&ada()));

        shop.logout();
        assert_eq!(shop.view().form(), DeliveryForm::default());
        assert_eq!(shop.view().alert(), Some(Alert::info(messages::LOGGED_OUT)));
    }

    #[tokio::test]
    async fn test_login_honours_server_ttl() {
        let h = Harness::new();
        h.auth.set_ttl(120);
        let shop = h.storefront();

        shop.login(&ada().email, PASSWORD).await.unwrap();

        assert_eq!(
            shop.session().expires_at(),
            Some(h.clock.now() + Duration::seconds(120))
        );
    }

    #[tokio::test]
    async fn test_signup_reports_server_message() {
        let h = Harness::new();
        let shop = h.storefront();

        let taken = NewUser {
            profile: ada(),
            password: PASSWORD.into(),
        };
        assert!(shop.signup(&taken).await.is_err());
        assert_eq!(
            shop.view().alert(),
            Some(Alert::error("Email already registered"))
        );

        let fresh = NewUser {
            profile: UserProfile {
                email: "grace@example.com".into(),
                ..ada()
            },
            password: PASSWORD.into(),
        };
        shop.signup(&fresh).await.unwrap();
        assert_eq!(shop.view().alert(), Some(Alert::success(messages::SIGNED_UP)));
        assert_eq!(h.auth.signups().len(), 1);
    }
}
