//! Fakes and fixtures shared by the unit tests.

use crate::backend::{AuthBackend, OrderBackend};
use crate::checkout::CheckoutInitiator;
use crate::clock::{Clock, ManualClock};
use crate::error::{ShopError, ShopResult};
use crate::finalize::OrderFinalizer;
use crate::form::DeliveryForm;
use crate::order::{CartItem, CheckoutSession, DeliveryAddress, LineItem};
use crate::pending::PendingCheckout;
use crate::redirect::RedirectResolver;
use crate::session::SessionManager;
use crate::storage::{keys, KeyValueStore, MemoryStore};
use crate::storefront::{Storefront, StorefrontDeps};
use crate::strategy::{CheckoutGateway, Navigator};
use crate::user::{LoginToken, NewUser, UserProfile};
use crate::view::CheckoutView;
use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

pub const PASSWORD: &str = "analytical-engine";

pub fn ada() -> UserProfile {
    UserProfile {
        first_name: "Ada".into(),
        last_name: "Lovelace".into(),
        address: "12 St James's Square".into(),
        city: "London".into(),
        state: "Greater London".into(),
        pin: "SW1Y 4JH".into(),
        email: "ada@example.com".into(),
    }
}

pub fn valid_form() -> DeliveryForm {
    DeliveryForm {
        name: "Ada Lovelace".into(),
        address: "Ockham Park".into(),
        city: "London".into(),
        state: "Surrey".into(),
        pin: "KT11 3JX".into(),
    }
}

/// Write a session for [`ada`] into `store` the way a previous process would
pub fn store_session(store: &dyn KeyValueStore, token: &str, expires_at: DateTime<Utc>) {
    store.set(keys::TOKEN, token).unwrap();
    store
        .set(
            keys::EXPIRY,
            &expires_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        )
        .unwrap();
    for (key, value) in ada().stored_fields() {
        store.set(key, value).unwrap();
    }
}

/// Auth backend that knows a single account, [`ada`]
#[derive(Default)]
pub struct FakeAuth {
    signups: Mutex<Vec<NewUser>>,
    ttl: Mutex<Option<u64>>,
}

impl FakeAuth {
    pub fn signups(&self) -> Vec<NewUser> {
        self.signups.lock().unwrap().clone()
    }

    pub fn set_ttl(&self, ttl: u64) {
        *self.ttl.lock().unwrap() = Some(ttl);
    }
}

#[async_trait]
impl AuthBackend for FakeAuth {
    async fn login(&self, email: &str, password: &str) -> ShopResult<LoginToken> {
        if email != ada().email || password != PASSWORD {
            return Err(ShopError::Auth("invalid credentials".into()));
        }
        Ok(LoginToken {
            token: "tok-ada".into(),
            expires_in_seconds: *self.ttl.lock().unwrap(),
            user: Some(ada()),
        })
    }

    async fn signup(&self, user: &NewUser) -> ShopResult<()> {
        if user.profile.email == ada().email {
            return Err(ShopError::Rejected {
                status: 409,
                message: Some("Email already registered".into()),
            });
        }
        self.signups.lock().unwrap().push(user.clone());
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub enum OrderReply {
    #[default]
    Ok,
    Rejected(Option<String>),
    Network,
}

#[derive(Default)]
pub struct RecordingOrders {
    calls: Mutex<Vec<(String, DeliveryAddress, String)>>,
    reply: Mutex<OrderReply>,
}

impl RecordingOrders {
    pub fn calls(&self) -> Vec<(String, DeliveryAddress, String)> {
        self.calls.lock().unwrap().clone()
    }

    /// Reply used for every following call
    pub fn reply(&self, reply: OrderReply) {
        *self.reply.lock().unwrap() = reply;
    }
}

#[async_trait]
impl OrderBackend for RecordingOrders {
    async fn save_order(
        &self,
        token: &str,
        delivery_address: &DeliveryAddress,
        email: &str,
    ) -> ShopResult<()> {
        self.calls.lock().unwrap().push((
            token.to_string(),
            delivery_address.clone(),
            email.to_string(),
        ));
        match self.reply.lock().unwrap().clone() {
            OrderReply::Ok => Ok(()),
            OrderReply::Rejected(message) => Err(ShopError::Rejected {
                status: 400,
                message,
            }),
            OrderReply::Network => Err(ShopError::Network("connection reset".into())),
        }
    }
}

#[derive(Default)]
pub struct RecordingGateway {
    calls: Mutex<Vec<Vec<LineItem>>>,
    fail: AtomicBool,
}

impl RecordingGateway {
    pub fn calls(&self) -> Vec<Vec<LineItem>> {
        self.calls.lock().unwrap().clone()
    }

    pub fn fail_next(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl CheckoutGateway for RecordingGateway {
    async fn create_checkout_session(
        &self,
        line_items: &[LineItem],
    ) -> ShopResult<CheckoutSession> {
        let mut calls = self.calls.lock().unwrap();
        calls.push(line_items.to_vec());
        if self.fail.swap(false, Ordering::SeqCst) {
            return Err(ShopError::ProviderError {
                provider: "stripe".into(),
                message: "api unavailable".into(),
            });
        }
        let id = format!("cs_test_{}", calls.len());
        let url = format!("https://checkout.stripe.com/c/pay/{}", id);
        Ok(CheckoutSession::new(id, "stripe", url))
    }
}

#[derive(Default)]
pub struct RecordingNavigator {
    urls: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, url: &str) -> ShopResult<()> {
        self.urls.lock().unwrap().push(url.to_string());
        Ok(())
    }
}

/// One "page load": a store, a clock, a session and the fakes around them
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
    pub session: SessionManager,
    pub pending: PendingCheckout,
    pub view: CheckoutView,
    pub auth: Arc<FakeAuth>,
    pub gateway: Arc<RecordingGateway>,
    pub navigator: Arc<RecordingNavigator>,
    pub orders: Arc<RecordingOrders>,
    pub finalizer: Arc<OrderFinalizer>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_store(MemoryStore::shared(), Arc::new(ManualClock::default()))
    }

    /// A fresh process over an existing store, as after a full reload
    pub fn reload(&self) -> Self {
        Self::with_store(self.store.clone(), self.clock.clone())
    }

    fn with_store(store: Arc<MemoryStore>, clock: Arc<ManualClock>) -> Self {
        let session = SessionManager::new(store.clone(), clock.clone());
        let pending = PendingCheckout::new(store.clone());
        let orders = Arc::new(RecordingOrders::default());
        let finalizer = Arc::new(OrderFinalizer::new(
            session.clone(),
            orders.clone(),
            pending.clone(),
        ));
        Self {
            store,
            clock,
            session,
            pending,
            view: CheckoutView::new(),
            auth: Arc::new(FakeAuth::default()),
            gateway: Arc::new(RecordingGateway::default()),
            navigator: Arc::new(RecordingNavigator::default()),
            orders,
            finalizer,
        }
    }

    pub fn initiator(&self) -> CheckoutInitiator {
        CheckoutInitiator::new(
            self.session.clone(),
            self.pending.clone(),
            self.gateway.clone(),
            self.navigator.clone(),
        )
    }

    pub fn resolver(&self) -> RedirectResolver {
        RedirectResolver::new(
            self.session.clone(),
            self.pending.clone(),
            self.finalizer.clone(),
        )
    }

    pub fn storefront(&self) -> Storefront {
        Storefront::new(StorefrontDeps {
            session: self.session.clone(),
            pending: self.pending.clone(),
            view: self.view.clone(),
            auth: self.auth.clone(),
            orders: self.orders.clone(),
            gateway: self.gateway.clone(),
            navigator: self.navigator.clone(),
        })
    }

    /// Log in as [`ada`] in this process
    pub fn login(&self) {
        self.session.activate("tok-ada", 3600, ada()).unwrap();
    }

    /// Leave a live session in the store without restoring it
    pub fn login_stored(&self) {
        store_session(&*self.store, "tok-ada", self.clock.now() + Duration::hours(1));
    }

    pub fn fill_cart_and_form(&self) {
        self.view.add_item(CartItem::new("mug", "Mug", 850, 2));
        self.view.add_item(CartItem::new("tee", "T-Shirt", 1999, 1));
        self.view.set_form(valid_form());
    }
}

