//! # Redirect Resolver
//!
//! Handles the return from the payment provider. A `success` return has to
//! join two independently timed signals, the redirect outcome and session
//! restoration, and finalize the order exactly once.
//!
//! ```text
//!            success (latch open)
//!   Idle ──────────────────────────▶ AwaitingRestore ──▶ Finalizing ──▶ Done
//!    │  │                                  │                  │
//!    │  │ payload absent/unreadable        │ unauthenticated  │ rejected
//!    │  └──────────────▶ Failed            ▼                  ▼
//!    │                               AwaitingLogin          Failed
//!    │ cancel
//!    └───────▶ Cancelled
//! ```
//!
//! Each navigation arrival carries its own id. Re-evaluating an arrival that
//! was already seen does nothing, and once a `success` has been taken the
//! latch stays closed until a `none` arrival returns the resolver to `Idle`.

use crate::alert::{messages, Alert};
use crate::finalize::OrderFinalizer;
use crate::pending::PendingCheckout;
use crate::session::SessionManager;
use crate::view::CheckoutView;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Outcome signalled by the provider's return navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectOutcome {
    Success,
    Cancel,
    None,
}

impl RedirectOutcome {
    /// Read the `status` parameter of a query string (leading `?` optional)
    pub fn from_query(query: &str) -> Self {
        let query = query.trim_start_matches('?');
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == "status")
            .map(|(_, value)| match value.as_ref() {
                "success" => RedirectOutcome::Success,
                "cancel" => RedirectOutcome::Cancel,
                _ => RedirectOutcome::None,
            })
            .unwrap_or(RedirectOutcome::None)
    }

    /// Read the outcome from a full return URL
    pub fn from_url(url: &str) -> Self {
        match url::Url::parse(url) {
            Ok(url) => Self::from_query(url.query().unwrap_or_default()),
            Err(_) => Self::from_query(url.split_once('?').map(|(_, q)| q).unwrap_or_default()),
        }
    }
}

/// One navigation arrival on the return page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arrival {
    pub id: Uuid,
    pub outcome: RedirectOutcome,
}

impl Arrival {
    pub fn new(outcome: RedirectOutcome) -> Self {
        Self {
            id: Uuid::new_v4(),
            outcome,
        }
    }

    pub fn from_query(query: &str) -> Self {
        Self::new(RedirectOutcome::from_query(query))
    }
}

/// Resolver state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverState {
    Idle,
    AwaitingRestore,
    /// Restoration finished without an authenticated user
    AwaitingLogin,
    Finalizing,
    Done,
    Cancelled,
    Failed,
}

#[derive(Debug, Default)]
struct Latch {
    last_arrival: Option<Uuid>,
    success_taken: bool,
    generation: u64,
}

pub struct RedirectResolver {
    session: SessionManager,
    pending: PendingCheckout,
    finalizer: Arc<OrderFinalizer>,
    state: watch::Sender<ResolverState>,
    latch: Mutex<Latch>,
}

impl RedirectResolver {
    pub fn new(
        session: SessionManager,
        pending: PendingCheckout,
        finalizer: Arc<OrderFinalizer>,
    ) -> Self {
        Self {
            session,
            pending,
            finalizer,
            state: watch::channel(ResolverState::Idle).0,
            latch: Mutex::new(Latch::default()),
        }
    }

    pub fn state(&self) -> ResolverState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ResolverState> {
        self.state.subscribe()
    }

    /// Handle a navigation arrival. Returns the state it left the resolver in.
    #[instrument(skip(self, view), fields(arrival = %arrival.id, outcome = ?arrival.outcome))]
    pub async fn resolve(&self, arrival: &Arrival, view: &CheckoutView) -> ResolverState {
        let generation = {
            let mut latch = self.latch();
            if latch.last_arrival == Some(arrival.id) {
                debug!("Arrival already evaluated");
                return self.state();
            }
            latch.last_arrival = Some(arrival.id);

            match arrival.outcome {
                RedirectOutcome::None => {
                    latch.success_taken = false;
                    latch.generation += 1;
                    drop(latch);
                    view.release_form();
                    return self.transition(ResolverState::Idle);
                }
                RedirectOutcome::Cancel => {
                    latch.generation += 1;
                    drop(latch);
                    view.raise(Alert::error(messages::PAYMENT_CANCELLED));
                    return self.transition(ResolverState::Cancelled);
                }
                RedirectOutcome::Success if latch.success_taken => {
                    debug!("Success already handled");
                    return self.state();
                }
                RedirectOutcome::Success => {
                    latch.success_taken = true;
                    latch.generation += 1;
                    latch.generation
                }
            }
        };

        let patch = match self.pending.take() {
            Ok(Some(patch)) => patch,
            Ok(None) => {
                warn!("Payment succeeded but no pending checkout was found");
                view.raise(Alert::error(messages::RESTORE_FAILED));
                return self.transition(ResolverState::Failed);
            }
            Err(e) => {
                warn!("Pending checkout could not be restored: {}", e);
                view.raise(Alert::error(messages::RESTORE_FAILED));
                return self.transition(ResolverState::Failed);
            }
        };
        view.hold_form();
        view.patch_form(&patch);
        self.transition(ResolverState::AwaitingRestore);

        let user = self.session.restored_user().await;
        if self.generation() != generation {
            debug!("Superseded by a newer arrival, abandoning");
            self.keep_form_pending(view);
            return self.state();
        }

        if !self.session.is_authenticated() {
            info!("Session restored without a user, order deferred until login");
            self.keep_form_pending(view);
            view.raise(Alert::error(messages::LOGIN_TO_REGISTER));
            return self.transition(ResolverState::AwaitingLogin);
        }

        info!("Session restored for {}, finalizing order", user.email);
        self.transition(ResolverState::Finalizing);
        if self.finalizer.finalize(view).await {
            view.release_form();
            self.transition(ResolverState::Done)
        } else {
            self.keep_form_pending(view);
            self.transition(ResolverState::Failed)
        }
    }

    /// Write the restored form back so it survives another reload until an
    /// order is actually placed.
    fn keep_form_pending(&self, view: &CheckoutView) {
        if let Err(e) = self.pending.put(&view.form()) {
            warn!("Failed to re-persist restored form: {}", e);
        }
    }

    fn transition(&self, next: ResolverState) -> ResolverState {
        let previous = self.state.send_replace(next);
        if previous != next {
            debug!("Resolver {:?} -> {:?}", previous, next);
        }
        next
    }

    fn generation(&self) -> u64 {
        self.latch().generation
    }

    fn latch(&self) -> MutexGuard<'_, Latch> {
        self.latch.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
