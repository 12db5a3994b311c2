//! # Session Manager
//!
//! Owns the authenticated session: token, absolute expiry, cached profile and
//! the auto-logout timer. All writes go through [`SessionManager`]; everything
//! else reads snapshots or subscribes to the watch channels.
//!
//! ```text
//!   restore() ──┐
//!   activate() ─┼──▶ watch<Session> ──▶ current_user(), subscribe()
//!   logout() ───┘         │
//!        │                └── expiry timer (single task, cancel-before-rearm)
//!        └──────────────▶ watch<bool> "restored" (flips true exactly once)
//! ```

use crate::clock::SharedClock;
use crate::error::{ShopError, ShopResult};
use crate::storage::{keys, SharedStore};
use crate::user::UserProfile;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Upper bound on a session lifetime (ten years)
const MAX_TTL_SECS: i64 = 10 * 365 * 24 * 60 * 60;

/// In-memory authentication state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub user: UserProfile,
}

impl Session {
    /// Token present, expiry in the future, and a known email
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
            && self.expires_at.is_some_and(|exp| exp > now)
            && self.user.has_email()
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }
}

/// Owner of the session state. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

struct Inner {
    store: SharedStore,
    clock: SharedClock,
    session: watch::Sender<Session>,
    restored: watch::Sender<bool>,
    expiry_timer: Mutex<Option<JoinHandle<()>>>,
}

impl SessionManager {
    pub fn new(store: SharedStore, clock: SharedClock) -> Self {
        let (session, _) = watch::channel(Session::default());
        let (restored, _) = watch::channel(false);

        Self {
            inner: Arc::new(Inner {
                store,
                clock,
                session,
                restored,
                expiry_timer: Mutex::new(None),
            }),
        }
    }

    /// Rehydrate the session from the persistent store.
    ///
    /// Missing, malformed or expired state leaves the session unauthenticated.
    /// Always marks the session as restored.
    #[instrument(skip(self))]
    pub fn restore(&self) {
        let token = self.read(keys::TOKEN).filter(|t| !t.is_empty());
        let expiry = self.read(keys::EXPIRY);

        let (token, expiry) = match (token, expiry) {
            (Some(token), Some(expiry)) => (token, expiry),
            _ => {
                debug!("No stored session");
                self.mark_restored();
                return;
            }
        };

        let expires_at = match DateTime::parse_from_rfc3339(&expiry) {
            Ok(at) => at.with_timezone(&Utc),
            Err(e) => {
                warn!("Stored expiry {:?} is unreadable: {}", expiry, e);
                self.logout();
                return;
            }
        };

        let now = self.inner.clock.now();
        if expires_at <= now {
            info!("Stored session expired at {}", expires_at);
            self.logout();
            return;
        }

        let user = UserProfile::from_lookup(|key| self.read(key));
        if !user.has_email() {
            warn!("Stored session has no email, discarding it");
            self.logout();
            return;
        }

        info!("Restored session for {}", user.email);
        self.inner.session.send_replace(Session {
            token: Some(token),
            expires_at: Some(expires_at),
            user,
        });
        self.arm_expiry_timer(expires_at - now);
        self.mark_restored();
    }

    /// Start a session after a successful login.
    ///
    /// Persists each field individually, then replaces the in-memory session
    /// and re-arms the expiry timer.
    #[instrument(skip(self, token, user), fields(email = %user.email))]
    pub fn activate(&self, token: &str, ttl_seconds: u64, user: UserProfile) -> ShopResult<()> {
        if token.is_empty() {
            return Err(ShopError::Auth("login response carried no token".to_string()));
        }
        if !user.has_email() {
            return Err(ShopError::Auth("login response carried no email".to_string()));
        }
        if ttl_seconds == 0 {
            return Err(ShopError::Expired);
        }

        let secs = i64::try_from(ttl_seconds).unwrap_or(i64::MAX).min(MAX_TTL_SECS);
        let ttl = Duration::seconds(secs);
        let expires_at = self.inner.clock.now() + ttl;

        let store = &self.inner.store;
        store.set(keys::TOKEN, token)?;
        store.set(
            keys::EXPIRY,
            &expires_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        )?;
        for (key, value) in user.stored_fields() {
            store.set(key, value)?;
        }

        info!("Session activated until {}", expires_at);
        self.inner.session.send_replace(Session {
            token: Some(token.to_string()),
            expires_at: Some(expires_at),
            user,
        });
        self.arm_expiry_timer(ttl);
        Ok(())
    }

    /// End the session. Idempotent, and always marks the session restored so
    /// nothing waiting on restoration hangs after a logout.
    #[instrument(skip(self))]
    pub fn logout(&self) {
        for key in keys::SESSION_KEYS {
            if let Err(e) = self.inner.store.remove(key) {
                warn!("Failed to clear {}: {}", key, e);
            }
        }
        self.cancel_expiry_timer();

        let was_authenticated = self.inner.session.send_if_modified(|session| {
            if *session == Session::default() {
                return false;
            }
            *session = Session::default();
            true
        });
        if was_authenticated {
            info!("Logged out");
        }
        self.mark_restored();
    }

    /// Whether the session is currently valid.
    ///
    /// Re-checks the session invariant against the clock and logs out when a
    /// token is held that no longer satisfies it.
    pub fn is_authenticated(&self) -> bool {
        let (valid, has_token) = {
            let session = self.inner.session.borrow();
            (
                session.is_valid_at(self.inner.clock.now()),
                session.has_token(),
            )
        };
        if !valid && has_token {
            warn!("Session no longer valid, logging out");
            self.logout();
        }
        valid
    }

    pub fn current_user(&self) -> UserProfile {
        self.inner.session.borrow().user.clone()
    }

    pub fn token(&self) -> Option<String> {
        self.inner.session.borrow().token.clone()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.inner.session.borrow().expires_at
    }

    pub fn snapshot(&self) -> Session {
        self.inner.session.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.inner.session.subscribe()
    }

    pub fn is_restored(&self) -> bool {
        *self.inner.restored.borrow()
    }

    pub fn subscribe_restored(&self) -> watch::Receiver<bool> {
        self.inner.restored.subscribe()
    }

    /// Suspend until restoration has completed. Returns immediately if it
    /// already has.
    pub async fn wait_restored(&self) {
        let mut restored = self.inner.restored.subscribe();
        if restored.wait_for(|done| *done).await.is_err() {
            warn!("Restoration signal dropped");
        }
    }

    /// The user as of restoration completing (empty when unauthenticated)
    pub async fn restored_user(&self) -> UserProfile {
        self.wait_restored().await;
        self.current_user()
    }

    /// Whether an auto-logout is currently scheduled
    pub fn has_expiry_timer(&self) -> bool {
        self.timer_slot()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.inner.store.get(key) {
            Ok(value) => value,
            Err(e) => {
                warn!("Failed to read {}: {}", key, e);
                None
            }
        }
    }

    fn mark_restored(&self) {
        self.inner.restored.send_if_modified(|restored| {
            if *restored {
                return false;
            }
            *restored = true;
            true
        });
    }

    fn timer_slot(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.inner
            .expiry_timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn cancel_expiry_timer(&self) {
        if let Some(handle) = self.timer_slot().take() {
            handle.abort();
        }
    }

    fn arm_expiry_timer(&self, remaining: Duration) {
        let mut slot = self.timer_slot();
        if let Some(previous) = slot.take() {
            previous.abort();
        }

        let delay = match remaining.to_std() {
            Ok(delay) => delay,
            Err(_) => {
                drop(slot);
                self.logout();
                return;
            }
        };

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                warn!("No async runtime, expiry will only be enforced on access");
                return;
            }
        };

        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        *slot = Some(runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(inner) = weak.upgrade() {
                SessionManager { inner }.expire();
            }
        }));
        debug!("Expiry timer armed for {:?}", delay);
    }

    /// Runs on the timer task. Only the task currently in the slot may log
    /// out; a timer that lost a race with a re-arm does nothing.
    fn expire(&self) {
        {
            let mut slot = self.timer_slot();
            let current = tokio::task::try_id();
            match slot.as_ref() {
                Some(handle) if current == Some(handle.id()) => {
                    // Detach so logout does not abort the running task.
                    drop(slot.take());
                }
                _ => {
                    debug!("Expiry timer superseded");
                    return;
                }
            }
        }
        info!("Session timed out");
        self.logout();
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let session = self.inner.session.borrow();
        f.debug_struct("SessionManager")
            .field("authenticated", &session.has_token())
            .field("email", &session.user.email)
            .field("restored", &*self.inner.restored.borrow())
            .finish()
    }
}
