//! Session context: token, identity, and loading flag for the signed-in admin.
//!
//! SYSTEM CONTEXT
//! ==============
//! One `Session` is constructed at startup from durable storage and handed to
//! the API client and every store. Clones are handles to the same state, so
//! there is exactly one signed-in identity per process without a global.
//!
//! Writes go through an [`Observable`], so subscribers see every transition
//! synchronously. Token and identity are persisted together and cleared
//! together.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::rc::Rc;

use super::observable::{Observable, SubscriptionId};
use crate::net::types::User;
use crate::util::storage::{self, DurableStorage, TOKEN_KEY, USER_KEY};

/// Logical lifecycle phase derived from [`SessionState`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    Anonymous,
    Authenticating,
    Authenticated,
}

/// Snapshot of the session published to subscribers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionState {
    pub token: Option<String>,
    pub user: Option<User>,
    pub loading: bool,
}

impl SessionState {
    /// True iff both a token and an identity are held. Never stored.
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.user.is_some()
    }

    pub fn phase(&self) -> SessionPhase {
        if self.loading {
            SessionPhase::Authenticating
        } else if self.is_authenticated() {
            SessionPhase::Authenticated
        } else {
            SessionPhase::Anonymous
        }
    }
}

#[derive(Clone)]
pub struct Session {
    state: Observable<SessionState>,
    storage: Rc<dyn DurableStorage>,
}

impl Session {
    /// Build the session from whatever a previous run persisted.
    pub fn restore(storage: Rc<dyn DurableStorage>) -> Self {
        let token = storage.get(TOKEN_KEY).filter(|t| !t.is_empty());
        let user = storage::load_json::<User>(storage.as_ref(), USER_KEY);
        tracing::debug!(has_token = token.is_some(), has_user = user.is_some(), "session restored");
        Self {
            state: Observable::new(SessionState { token, user, loading: false }),
            storage,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state.get()
    }

    pub fn token(&self) -> Option<String> {
        self.state.with(|s| s.token.clone())
    }

    pub fn user(&self) -> Option<User> {
        self.state.with(|s| s.user.clone())
    }

    pub fn is_loading(&self) -> bool {
        self.state.with(|s| s.loading)
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.with(SessionState::is_authenticated)
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.with(SessionState::phase)
    }

    /// Be notified of every session change.
    pub fn subscribe(&self, f: impl Fn(&SessionState) + 'static) -> SubscriptionId {
        self.state.subscribe(f)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.state.unsubscribe(id)
    }

    /// Drop token and identity from memory and storage. Idempotent: once the
    /// session is clear, further calls publish nothing.
    pub fn logout(&self) {
        self.storage.remove(TOKEN_KEY);
        self.storage.remove(USER_KEY);
        let held = self.state.with(|s| s.token.is_some() || s.user.is_some());
        if held {
            self.state.update(|s| {
                s.token = None;
                s.user = None;
            });
            tracing::info!("session cleared");
        }
    }

    /// Persist and publish a freshly authenticated identity in one write.
    pub(crate) fn establish(&self, token: String, user: User) {
        self.storage.set(TOKEN_KEY, &token);
        storage::save_json(self.storage.as_ref(), USER_KEY, &user);
        self.state.update(|s| {
            s.token = Some(token);
            s.user = Some(user);
        });
    }

    pub(crate) fn set_loading(&self, loading: bool) {
        if self.is_loading() != loading {
            self.state.update(|s| s.loading = loading);
        }
    }

    /// Raise `loading` until the returned guard drops, on every exit path.
    pub(crate) fn begin_loading(&self) -> LoadingGuard<'_> {
        self.set_loading(true);
        LoadingGuard { session: self }
    }
}

pub(crate) struct LoadingGuard<'a> {
    session: &'a Session,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.session.set_loading(false);
    }
}
