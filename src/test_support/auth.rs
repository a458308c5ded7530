use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::auth::{AuthSource, AuthStateCallback};
use crate::util::subscribe::Subscription;
use crate::util::sync::lock;

use super::TestError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestUser {
    pub uid: String,
}

impl TestUser {
    pub fn new(uid: &str) -> Self {
        Self {
            uid: uid.to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Channel {
    AuthState,
    IdToken,
}

#[derive(Default)]
struct Inner {
    next_id: AtomicU64,
    user: Mutex<Option<TestUser>>,
    listeners: Mutex<Vec<(u64, Channel, AuthStateCallback<TestUser, TestError>)>>,
}

/// Auth instance that, like the SDK, reports the current user to a listener as it registers.
#[derive(Clone)]
pub struct MemoryAuth {
    name: String,
    inner: Arc<Inner>,
}

impl MemoryAuth {
    pub fn signed_out(name: &str) -> Self {
        Self {
            name: name.to_string(),
            inner: Arc::new(Inner::default()),
        }
    }

    pub fn signed_in(name: &str, user: TestUser) -> Self {
        let auth = Self::signed_out(name);
        *lock(&auth.inner.user) = Some(user);
        auth
    }

    pub fn sign_in(&self, user: TestUser) {
        *lock(&self.inner.user) = Some(user.clone());
        self.emit(Ok(Some(user)));
    }

    pub fn sign_out(&self) {
        *lock(&self.inner.user) = None;
        self.emit(Ok(None));
    }

    pub fn fail(&self, error: TestError) {
        self.emit(Err(error));
    }

    /// Token refresh: only ID token listeners hear about it.
    pub fn refresh_token(&self) {
        let user = self.current_user();
        self.emit_to(Some(Channel::IdToken), Ok(user));
    }

    pub fn listeners(&self) -> usize {
        lock(&self.inner.listeners).len()
    }

    fn emit(&self, result: Result<Option<TestUser>, TestError>) {
        self.emit_to(None, result);
    }

    fn emit_to(&self, channel: Option<Channel>, result: Result<Option<TestUser>, TestError>) {
        let listeners: Vec<_> = lock(&self.inner.listeners)
            .iter()
            .filter(|(_, registered, _)| channel.map_or(true, |channel| channel == *registered))
            .map(|(_, _, callback)| callback.clone())
            .collect();
        for callback in listeners {
            callback(result.clone());
        }
    }
}

impl AuthSource for MemoryAuth {
    type User = TestUser;
    type Error = TestError;

    fn is_equal(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn current_user(&self) -> Option<TestUser> {
        lock(&self.inner.user).clone()
    }

    fn on_auth_state_changed(
        &self,
        callback: AuthStateCallback<TestUser, TestError>,
    ) -> Result<Subscription, TestError> {
        self.register(Channel::AuthState, callback)
    }

    fn on_id_token_changed(
        &self,
        callback: AuthStateCallback<TestUser, TestError>,
    ) -> Result<Subscription, TestError> {
        self.register(Channel::IdToken, callback)
    }
}

impl MemoryAuth {
    fn register(
        &self,
        channel: Channel,
        callback: AuthStateCallback<TestUser, TestError>,
    ) -> Result<Subscription, TestError> {
        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
        lock(&self.inner.listeners).push((id, channel, callback.clone()));
        if let Some(user) = self.current_user() {
            callback(Ok(Some(user)));
        }

        let inner = Arc::downgrade(&self.inner);
        Ok(Subscription::new(move || {
            if let Some(inner) = inner.upgrade() {
                lock(&inner.listeners).retain(|(entry, _, _)| *entry != id);
            }
        }))
    }
}

impl std::fmt::Debug for MemoryAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryAuth").field("name", &self.name).finish()
    }
}
