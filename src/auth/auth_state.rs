use std::fmt;
use std::sync::{Arc, Mutex};

use crate::auth::source::{AuthSource, AuthStateCallback};
use crate::util::listen::ValueListener;
use crate::util::loading_value::{LoadingHook, LoadingState, LoadingValue};
use crate::util::subscribe::Subscription;
use crate::util::sync::lock;

/// Listener over an auth instance whose value is seeded from `current_user()`.
pub(crate) struct AuthListener<A: AuthSource> {
    auth: Arc<Mutex<A>>,
    pub(crate) inner: ValueListener<A, A::User, A::Error>,
}

impl<A: AuthSource> AuthListener<A> {
    pub(crate) fn new<L>(auth: A, listen: L) -> Self
    where
        L: Fn(&A, AuthStateCallback<A::User, A::Error>) -> Result<Subscription, A::Error>
            + Send
            + Sync
            + 'static,
    {
        let shared = Arc::new(Mutex::new(auth.clone()));
        let seed = shared.clone();
        // Runs again on every reset, so it must read the instance being switched to.
        let value = LoadingValue::with_default(move || lock(&seed).current_user());
        let inner = ValueListener::with_value(
            Some(auth),
            value,
            |left: &A, right: &A| left.is_equal(right),
            listen,
        );
        Self {
            auth: shared,
            inner,
        }
    }

    pub(crate) fn update(&mut self, auth: A) -> bool {
        {
            let mut current = lock(&self.auth);
            if !current.is_equal(&auth) {
                *current = auth.clone();
            }
        }
        self.inner.update(Some(auth))
    }
}

/// Signed-in user of an auth instance.
///
/// The state starts from `current_user()`: already loaded when a user is signed in, loading
/// otherwise until the first auth state event.
pub struct AuthStateHook<A: AuthSource> {
    listener: AuthListener<A>,
}

pub fn use_auth_state<A: AuthSource>(auth: A) -> AuthStateHook<A> {
    AuthStateHook::new(auth)
}

impl<A: AuthSource> AuthStateHook<A> {
    pub fn new(auth: A) -> Self {
        let listener = AuthListener::new(
            auth,
            |auth: &A, callback: AuthStateCallback<A::User, A::Error>| {
                auth.on_auth_state_changed(callback)
            },
        );
        Self { listener }
    }

    /// Re-evaluates the hook with the caller's auth instance; returns whether it resubscribed.
    pub fn update(&mut self, auth: A) -> bool {
        self.listener.update(auth)
    }

    pub fn state(&self) -> LoadingState<A::User, A::Error> {
        self.listener.inner.state()
    }

    /// `(user, loading, error)`.
    pub fn snapshot(&self) -> LoadingHook<A::User, A::Error> {
        self.listener.inner.snapshot()
    }

    pub fn watch<F>(&self, callback: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.listener.inner.watch(callback)
    }
}

impl<A> fmt::Debug for AuthStateHook<A>
where
    A: AuthSource + fmt::Debug,
    A::User: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthStateHook")
            .field("inner", &self.listener.inner)
            .finish()
    }
}
