use std::fmt;
use std::sync::Arc;

use crate::auth::auth_state::AuthListener;
use crate::auth::source::{AuthSource, AuthStateCallback};
use crate::util::loading_value::{LoadingHook, LoadingState};
use crate::util::subscribe::Subscription;

/// Runs on every ID token event before the user is stored; an `Err` is stored in its place.
pub type UserChangedFn<U, E> = Arc<dyn Fn(Option<&U>) -> Result<(), E> + Send + Sync + 'static>;

pub struct IdTokenOptions<A: AuthSource> {
    pub on_user_changed: Option<UserChangedFn<A::User, A::Error>>,
}

impl<A: AuthSource> IdTokenOptions<A> {
    pub fn with_on_user_changed<F>(callback: F) -> Self
    where
        F: Fn(Option<&A::User>) -> Result<(), A::Error> + Send + Sync + 'static,
    {
        Self {
            on_user_changed: Some(Arc::new(callback)),
        }
    }
}

impl<A: AuthSource> Default for IdTokenOptions<A> {
    fn default() -> Self {
        Self {
            on_user_changed: None,
        }
    }
}

impl<A: AuthSource> Clone for IdTokenOptions<A> {
    fn clone(&self) -> Self {
        Self {
            on_user_changed: self.on_user_changed.clone(),
        }
    }
}

impl<A: AuthSource> fmt::Debug for IdTokenOptions<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdTokenOptions")
            .field("on_user_changed", &self.on_user_changed.is_some())
            .finish()
    }
}

/// Signed-in user of an auth instance, refreshed on ID token changes as well as sign-in and
/// sign-out.
///
/// Seeded from `current_user()` in the same way as [`AuthStateHook`](crate::auth::AuthStateHook).
pub struct IdTokenHook<A: AuthSource> {
    listener: AuthListener<A>,
}

pub fn use_id_token<A: AuthSource>(auth: A, options: IdTokenOptions<A>) -> IdTokenHook<A> {
    IdTokenHook::new(auth, options)
}

impl<A: AuthSource> IdTokenHook<A> {
    pub fn new(auth: A, options: IdTokenOptions<A>) -> Self {
        let on_user_changed = options.on_user_changed;
        let listener = AuthListener::new(
            auth,
            move |auth: &A, callback: AuthStateCallback<A::User, A::Error>| {
                let Some(hook) = on_user_changed.clone() else {
                    return auth.on_id_token_changed(callback);
                };
                let forward: AuthStateCallback<A::User, A::Error> =
                    Arc::new(move |result: Result<Option<A::User>, A::Error>| {
                        callback(result.and_then(|user| hook(user.as_ref()).map(|()| user)))
                    });
                auth.on_id_token_changed(forward)
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

impl<A> fmt::Debug for IdTokenHook<A>
where
    A: AuthSource + fmt::Debug,
    A::User: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdTokenHook")
            .field("inner", &self.listener.inner)
            .finish()
    }
}
