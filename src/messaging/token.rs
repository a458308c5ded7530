use std::fmt;

use futures::future::{BoxFuture, FutureExt};

use crate::messaging::source::MessagingSource;
use crate::util::loading_value::LoadingHook;
use crate::util::once::OnceLoader;
use crate::util::subscribe::Subscription;

/// Registration token of a messaging instance, requested once per instance.
pub struct TokenHook<M: MessagingSource> {
    loader: OnceLoader<M, String, M::Error>,
}

/// Mounts a [`TokenHook`] along with the future of the first token request.
pub fn use_token<M: MessagingSource>(
    messaging: M,
    vapid_key: Option<&str>,
) -> (TokenHook<M>, BoxFuture<'static, ()>) {
    let mut hook = TokenHook::new(messaging, vapid_key);
    let first_load = hook.load();
    (hook, first_load)
}

impl<M: MessagingSource> TokenHook<M> {
    pub fn new(messaging: M, vapid_key: Option<&str>) -> Self {
        let vapid_key = vapid_key.map(str::to_string);
        let loader = OnceLoader::new(
            Some(messaging),
            |left: &M, right: &M| left.is_equal(right),
            move |messaging: &M| {
                let messaging = messaging.clone();
                let vapid_key = vapid_key.clone();
                async move { messaging.get_token(vapid_key.as_deref()).await }.boxed()
            },
        );
        Self { loader }
    }

    pub fn load(&mut self) -> BoxFuture<'static, ()> {
        self.loader.load()
    }

    /// Feeds the caller's messaging instance; another instance resets the hook and the
    /// returned future requests its token.
    pub fn update(&mut self, messaging: M) -> BoxFuture<'static, ()> {
        self.loader.update(Some(messaging))
    }

    /// `(token, loading, error)`.
    pub fn snapshot(&self) -> LoadingHook<String, M::Error> {
        self.loader.snapshot()
    }

    pub fn watch<F>(&self, callback: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.loader.watch(callback)
    }
}

impl<M: MessagingSource + fmt::Debug> fmt::Debug for TokenHook<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenHook")
            .field("loader", &self.loader)
            .finish()
    }
}
