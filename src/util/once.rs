use std::fmt;

use futures::future::{self, BoxFuture, FutureExt};

use crate::util::comparator_ref::ComparatorRef;
use crate::util::loading_value::{LoadingHook, LoadingValue};
use crate::util::subscribe::{Subscription, SubscriptionEpoch};

pub type FetchFuture<T, E> = BoxFuture<'static, Result<T, E>>;
type FetchFn<R, T, E> = Box<dyn Fn(&R) -> FetchFuture<T, E> + Send + Sync + 'static>;

/// One-shot loader keyed on a reference identity.
///
/// Backs the hooks that read a value once instead of listening (`get()` on a document, a
/// download URL). The futures returned by [`OnceLoader::update`] and [`OnceLoader::reload`] do
/// not borrow the loader, so the caller may drive them on any executor while it keeps
/// evaluating the hook; a result that arrives after the reference changed is discarded.
pub struct OnceLoader<R, T, E> {
    reference: ComparatorRef<R>,
    value: LoadingValue<T, E>,
    epoch: SubscriptionEpoch,
    fetch: FetchFn<R, T, E>,
    stale: bool,
}

impl<R, T, E> OnceLoader<R, T, E>
where
    R: Send + Sync + 'static,
    T: Clone + Send + 'static,
    E: Clone + fmt::Debug + Send + 'static,
{
    pub fn new<C, F>(reference: Option<R>, is_equal: C, fetch: F) -> Self
    where
        C: Fn(&R, &R) -> bool + Send + Sync + 'static,
        F: Fn(&R) -> FetchFuture<T, E> + Send + Sync + 'static,
    {
        let value = LoadingValue::new();
        let epoch = SubscriptionEpoch::new();
        let reset_value = value.clone();
        let reset_epoch = epoch.clone();
        let reference = ComparatorRef::new(reference, is_equal).with_on_change(move || {
            reset_epoch.advance();
            reset_value.reset();
        });

        Self {
            reference,
            value,
            epoch,
            fetch: Box::new(fetch),
            stale: true,
        }
    }

    pub fn reference(&self) -> Option<&R> {
        self.reference.current()
    }

    pub fn snapshot(&self) -> LoadingHook<T, E> {
        self.value.snapshot()
    }

    pub fn watch<F>(&self, callback: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.value.watch(callback)
    }

    /// Feeds the latest reference and returns the load it requires, if any. The first call
    /// always loads; later calls load only when the reference is not equivalent to the stored
    /// one.
    pub fn update(&mut self, reference: Option<R>) -> BoxFuture<'static, ()> {
        if self.reference.update(reference) {
            self.stale = true;
        }
        self.load()
    }

    /// Starts the load of the stored reference unless it already ran; resolves immediately
    /// otherwise.
    pub fn load(&mut self) -> BoxFuture<'static, ()> {
        if !self.stale {
            return future::ready(()).boxed();
        }
        self.stale = false;
        self.start_load()
    }

    /// Discards the current value and loads the stored reference again.
    pub fn reload(&mut self) -> BoxFuture<'static, ()> {
        self.epoch.advance();
        self.value.reset();
        self.stale = false;
        self.start_load()
    }

    fn start_load(&self) -> BoxFuture<'static, ()> {
        let value = self.value.clone();
        let Some(reference) = self.reference.current() else {
            value.set_value(None);
            return future::ready(()).boxed();
        };

        let token = self.epoch.token();
        let pending = (self.fetch)(reference);
        async move {
            let result = pending.await;
            if !token.is_current() {
                log::trace!("discarding one-shot result for superseded reference");
                return;
            }
            match result {
                Ok(loaded) => value.set_value(Some(loaded)),
                Err(err) => {
                    log::warn!("one-shot load failed: {err:?}");
                    value.set_error(err);
                }
            }
        }
        .boxed()
    }
}

impl<R: fmt::Debug, T, E> fmt::Debug for OnceLoader<R, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnceLoader")
            .field("reference", &self.reference)
            .field("stale", &self.stale)
            .finish()
    }
}
