use std::fmt;
use std::sync::Arc;

use crate::util::comparator_ref::ComparatorRef;
use crate::util::loading_value::{LoadingHook, LoadingState, LoadingValue};
use crate::util::subscribe::{ResultCallback, Subscription, SubscriptionEpoch};

type ListenFn<R, T, E> =
    Box<dyn Fn(&R, ResultCallback<Option<T>, E>) -> Result<Subscription, E> + Send + Sync>;

/// Keeps a [`LoadingValue`] in sync with a single listener attached to a reference.
///
/// The reference goes through a [`ComparatorRef`]; only a change to a non-equivalent reference
/// resets the value and moves the listener. Events delivered by a listener that was already
/// replaced are dropped.
pub struct ValueListener<R, T, E> {
    reference: ComparatorRef<R>,
    value: LoadingValue<T, E>,
    epoch: SubscriptionEpoch,
    listen: ListenFn<R, T, E>,
    listener: Option<Subscription>,
}

impl<R, T, E> ValueListener<R, T, E>
where
    R: Send + Sync + 'static,
    T: Send + 'static,
    E: fmt::Debug + Send + 'static,
{
    pub fn new<C, L>(reference: Option<R>, is_equal: C, listen: L) -> Self
    where
        C: Fn(&R, &R) -> bool + Send + Sync + 'static,
        L: Fn(&R, ResultCallback<Option<T>, E>) -> Result<Subscription, E> + Send + Sync + 'static,
    {
        Self::with_value(reference, LoadingValue::new(), is_equal, listen)
    }

    /// Same as [`ValueListener::new`] over a caller-built container, e.g. one with a default
    /// value factory.
    pub fn with_value<C, L>(
        reference: Option<R>,
        value: LoadingValue<T, E>,
        is_equal: C,
        listen: L,
    ) -> Self
    where
        C: Fn(&R, &R) -> bool + Send + Sync + 'static,
        L: Fn(&R, ResultCallback<Option<T>, E>) -> Result<Subscription, E> + Send + Sync + 'static,
    {
        let epoch = SubscriptionEpoch::new();
        let reset_value = value.clone();
        let reset_epoch = epoch.clone();
        let reference = ComparatorRef::new(reference, is_equal).with_on_change(move || {
            reset_epoch.advance();
            reset_value.reset();
        });

        let mut listener = Self {
            reference,
            value,
            epoch,
            listen: Box::new(listen),
            listener: None,
        };
        listener.subscribe();
        listener
    }

    /// Feeds the caller's current reference; returns whether the listener moved.
    pub fn update(&mut self, reference: Option<R>) -> bool {
        if !self.reference.update(reference) {
            return false;
        }
        self.teardown();
        self.subscribe();
        true
    }

    pub fn reference(&self) -> Option<&R> {
        self.reference.current()
    }

    pub fn value(&self) -> &LoadingValue<T, E> {
        &self.value
    }

    pub fn is_listening(&self) -> bool {
        self.listener.is_some()
    }

    pub fn watch<F>(&self, callback: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.value.watch(callback)
    }

    fn subscribe(&mut self) {
        let Some(reference) = self.reference.current() else {
            self.value.set_value(None);
            return;
        };

        let token = self.epoch.token();
        let value = self.value.clone();
        let callback: ResultCallback<Option<T>, E> = Arc::new(move |result| {
            if !token.is_current() {
                log::trace!("dropping event from a superseded listener");
                return;
            }
            match result {
                Ok(next) => value.set_value(next),
                Err(err) => {
                    log::warn!("listener reported an error: {err:?}");
                    value.set_error(err);
                }
            }
        });

        match (self.listen)(reference, callback) {
            Ok(subscription) => self.listener = Some(subscription),
            Err(err) => {
                log::warn!("failed to attach listener: {err:?}");
                self.value.set_error(err);
            }
        }
    }

    fn teardown(&mut self) {
        if let Some(listener) = self.listener.take() {
            log::debug!("detaching listener");
            listener.cancel();
        }
    }
}

impl<R, T: Clone, E: Clone> ValueListener<R, T, E> {
    pub fn state(&self) -> LoadingState<T, E> {
        self.value.state()
    }

    pub fn snapshot(&self) -> LoadingHook<T, E> {
        self.value.snapshot()
    }
}

impl<R, T, E> Drop for ValueListener<R, T, E> {
    fn drop(&mut self) {
        self.epoch.advance();
        if let Some(listener) = self.listener.take() {
            listener.cancel();
        }
    }
}

impl<R: fmt::Debug, T: fmt::Debug, E: fmt::Debug> fmt::Debug for ValueListener<R, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueListener")
            .field("reference", &self.reference)
            .field("value", &self.value)
            .field("listening", &self.listener.is_some())
            .finish()
    }
}
