use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::util::sync::lock;

pub type Unsubscribe = Box<dyn FnOnce() + Send + 'static>;
pub type ChangeCallback = Arc<dyn Fn() + Send + Sync + 'static>;
pub type ResultCallback<T, E> = Arc<dyn Fn(Result<T, E>) + Send + Sync + 'static>;

/// RAII-style listener handle; dropping it runs the cancellation exactly once.
pub struct Subscription {
    cancel: Option<Unsubscribe>,
}

impl Subscription {
    pub fn new<F>(cancel: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A handle with nothing to cancel, for sources whose listeners detach on their own.
    pub fn noop() -> Self {
        Self { cancel: None }
    }

    pub fn is_active(&self) -> bool {
        self.cancel.is_some()
    }

    pub fn cancel(mut self) {
        self.run_cancel();
    }

    fn run_cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl From<Unsubscribe> for Subscription {
    fn from(cancel: Unsubscribe) -> Self {
        Self {
            cancel: Some(cancel),
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_cancel();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

/// Change notification list used as the re-render trigger of a hook.
#[derive(Clone, Default)]
pub struct Observers {
    inner: Arc<ObserversInner>,
}

#[derive(Default)]
struct ObserversInner {
    next_id: AtomicU64,
    callbacks: Mutex<Vec<(u64, ChangeCallback)>>,
}

impl Observers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<F>(&self, callback: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
        lock(&self.inner.callbacks).push((id, Arc::new(callback)));

        let inner = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = inner.upgrade() {
                lock(&inner.callbacks).retain(|(entry, _)| *entry != id);
            }
        })
    }

    pub fn len(&self) -> usize {
        lock(&self.inner.callbacks).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invokes every registered callback. The list is snapshotted first so callbacks may read
    /// hook state or register further observers.
    pub fn notify(&self) {
        let callbacks: Vec<ChangeCallback> = lock(&self.inner.callbacks)
            .iter()
            .map(|(_, callback)| callback.clone())
            .collect();
        for callback in callbacks {
            callback();
        }
    }
}

impl fmt::Debug for Observers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers").field("len", &self.len()).finish()
    }
}

/// Generation counter shared by a hook and the listener callbacks it hands to a source.
///
/// A hook advances the epoch before tearing its listeners down; callbacks captured with an
/// older [`EpochToken`] then ignore whatever the source still delivers.
#[derive(Clone, Debug, Default)]
pub struct SubscriptionEpoch {
    current: Arc<AtomicU64>,
}

impl SubscriptionEpoch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u64 {
        self.current.load(Ordering::SeqCst)
    }

    pub fn advance(&self) -> u64 {
        self.current.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn token(&self) -> EpochToken {
        EpochToken {
            current: self.current.clone(),
            generation: self.generation(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct EpochToken {
    current: Arc<AtomicU64>,
    generation: u64,
}

impl EpochToken {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_current(&self) -> bool {
        self.current.load(Ordering::SeqCst) == self.generation
    }
}
