use std::fmt;
use std::sync::{Arc, Mutex};

use crate::util::subscribe::{Observers, Subscription};
use crate::util::sync::lock;

/// Positional `(value, loading, error)` tuple returned by every hook.
pub type LoadingHook<T, E> = (Option<T>, bool, Option<E>);

pub type DefaultValueFactory<T> = Arc<dyn Fn() -> Option<T> + Send + Sync + 'static>;

/// Tri-state held by a [`LoadingValue`].
///
/// `Value(None)` is a completed load with nothing to show (for example a hook mounted without a
/// reference); it is distinct from `Loading`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadingState<T, E> {
    Loading,
    Value(Option<T>),
    Error(E),
}

impl<T, E> LoadingState<T, E> {
    /// State a container starts in (and returns to on reset) for the given default value.
    pub fn initial(default_value: Option<T>) -> Self {
        match default_value {
            Some(value) => LoadingState::Value(Some(value)),
            None => LoadingState::Loading,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, LoadingState::Loading)
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            LoadingState::Value(value) => value.as_ref(),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&E> {
        match self {
            LoadingState::Error(error) => Some(error),
            _ => None,
        }
    }

    pub fn map<U, F>(self, f: F) -> LoadingState<U, E>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            LoadingState::Loading => LoadingState::Loading,
            LoadingState::Value(value) => LoadingState::Value(value.map(f)),
            LoadingState::Error(error) => LoadingState::Error(error),
        }
    }

    pub fn into_tuple(self) -> LoadingHook<T, E> {
        match self {
            LoadingState::Loading => (None, true, None),
            LoadingState::Value(value) => (value, false, None),
            LoadingState::Error(error) => (None, false, Some(error)),
        }
    }
}

/// Argument of [`LoadingValue::dispatch`]: a literal value or a function of the previous one.
pub enum ValueUpdate<T> {
    Set(Option<T>),
    Update(Box<dyn FnOnce(Option<T>) -> Option<T>>),
}

impl<T> ValueUpdate<T> {
    pub fn update<F>(f: F) -> Self
    where
        F: FnOnce(Option<T>) -> Option<T> + 'static,
    {
        ValueUpdate::Update(Box::new(f))
    }

    fn apply(self, previous: Option<T>) -> Option<T> {
        match self {
            ValueUpdate::Set(value) => value,
            ValueUpdate::Update(f) => f(previous),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ValueUpdate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueUpdate::Set(value) => f.debug_tuple("Set").field(value).finish(),
            ValueUpdate::Update(_) => f.write_str("Update(..)"),
        }
    }
}

/// Shared value/loading/error container.
///
/// Clones share the same state, so a hook can hand clones to the listener callbacks it
/// registers. Every transition notifies the observers registered through
/// [`LoadingValue::watch`] after the state lock has been released.
pub struct LoadingValue<T, E> {
    state: Arc<Mutex<LoadingState<T, E>>>,
    default_value: Option<DefaultValueFactory<T>>,
    observers: Observers,
}

impl<T, E> Clone for LoadingValue<T, E> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            default_value: self.default_value.clone(),
            observers: self.observers.clone(),
        }
    }
}

impl<T, E> Default for LoadingValue<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> LoadingValue<T, E> {
    /// Creates a container that starts out loading.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(LoadingState::Loading)),
            default_value: None,
            observers: Observers::new(),
        }
    }

    /// Creates a container seeded from `factory`; the factory runs again on every reset.
    pub fn with_default<F>(factory: F) -> Self
    where
        F: Fn() -> Option<T> + Send + Sync + 'static,
    {
        let factory: DefaultValueFactory<T> = Arc::new(factory);
        let initial = LoadingState::initial(factory());
        Self {
            state: Arc::new(Mutex::new(initial)),
            default_value: Some(factory),
            observers: Observers::new(),
        }
    }

    pub fn set_value(&self, value: Option<T>) {
        self.dispatch(ValueUpdate::Set(value));
    }

    /// Replaces the value with `f(previous)`. `f` runs under the state lock and must not touch
    /// this container.
    pub fn update_value<F>(&self, f: F)
    where
        F: FnOnce(Option<T>) -> Option<T> + 'static,
    {
        self.dispatch(ValueUpdate::update(f));
    }

    pub fn dispatch(&self, update: ValueUpdate<T>) {
        {
            let mut state = lock(&self.state);
            let previous = match std::mem::replace(&mut *state, LoadingState::Loading) {
                LoadingState::Value(value) => value,
                LoadingState::Loading | LoadingState::Error(_) => None,
            };
            *state = LoadingState::Value(update.apply(previous));
        }
        self.observers.notify();
    }

    pub fn set_error(&self, error: E) {
        *lock(&self.state) = LoadingState::Error(error);
        self.observers.notify();
    }

    pub fn reset(&self) {
        let default_value = self.default_value.as_ref().and_then(|factory| factory());
        *lock(&self.state) = LoadingState::initial(default_value);
        self.observers.notify();
    }

    pub fn is_loading(&self) -> bool {
        lock(&self.state).is_loading()
    }

    /// Reads the current state without cloning it.
    pub fn with_state<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&LoadingState<T, E>) -> R,
    {
        f(&lock(&self.state))
    }

    pub fn watch<F>(&self, callback: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.observers.add(callback)
    }
}

impl<T: Clone, E: Clone> LoadingValue<T, E> {
    pub fn state(&self) -> LoadingState<T, E> {
        lock(&self.state).clone()
    }

    pub fn snapshot(&self) -> LoadingHook<T, E> {
        self.state().into_tuple()
    }
}

impl<T: fmt::Debug, E: fmt::Debug> fmt::Debug for LoadingValue<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadingValue")
            .field("state", &*lock(&self.state))
            .field("has_default", &self.default_value.is_some())
            .finish()
    }
}
