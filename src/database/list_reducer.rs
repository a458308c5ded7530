//! Ordered child-list reconciliation.
//!
//! [`ListReducer`] keeps a keyed sequence in the order the server sorts it, using only the
//! child events the Realtime Database emits (`child_added`, `child_changed`, `child_moved`,
//! `child_removed`). Add and move events carry the key of the sibling that now precedes the
//! child, so every event is applied with local list surgery instead of a full re-read.
//!
//! Lookups are linear scans.

use std::fmt;
use std::sync::{Arc, Mutex};

use crate::util::loading_value::LoadingHook;
use crate::util::subscribe::{Observers, Subscription};
use crate::util::sync::lock;

/// Slot used when a change, remove or move names a key that is not in the list, and the
/// anchor used when an add names an unknown previous sibling.
pub const UNKNOWN_KEY_FALLBACK_INDEX: usize = 0;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyedItem<S> {
    pub key: String,
    pub payload: S,
}

impl<S> KeyedItem<S> {
    pub fn new(key: impl Into<String>, payload: S) -> Self {
        Self {
            key: key.into(),
            payload,
        }
    }
}

/// Events understood by [`ListReducer::dispatch`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ListAction<S, E> {
    /// Inserts after `previous_key`, or at the front when there is none.
    Add {
        key: String,
        payload: S,
        previous_key: Option<String>,
    },
    /// Replaces the payload of `key` without moving it.
    Change { key: String, payload: S },
    Remove { key: String },
    /// Removes `key` and re-inserts it after `previous_key`.
    Move {
        key: String,
        payload: S,
        previous_key: Option<String>,
    },
    /// Replaces the whole list; `None` clears it.
    SetAll(Option<Vec<KeyedItem<S>>>),
    Reset,
    Error(E),
    /// Loaded with nothing to observe.
    Empty,
}

impl<S, E> ListAction<S, E> {
    fn name(&self) -> &'static str {
        match self {
            ListAction::Add { .. } => "add",
            ListAction::Change { .. } => "change",
            ListAction::Remove { .. } => "remove",
            ListAction::Move { .. } => "move",
            ListAction::SetAll(_) => "set-all",
            ListAction::Reset => "reset",
            ListAction::Error(_) => "error",
            ListAction::Empty => "empty",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ListState<S, E> {
    /// Waiting for the initial batch. Holds whatever incremental events arrived ahead of it.
    Loading(Vec<KeyedItem<S>>),
    /// `None` when the hook has no query to observe.
    Loaded(Option<Vec<KeyedItem<S>>>),
    Failed(E),
}

impl<S, E> ListState<S, E> {
    pub fn is_loading(&self) -> bool {
        matches!(self, ListState::Loading(_))
    }

    pub fn items(&self) -> Option<&[KeyedItem<S>]> {
        match self {
            ListState::Loading(items) => Some(items),
            ListState::Loaded(items) => items.as_deref(),
            ListState::Failed(_) => None,
        }
    }

    pub fn keys(&self) -> Option<Vec<&str>> {
        self.items()
            .map(|items| items.iter().map(|item| item.key.as_str()).collect())
    }

    pub fn error(&self) -> Option<&E> {
        match self {
            ListState::Failed(error) => Some(error),
            _ => None,
        }
    }
}

impl<S: Clone, E: Clone> ListState<S, E> {
    /// Positional `(payloads, loading, error)` view of the state.
    pub fn to_tuple(&self) -> LoadingHook<Vec<S>, E> {
        let payloads = self
            .items()
            .map(|items| items.iter().map(|item| item.payload.clone()).collect());
        (payloads, self.is_loading(), self.error().cloned())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListReducer<S, E> {
    state: ListState<S, E>,
}

impl<S, E> Default for ListReducer<S, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, E> ListReducer<S, E> {
    pub fn new() -> Self {
        Self {
            state: ListState::Loading(Vec::new()),
        }
    }

    pub fn state(&self) -> &ListState<S, E> {
        &self.state
    }

    /// Applies one event. Returns `false` when the event was dropped, either because it had no
    /// key or because the list is holding an error.
    pub fn dispatch(&mut self, action: ListAction<S, E>) -> bool {
        match action {
            ListAction::Add {
                key,
                payload,
                previous_key,
            } => self.with_items("add", &key, |items| {
                add_child(items, key.clone(), payload, previous_key.as_deref())
            }),
            ListAction::Change { key, payload } => {
                self.with_items("change", &key, |items| change_child(items, &key, payload))
            }
            ListAction::Remove { key } => {
                self.with_items("remove", &key, |items| remove_child(items, &key))
            }
            ListAction::Move {
                key,
                payload,
                previous_key,
            } => self.with_items("move", &key, |items| {
                remove_child(items, &key);
                add_child(items, key.clone(), payload, previous_key.as_deref());
            }),
            ListAction::SetAll(items) => {
                let items = items
                    .unwrap_or_default()
                    .into_iter()
                    .filter(|item| !item.key.is_empty())
                    .collect();
                self.state = ListState::Loaded(Some(items));
                true
            }
            ListAction::Reset => {
                self.state = ListState::Loading(Vec::new());
                true
            }
            ListAction::Error(error) => {
                self.state = ListState::Failed(error);
                true
            }
            ListAction::Empty => {
                self.state = ListState::Loaded(None);
                true
            }
        }
    }

    /// Runs a keyed mutation against the current list. An error is kept until a reset or a new
    /// `SetAll`; a list loaded without a value starts over from an empty one.
    fn with_items<F>(&mut self, action: &'static str, key: &str, mutate: F) -> bool
    where
        F: FnOnce(&mut Vec<KeyedItem<S>>),
    {
        if key.is_empty() {
            log::trace!("ignoring {action} event without a key");
            return false;
        }
        if matches!(self.state, ListState::Loaded(None)) {
            self.state = ListState::Loaded(Some(Vec::new()));
        }
        match &mut self.state {
            ListState::Loading(items) | ListState::Loaded(Some(items)) => {
                mutate(items);
                true
            }
            ListState::Failed(_) => {
                log::trace!("ignoring {action} event for {key} while the list holds an error");
                false
            }
            ListState::Loaded(None) => false,
        }
    }
}

/// Index of `key`, or [`UNKNOWN_KEY_FALLBACK_INDEX`] when it is not present.
pub fn position_or_fallback<S>(items: &[KeyedItem<S>], key: &str) -> usize {
    items
        .iter()
        .position(|item| item.key == key)
        .unwrap_or(UNKNOWN_KEY_FALLBACK_INDEX)
}

fn add_child<S>(
    items: &mut Vec<KeyedItem<S>>,
    key: String,
    payload: S,
    previous_key: Option<&str>,
) {
    let index = match previous_key.filter(|previous| !previous.is_empty()) {
        None => 0,
        Some(previous) => (position_or_fallback(items, previous) + 1).min(items.len()),
    };
    items.insert(index, KeyedItem { key, payload });
}

fn change_child<S>(items: &mut [KeyedItem<S>], key: &str, payload: S) {
    let index = position_or_fallback(items, key);
    if let Some(slot) = items.get_mut(index) {
        slot.payload = payload;
    }
}

fn remove_child<S>(items: &mut Vec<KeyedItem<S>>, key: &str) {
    let index = position_or_fallback(items, key);
    if index < items.len() {
        items.remove(index);
    }
}

/// A [`ListReducer`] shared between a hook and its listener callbacks.
pub struct ListStore<S, E> {
    reducer: Arc<Mutex<ListReducer<S, E>>>,
    observers: Observers,
}

impl<S, E> Clone for ListStore<S, E> {
    fn clone(&self) -> Self {
        Self {
            reducer: self.reducer.clone(),
            observers: self.observers.clone(),
        }
    }
}

impl<S, E> Default for ListStore<S, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, E> ListStore<S, E> {
    pub fn new() -> Self {
        Self {
            reducer: Arc::new(Mutex::new(ListReducer::new())),
            observers: Observers::new(),
        }
    }

    /// Applies `action` and notifies watchers when it was not dropped.
    pub fn dispatch(&self, action: ListAction<S, E>) -> bool {
        let name = action.name();
        let applied = lock(&self.reducer).dispatch(action);
        if applied {
            log::trace!("list reducer applied {name}");
            self.observers.notify();
        }
        applied
    }

    pub fn with_state<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&ListState<S, E>) -> R,
    {
        f(lock(&self.reducer).state())
    }

    pub fn watch<F>(&self, callback: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.observers.add(callback)
    }
}

impl<S: Clone, E: Clone> ListStore<S, E> {
    pub fn state(&self) -> ListState<S, E> {
        lock(&self.reducer).state().clone()
    }

    pub fn snapshot(&self) -> LoadingHook<Vec<S>, E> {
        lock(&self.reducer).state().to_tuple()
    }
}

impl<S: fmt::Debug, E: fmt::Debug> fmt::Debug for ListStore<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListStore")
            .field("state", lock(&self.reducer).state())
            .finish()
    }
}
