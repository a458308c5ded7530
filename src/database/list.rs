use std::fmt;
use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::database::helpers::{snapshot_to_data, ValOptions};
use crate::database::list_reducer::{KeyedItem, ListAction, ListState, ListStore};
use crate::database::source::{
    ChildCallback, ChildEvent, ChildEventType, ChildSnapshot, QuerySource,
};
use crate::error::HookResult;
use crate::util::comparator_ref::ComparatorRef;
use crate::util::json::from_data_list;
use crate::util::loading_value::LoadingHook;
use crate::util::subscribe::{EpochToken, Subscription, SubscriptionEpoch};
use crate::util::sync::lock;

type Listeners = Arc<Mutex<Vec<Subscription>>>;

/// Collects the children that already exist when a `child_added` listener attaches, so they
/// reach the list as a single [`ListAction::SetAll`] instead of one add per child.
#[derive(Debug)]
pub struct InitialBatch<S> {
    remaining: usize,
    buffered: Vec<KeyedItem<S>>,
}

/// Outcome of [`InitialBatch::offer`].
#[derive(Debug)]
pub enum BatchOffer<S> {
    Buffered,
    /// The last expected child arrived; carries the whole batch in arrival order.
    Complete(Vec<KeyedItem<S>>),
    /// The batch was already complete; the event is an ordinary incremental add.
    PassThrough(ChildEvent<S>),
}

impl<S: ChildSnapshot> InitialBatch<S> {
    pub fn new(expected: usize) -> Self {
        Self {
            remaining: expected,
            buffered: Vec::with_capacity(expected),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.remaining == 0
    }

    pub fn offer(&mut self, event: ChildEvent<S>) -> BatchOffer<S> {
        if self.remaining == 0 {
            return BatchOffer::PassThrough(event);
        }
        self.remaining -= 1;
        let key = event.snapshot.key().unwrap_or_default().to_string();
        self.buffered.push(KeyedItem::new(key, event.snapshot));
        if self.remaining == 0 {
            BatchOffer::Complete(std::mem::take(&mut self.buffered))
        } else {
            BatchOffer::Buffered
        }
    }
}

/// Live, ordered list of the children under a query.
///
/// Mounting reads the current value once to learn how many children exist, then attaches the
/// `child_added` listener and folds that many initial adds into one [`ListAction::SetAll`].
/// Later adds, changes, moves and removals are applied one at a time through the
/// [`ListStore`](crate::database::list_reducer::ListStore).
pub struct ListHook<Q: QuerySource> {
    query: ComparatorRef<Q>,
    store: ListStore<Q::Snapshot, Q::Error>,
    epoch: SubscriptionEpoch,
    listeners: Listeners,
}

/// Mounts a [`ListHook`] for `query`.
pub fn use_list<Q: QuerySource>(query: Option<Q>) -> ListHook<Q> {
    ListHook::new(query)
}

impl<Q: QuerySource> ListHook<Q> {
    pub fn new(query: Option<Q>) -> Self {
        let store = ListStore::new();
        let epoch = SubscriptionEpoch::new();

        let reset_store = store.clone();
        let reset_epoch = epoch.clone();
        let query = ComparatorRef::new(query, |left: &Q, right: &Q| left.is_equal(right))
            .with_on_change(move || {
                reset_epoch.advance();
                reset_store.dispatch(ListAction::Reset);
            });

        let mut hook = Self {
            query,
            store,
            epoch,
            listeners: Arc::new(Mutex::new(Vec::new())),
        };
        hook.subscribe();
        hook
    }

    /// Re-evaluates the hook with the caller's current query. A query that is not equivalent
    /// to the stored one resets the list, detaches every listener and subscribes again.
    /// Returns whether that happened.
    pub fn update(&mut self, query: Option<Q>) -> bool {
        if !self.query.update(query) {
            return false;
        }
        self.teardown();
        self.subscribe();
        true
    }

    pub fn query(&self) -> Option<&Q> {
        self.query.current()
    }

    pub fn state(&self) -> ListState<Q::Snapshot, Q::Error> {
        self.store.state()
    }

    /// `(snapshots, loading, error)`.
    pub fn snapshot(&self) -> LoadingHook<Vec<Q::Snapshot>, Q::Error> {
        self.store.snapshot()
    }

    /// `(keys, loading, error)`.
    pub fn keys(&self) -> LoadingHook<Vec<String>, Q::Error> {
        self.store.with_state(|state| {
            let keys = state
                .items()
                .map(|items| items.iter().map(|item| item.key.clone()).collect());
            (keys, state.is_loading(), state.error().cloned())
        })
    }

    /// `(values, loading, error)` with each snapshot reduced to its data. Children that no
    /// longer exist map to `null`.
    pub fn vals(&self, options: &ValOptions) -> LoadingHook<Vec<Value>, Q::Error> {
        self.store.with_state(|state| {
            let values = state.items().map(|items| {
                items
                    .iter()
                    .map(|item| snapshot_to_data(&item.payload, options).unwrap_or(Value::Null))
                    .collect()
            });
            (values, state.is_loading(), state.error().cloned())
        })
    }

    /// Typed variant of [`ListHook::vals`].
    pub fn vals_as<T: DeserializeOwned>(
        &self,
        options: &ValOptions,
    ) -> HookResult<LoadingHook<Vec<T>, Q::Error>> {
        let (values, loading, error) = self.vals(options);
        let values = values.map(from_data_list).transpose()?;
        Ok((values, loading, error))
    }

    pub fn watch<F>(&self, callback: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.store.watch(callback)
    }

    pub fn active_listeners(&self) -> usize {
        lock(&self.listeners).len()
    }

    fn subscribe(&mut self) {
        let Some(query) = self.query.current().cloned() else {
            log::debug!("list hook mounted without a query");
            self.store.dispatch(ListAction::Empty);
            return;
        };

        let token = self.epoch.token();
        log::debug!("attaching list listeners (epoch {})", token.generation());

        let store = self.store.clone();
        let listeners = self.listeners.clone();
        let initial_token = token.clone();
        let added_query = query.clone();
        let initial = query.once_value(Arc::new(move |result: Result<Q::Snapshot, Q::Error>| {
            if !initial_token.is_current() {
                log::trace!("dropping initial list value from a superseded query");
                return;
            }
            let snapshot = match result {
                Ok(snapshot) => snapshot,
                Err(err) => {
                    log::warn!("initial list read failed: {err:?}");
                    store.dispatch(ListAction::Error(err));
                    return;
                }
            };

            let batch = InitialBatch::new(snapshot.size());
            if batch.is_complete() {
                store.dispatch(ListAction::SetAll(Some(Vec::new())));
            }
            let callback = child_callback(
                store.clone(),
                initial_token.clone(),
                Some(Arc::new(Mutex::new(batch))),
            );
            let registration = added_query.on_child(ChildEventType::Added, callback);
            retain_listener(&listeners, &store, &initial_token, registration);
        }));
        retain_listener(&self.listeners, &self.store, &token, initial);

        for event_type in [
            ChildEventType::Changed,
            ChildEventType::Moved,
            ChildEventType::Removed,
        ] {
            let callback = child_callback(self.store.clone(), token.clone(), None);
            let registration = query.on_child(event_type, callback);
            retain_listener(&self.listeners, &self.store, &token, registration);
        }
    }

    fn teardown(&mut self) {
        let listeners = std::mem::take(&mut *lock(&self.listeners));
        if !listeners.is_empty() {
            log::debug!("detaching {} list listeners", listeners.len());
        }
        for listener in listeners {
            listener.cancel();
        }
    }
}

impl<Q: QuerySource> Drop for ListHook<Q> {
    fn drop(&mut self) {
        self.epoch.advance();
        self.teardown();
    }
}

impl<Q> fmt::Debug for ListHook<Q>
where
    Q: QuerySource + fmt::Debug,
    Q::Snapshot: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListHook")
            .field("query", &self.query)
            .field("store", &self.store)
            .field("epoch", &self.epoch.generation())
            .finish()
    }
}

/// Keeps a registration while its epoch is current; otherwise cancels it straight away.
fn retain_listener<S, E: fmt::Debug>(
    listeners: &Listeners,
    store: &ListStore<S, E>,
    token: &EpochToken,
    registration: Result<Subscription, E>,
) {
    match registration {
        Ok(subscription) => {
            let mut retained = lock(listeners);
            if token.is_current() {
                retained.push(subscription);
            } else {
                drop(retained);
                subscription.cancel();
            }
        }
        Err(err) => {
            log::warn!("failed to attach list listener: {err:?}");
            if token.is_current() {
                store.dispatch(ListAction::Error(err));
            }
        }
    }
}

fn child_callback<S, E>(
    store: ListStore<S, E>,
    token: EpochToken,
    batch: Option<Arc<Mutex<InitialBatch<S>>>>,
) -> ChildCallback<S, E>
where
    S: ChildSnapshot,
    E: fmt::Debug + Send + 'static,
{
    Arc::new(move |result: Result<ChildEvent<S>, E>| {
        if !token.is_current() {
            log::trace!("dropping child event from a superseded query");
            return;
        }
        let event = match result {
            Ok(event) => event,
            Err(err) => {
                log::warn!("child listener reported an error: {err:?}");
                store.dispatch(ListAction::Error(err));
                return;
            }
        };

        let event = match &batch {
            Some(batch) => {
                let offer = lock(batch).offer(event);
                match offer {
                    BatchOffer::Buffered => return,
                    BatchOffer::Complete(items) => {
                        log::debug!("initial list batch complete with {} children", items.len());
                        store.dispatch(ListAction::SetAll(Some(items)));
                        return;
                    }
                    BatchOffer::PassThrough(event) => event,
                }
            }
            None => event,
        };
        store.dispatch(child_action(event));
    })
}

fn child_action<S: ChildSnapshot, E>(event: ChildEvent<S>) -> ListAction<S, E> {
    let key = event.snapshot.key().unwrap_or_default().to_string();
    match event.event_type {
        ChildEventType::Added => ListAction::Add {
            key,
            payload: event.snapshot,
            previous_key: event.previous_name,
        },
        ChildEventType::Changed => ListAction::Change {
            key,
            payload: event.snapshot,
        },
        ChildEventType::Moved => ListAction::Move {
            key,
            payload: event.snapshot,
            previous_key: event.previous_name,
        },
        ChildEventType::Removed => ListAction::Remove { key },
    }
}
