use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::database::helpers::{snapshot_to_data, ValOptions};
use crate::database::source::QuerySource;
use crate::error::HookResult;
use crate::util::json::from_data;
use crate::util::listen::ValueListener;
use crate::util::loading_value::{LoadingHook, LoadingState};
use crate::util::subscribe::{ResultCallback, Subscription};

/// Live value of a single database location.
pub struct ObjectHook<Q: QuerySource> {
    inner: ValueListener<Q, Q::Snapshot, Q::Error>,
}

/// Mounts an [`ObjectHook`] for `query`.
pub fn use_object<Q: QuerySource>(query: Option<Q>) -> ObjectHook<Q> {
    ObjectHook::new(query)
}

impl<Q: QuerySource> ObjectHook<Q> {
    pub fn new(query: Option<Q>) -> Self {
        let inner = ValueListener::new(
            query,
            |left: &Q, right: &Q| left.is_equal(right),
            |query: &Q, callback: ResultCallback<Option<Q::Snapshot>, Q::Error>| {
                query.on_value(Arc::new(move |result: Result<Q::Snapshot, Q::Error>| {
                    callback(result.map(Some))
                }))
            },
        );
        Self { inner }
    }

    /// Re-evaluates the hook with the caller's current query; returns whether it resubscribed.
    pub fn update(&mut self, query: Option<Q>) -> bool {
        self.inner.update(query)
    }

    pub fn query(&self) -> Option<&Q> {
        self.inner.reference()
    }

    pub fn state(&self) -> LoadingState<Q::Snapshot, Q::Error> {
        self.inner.state()
    }

    /// `(snapshot, loading, error)`.
    pub fn snapshot(&self) -> LoadingHook<Q::Snapshot, Q::Error> {
        self.inner.snapshot()
    }

    /// `(data, loading, error)`; `data` is `None` when nothing exists at the location.
    pub fn val(&self, options: &ValOptions) -> LoadingHook<Value, Q::Error> {
        self.inner.value().with_state(|state| {
            let data = state
                .value()
                .and_then(|snapshot| snapshot_to_data(snapshot, options));
            (data, state.is_loading(), state.error().cloned())
        })
    }

    /// Typed variant of [`ObjectHook::val`].
    pub fn val_as<T: DeserializeOwned>(
        &self,
        options: &ValOptions,
    ) -> HookResult<LoadingHook<T, Q::Error>> {
        let (data, loading, error) = self.val(options);
        let data = data.map(from_data).transpose()?;
        Ok((data, loading, error))
    }

    pub fn watch<F>(&self, callback: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.inner.watch(callback)
    }
}

impl<Q> fmt::Debug for ObjectHook<Q>
where
    Q: QuerySource + fmt::Debug,
    Q::Snapshot: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectHook")
            .field("inner", &self.inner)
            .finish()
    }
}
