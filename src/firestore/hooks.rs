use std::fmt;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::HookResult;
use crate::firestore::helpers::{document_to_data, query_to_data, DataOptions};
use crate::firestore::source::{
    DocumentSnapshotLike, GetOptions, QuerySnapshotLike, SnapshotListenOptions, SnapshotSource,
};
use crate::util::json::{from_data, from_data_list};
use crate::util::listen::ValueListener;
use crate::util::loading_value::{LoadingHook, LoadingState};
use crate::util::once::OnceLoader;
use crate::util::subscribe::{ResultCallback, Subscription};

/// Live snapshot of a document reference or a query.
pub struct SnapshotHook<R: SnapshotSource> {
    inner: ValueListener<R, R::Snapshot, R::Error>,
}

/// Mounts a [`SnapshotHook`] following the document at `reference`.
pub fn use_document<R>(reference: Option<R>, options: SnapshotListenOptions) -> SnapshotHook<R>
where
    R: SnapshotSource,
    R::Snapshot: DocumentSnapshotLike,
{
    SnapshotHook::new(reference, options)
}

/// Mounts a [`SnapshotHook`] following the results of `query`.
pub fn use_collection<R>(query: Option<R>, options: SnapshotListenOptions) -> SnapshotHook<R>
where
    R: SnapshotSource,
    R::Snapshot: QuerySnapshotLike,
{
    SnapshotHook::new(query, options)
}

impl<R: SnapshotSource> SnapshotHook<R> {
    pub fn new(reference: Option<R>, options: SnapshotListenOptions) -> Self {
        let inner = ValueListener::new(
            reference,
            |left: &R, right: &R| left.is_equal(right),
            move |reference: &R, callback: ResultCallback<Option<R::Snapshot>, R::Error>| {
                reference.on_snapshot(
                    options,
                    Arc::new(move |result: Result<R::Snapshot, R::Error>| {
                        callback(result.map(Some))
                    }),
                )
            },
        );
        Self { inner }
    }

    pub fn update(&mut self, reference: Option<R>) -> bool {
        self.inner.update(reference)
    }

    pub fn reference(&self) -> Option<&R> {
        self.inner.reference()
    }

    pub fn state(&self) -> LoadingState<R::Snapshot, R::Error> {
        self.inner.state()
    }

    pub fn snapshot(&self) -> LoadingHook<R::Snapshot, R::Error> {
        self.inner.snapshot()
    }

    pub fn watch<F>(&self, callback: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.inner.watch(callback)
    }
}

impl<R> SnapshotHook<R>
where
    R: SnapshotSource,
    R::Snapshot: DocumentSnapshotLike,
{
    /// `(data, loading, error)`; `data` is `None` while loading or when the document is missing.
    pub fn data(&self, options: &DataOptions) -> LoadingHook<Value, R::Error> {
        document_data(self.snapshot(), options)
    }

    pub fn data_as<T: DeserializeOwned>(
        &self,
        options: &DataOptions,
    ) -> HookResult<LoadingHook<T, R::Error>> {
        decode(self.data(options))
    }
}

impl<R> SnapshotHook<R>
where
    R: SnapshotSource,
    R::Snapshot: QuerySnapshotLike,
{
    /// `(documents, loading, error)` with the data of every existing document in query order.
    pub fn docs_data(&self, options: &DataOptions) -> LoadingHook<Vec<Value>, R::Error> {
        collection_data(self.snapshot(), options)
    }

    pub fn docs_data_as<T: DeserializeOwned>(
        &self,
        options: &DataOptions,
    ) -> HookResult<LoadingHook<Vec<T>, R::Error>> {
        decode_list(self.docs_data(options))
    }
}

impl<R> fmt::Debug for SnapshotHook<R>
where
    R: SnapshotSource + fmt::Debug,
    R::Snapshot: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnapshotHook")
            .field("inner", &self.inner)
            .finish()
    }
}

/// Snapshot of a document reference or a query read once with `get()`.
///
/// Loads are futures the caller drives; see [`OnceLoader`].
pub struct SnapshotOnceHook<R: SnapshotSource> {
    loader: OnceLoader<R, R::Snapshot, R::Error>,
}

/// Mounts a [`SnapshotOnceHook`] for a document along with the future of its first read.
pub fn use_document_once<R>(
    reference: Option<R>,
    options: GetOptions,
) -> (SnapshotOnceHook<R>, BoxFuture<'static, ()>)
where
    R: SnapshotSource,
    R::Snapshot: DocumentSnapshotLike,
{
    SnapshotOnceHook::mount(reference, options)
}

/// Query counterpart of [`use_document_once`].
pub fn use_collection_once<R>(
    query: Option<R>,
    options: GetOptions,
) -> (SnapshotOnceHook<R>, BoxFuture<'static, ()>)
where
    R: SnapshotSource,
    R::Snapshot: QuerySnapshotLike,
{
    SnapshotOnceHook::mount(query, options)
}

impl<R: SnapshotSource> SnapshotOnceHook<R> {
    pub fn new(reference: Option<R>, options: GetOptions) -> Self {
        let loader = OnceLoader::new(
            reference,
            |left: &R, right: &R| left.is_equal(right),
            move |reference: &R| {
                let reference = reference.clone();
                async move { reference.get(options).await }.boxed()
            },
        );
        Self { loader }
    }

    fn mount(reference: Option<R>, options: GetOptions) -> (Self, BoxFuture<'static, ()>) {
        let mut hook = Self::new(reference, options);
        let first_load = hook.load();
        (hook, first_load)
    }

    /// Reads the stored reference unless that already happened.
    pub fn load(&mut self) -> BoxFuture<'static, ()> {
        self.loader.load()
    }

    /// Feeds the caller's current reference and returns the read it requires, if any.
    pub fn update(&mut self, reference: Option<R>) -> BoxFuture<'static, ()> {
        self.loader.update(reference)
    }

    pub fn reload(&mut self) -> BoxFuture<'static, ()> {
        self.loader.reload()
    }

    pub fn reference(&self) -> Option<&R> {
        self.loader.reference()
    }

    pub fn snapshot(&self) -> LoadingHook<R::Snapshot, R::Error> {
        self.loader.snapshot()
    }

    pub fn watch<F>(&self, callback: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.loader.watch(callback)
    }
}

impl<R> SnapshotOnceHook<R>
where
    R: SnapshotSource,
    R::Snapshot: DocumentSnapshotLike,
{
    pub fn data(&self, options: &DataOptions) -> LoadingHook<Value, R::Error> {
        document_data(self.snapshot(), options)
    }

    pub fn data_as<T: DeserializeOwned>(
        &self,
        options: &DataOptions,
    ) -> HookResult<LoadingHook<T, R::Error>> {
        decode(self.data(options))
    }
}

impl<R> SnapshotOnceHook<R>
where
    R: SnapshotSource,
    R::Snapshot: QuerySnapshotLike,
{
    pub fn docs_data(&self, options: &DataOptions) -> LoadingHook<Vec<Value>, R::Error> {
        collection_data(self.snapshot(), options)
    }

    pub fn docs_data_as<T: DeserializeOwned>(
        &self,
        options: &DataOptions,
    ) -> HookResult<LoadingHook<Vec<T>, R::Error>> {
        decode_list(self.docs_data(options))
    }
}

impl<R: SnapshotSource + fmt::Debug> fmt::Debug for SnapshotOnceHook<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnapshotOnceHook")
            .field("loader", &self.loader)
            .finish()
    }
}

fn document_data<D: DocumentSnapshotLike, E>(
    (snapshot, loading, error): LoadingHook<D, E>,
    options: &DataOptions,
) -> LoadingHook<Value, E> {
    let data = snapshot.and_then(|snapshot| document_to_data(&snapshot, options));
    (data, loading, error)
}

fn collection_data<Q: QuerySnapshotLike, E>(
    (snapshot, loading, error): LoadingHook<Q, E>,
    options: &DataOptions,
) -> LoadingHook<Vec<Value>, E> {
    let data = snapshot.map(|snapshot| query_to_data(&snapshot, options));
    (data, loading, error)
}

fn decode<T: DeserializeOwned, E>(
    (data, loading, error): LoadingHook<Value, E>,
) -> HookResult<LoadingHook<T, E>> {
    Ok((data.map(from_data).transpose()?, loading, error))
}

fn decode_list<T: DeserializeOwned, E>(
    (data, loading, error): LoadingHook<Vec<Value>, E>,
) -> HookResult<LoadingHook<Vec<T>, E>> {
    Ok((data.map(from_data_list).transpose()?, loading, error))
}
