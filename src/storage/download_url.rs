use std::fmt;

use futures::future::{BoxFuture, FutureExt};

use crate::storage::source::StorageSource;
use crate::util::loading_value::LoadingHook;
use crate::util::once::OnceLoader;
use crate::util::subscribe::Subscription;

/// Download URL of a storage object, resolved once per reference.
pub struct DownloadUrlHook<S: StorageSource> {
    loader: OnceLoader<S, String, S::Error>,
}

/// Mounts a [`DownloadUrlHook`] along with the future that resolves the first URL.
pub fn use_download_url<S: StorageSource>(
    reference: Option<S>,
) -> (DownloadUrlHook<S>, BoxFuture<'static, ()>) {
    let mut hook = DownloadUrlHook::new(reference);
    let first_load = hook.load();
    (hook, first_load)
}

impl<S: StorageSource> DownloadUrlHook<S> {
    pub fn new(reference: Option<S>) -> Self {
        let loader = OnceLoader::new(
            reference,
            |left: &S, right: &S| left.full_path() == right.full_path(),
            |reference: &S| {
                let reference = reference.clone();
                async move { reference.download_url().await }.boxed()
            },
        );
        Self { loader }
    }

    /// Resolves the URL of the stored reference if that has not happened yet.
    pub fn load(&mut self) -> BoxFuture<'static, ()> {
        self.loader.load()
    }

    /// Feeds the caller's current reference; a reference with another path resets the hook
    /// and the returned future resolves the new URL.
    pub fn update(&mut self, reference: Option<S>) -> BoxFuture<'static, ()> {
        self.loader.update(reference)
    }

    pub fn reference(&self) -> Option<&S> {
        self.loader.reference()
    }

    /// `(url, loading, error)`.
    pub fn snapshot(&self) -> LoadingHook<String, S::Error> {
        self.loader.snapshot()
    }

    pub fn watch<F>(&self, callback: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.loader.watch(callback)
    }
}

impl<S: StorageSource + fmt::Debug> fmt::Debug for DownloadUrlHook<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadUrlHook")
            .field("loader", &self.loader)
            .finish()
    }
}
