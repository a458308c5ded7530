use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex};

use futures::future::{BoxFuture, FutureExt};

use crate::storage::source::{ProgressCallback, UploadMetadata, UploadProgress, UploadSource};
use crate::util::subscribe::{Observers, Subscription};
use crate::util::sync::lock;

/// Outcome of a successful upload: the stored object's metadata and the reference written to.
pub struct UploadResult<S: UploadSource> {
    pub metadata: S::Metadata,
    pub reference: S,
}

impl<S: UploadSource> Clone for UploadResult<S> {
    fn clone(&self) -> Self {
        Self {
            metadata: self.metadata.clone(),
            reference: self.reference.clone(),
        }
    }
}

impl<S> fmt::Debug for UploadResult<S>
where
    S: UploadSource + fmt::Debug,
    S::Metadata: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadResult")
            .field("metadata", &self.metadata)
            .field("reference", &self.reference)
            .finish()
    }
}

#[derive(Debug)]
struct UploadState<E> {
    in_flight: usize,
    /// Id of the most recent upload; progress from older ones is ignored.
    latest: u64,
    progress: Option<UploadProgress>,
    error: Option<E>,
}

/// Action-style upload hook: `upload` sends bytes to a reference, while `uploading`, the
/// progress of the latest upload and the last error describe what this hook started.
///
/// A successful upload clears the progress; a failed one keeps the last progress seen and
/// stores the error.
pub struct UploadFileHook<S: UploadSource> {
    state: Arc<Mutex<UploadState<S::Error>>>,
    observers: Observers,
    _marker: PhantomData<fn(S)>,
}

pub fn use_upload_file<S: UploadSource>() -> UploadFileHook<S> {
    UploadFileHook::new()
}

impl<S: UploadSource> Default for UploadFileHook<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: UploadSource> UploadFileHook<S> {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(UploadState {
                in_flight: 0,
                latest: 0,
                progress: None,
                error: None,
            })),
            observers: Observers::new(),
            _marker: PhantomData,
        }
    }

    /// Uploads `data` to `reference`; resolves to `None` when the upload failed.
    pub fn upload(
        &self,
        reference: S,
        data: Vec<u8>,
        metadata: Option<UploadMetadata>,
    ) -> BoxFuture<'static, Option<UploadResult<S>>> {
        let id = {
            let mut state = lock(&self.state);
            state.in_flight += 1;
            state.latest += 1;
            state.error = None;
            state.latest
        };
        self.observers.notify();
        log::debug!("uploading {} bytes to {}", data.len(), reference.full_path());

        let progress_state = self.state.clone();
        let progress_observers = self.observers.clone();
        let on_progress: ProgressCallback = Arc::new(move |progress: UploadProgress| {
            {
                let mut state = lock(&progress_state);
                if state.latest != id {
                    return;
                }
                state.progress = Some(progress);
            }
            progress_observers.notify();
        });

        let state = self.state.clone();
        let observers = self.observers.clone();
        async move {
            let result = reference.upload_bytes(data, metadata, on_progress).await;
            let outcome = {
                let mut state = lock(&state);
                state.in_flight = state.in_flight.saturating_sub(1);
                let latest = state.latest == id;
                match result {
                    Ok(metadata) => {
                        if latest {
                            state.progress = None;
                        }
                        Some(UploadResult {
                            metadata,
                            reference,
                        })
                    }
                    Err(err) => {
                        log::warn!("upload to {} failed: {err:?}", reference.full_path());
                        state.error = Some(err);
                        None
                    }
                }
            };
            observers.notify();
            outcome
        }
        .boxed()
    }

    pub fn uploading(&self) -> bool {
        lock(&self.state).in_flight > 0
    }

    pub fn progress(&self) -> Option<UploadProgress> {
        lock(&self.state).progress
    }

    pub fn error(&self) -> Option<S::Error> {
        lock(&self.state).error.clone()
    }

    /// `(uploading, progress, error)`; the upload itself is [`UploadFileHook::upload`].
    pub fn snapshot(&self) -> (bool, Option<UploadProgress>, Option<S::Error>) {
        let state = lock(&self.state);
        (state.in_flight > 0, state.progress, state.error.clone())
    }

    pub fn watch<F>(&self, callback: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.observers.add(callback)
    }
}

impl<S: UploadSource> fmt::Debug for UploadFileHook<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadFileHook")
            .field("state", &*lock(&self.state))
            .finish()
    }
}
