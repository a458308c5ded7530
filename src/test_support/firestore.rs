use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use crate::firestore::{
    DocumentSnapshotLike, GetOptions, QuerySnapshotLike, SnapshotCallback, SnapshotListenOptions,
    SnapshotSource,
};
use crate::util::subscribe::Subscription;
use crate::util::sync::lock;

use super::TestError;

#[derive(Clone, Debug, PartialEq)]
pub struct TestDocument {
    path: String,
    data: Option<Value>,
}

impl TestDocument {
    pub fn new(path: &str, data: Value) -> Self {
        Self {
            path: path.to_string(),
            data: Some(data),
        }
    }

    pub fn missing(path: &str) -> Self {
        Self {
            path: path.to_string(),
            data: None,
        }
    }
}

impl DocumentSnapshotLike for TestDocument {
    fn id(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or_default()
    }

    fn exists(&self) -> bool {
        self.data.is_some()
    }

    fn data(&self) -> Option<Value> {
        self.data.clone()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TestQuerySnapshot {
    documents: Vec<TestDocument>,
}

impl TestQuerySnapshot {
    pub fn new(documents: Vec<TestDocument>) -> Self {
        Self { documents }
    }
}

impl QuerySnapshotLike for TestQuerySnapshot {
    type Document = TestDocument;

    fn documents(&self) -> &[TestDocument] {
        &self.documents
    }
}

struct Inner<S> {
    next_id: AtomicU64,
    reads: AtomicUsize,
    current: Mutex<Option<Result<S, TestError>>>,
    listeners: Mutex<Vec<(u64, SnapshotCallback<S, TestError>)>>,
    listen_options: Mutex<Option<SnapshotListenOptions>>,
    get_options: Mutex<Option<GetOptions>>,
}

/// In-memory document reference or query. Listeners receive the current snapshot while
/// registering (when there is one) and every later publication.
pub struct MemorySource<S> {
    path: String,
    inner: Arc<Inner<S>>,
}

pub type MemoryDocument = MemorySource<TestDocument>;
pub type MemoryQuery = MemorySource<TestQuerySnapshot>;

impl<S> Clone for MemorySource<S> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            inner: self.inner.clone(),
        }
    }
}

impl<S: Clone + Send + Sync + 'static> MemorySource<S> {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            inner: Arc::new(Inner {
                next_id: AtomicU64::new(0),
                reads: AtomicUsize::new(0),
                current: Mutex::new(None),
                listeners: Mutex::new(Vec::new()),
                listen_options: Mutex::new(None),
                get_options: Mutex::new(None),
            }),
        }
    }

    pub fn publish(&self, result: Result<S, TestError>) {
        *lock(&self.inner.current) = Some(result.clone());
        let listeners: Vec<_> = lock(&self.inner.listeners)
            .iter()
            .map(|(_, callback)| callback.clone())
            .collect();
        for callback in listeners {
            callback(result.clone());
        }
    }

    pub fn fail(&self, error: TestError) {
        self.publish(Err(error));
    }

    pub fn listeners(&self) -> usize {
        lock(&self.inner.listeners).len()
    }

    pub fn reads(&self) -> usize {
        self.inner.reads.load(Ordering::SeqCst)
    }

    pub fn last_listen_options(&self) -> Option<SnapshotListenOptions> {
        *lock(&self.inner.listen_options)
    }

    pub fn last_get_options(&self) -> Option<GetOptions> {
        *lock(&self.inner.get_options)
    }
}

impl MemorySource<TestDocument> {
    pub fn set(&self, data: Value) {
        self.publish(Ok(TestDocument::new(&self.path, data)));
    }

    pub fn delete(&self) {
        self.publish(Ok(TestDocument::missing(&self.path)));
    }
}

impl MemorySource<TestQuerySnapshot> {
    pub fn set(&self, documents: Vec<TestDocument>) {
        self.publish(Ok(TestQuerySnapshot::new(documents)));
    }
}

#[async_trait]
impl<S: Clone + Send + Sync + 'static> SnapshotSource for MemorySource<S> {
    type Snapshot = S;
    type Error = TestError;

    fn is_equal(&self, other: &Self) -> bool {
        self.path == other.path
    }

    fn on_snapshot(
        &self,
        options: SnapshotListenOptions,
        callback: SnapshotCallback<S, TestError>,
    ) -> Result<Subscription, TestError> {
        *lock(&self.inner.listen_options) = Some(options);
        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
        lock(&self.inner.listeners).push((id, callback.clone()));

        let current = lock(&self.inner.current).clone();
        if let Some(result) = current {
            callback(result);
        }

        let inner = Arc::downgrade(&self.inner);
        Ok(Subscription::new(move || {
            if let Some(inner) = inner.upgrade() {
                lock(&inner.listeners).retain(|(entry, _)| *entry != id);
            }
        }))
    }

    async fn get(&self, options: GetOptions) -> Result<S, TestError> {
        self.inner.reads.fetch_add(1, Ordering::SeqCst);
        *lock(&self.inner.get_options) = Some(options);
        let current = lock(&self.inner.current).clone();
        current.unwrap_or_else(|| Err(TestError::new("unavailable")))
    }
}

impl<S> std::fmt::Debug for MemorySource<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemorySource")
            .field("path", &self.path)
            .finish()
    }
}
