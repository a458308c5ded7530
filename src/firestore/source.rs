use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

use crate::util::subscribe::{ResultCallback, Subscription};

pub type SnapshotCallback<S, E> = ResultCallback<S, E>;

/// Options forwarded to `onSnapshot`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SnapshotListenOptions {
    /// Also raise events when only the snapshot metadata changed.
    pub include_metadata_changes: bool,
}

/// Where a one-shot read is served from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GetSource {
    /// Server first, falling back to the cache when offline.
    #[default]
    Default,
    Server,
    Cache,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GetOptions {
    pub source: GetSource,
}

impl GetOptions {
    pub fn from_source(source: GetSource) -> Self {
        Self { source }
    }
}

/// Read access to a Firestore document snapshot.
pub trait DocumentSnapshotLike: Clone + Send + Sync + 'static {
    fn id(&self) -> &str;

    fn exists(&self) -> bool;

    /// Decoded fields as a JSON object; `None` when the document does not exist.
    fn data(&self) -> Option<Value>;
}

/// Read access to a Firestore query snapshot.
pub trait QuerySnapshotLike: Clone + Send + Sync + 'static {
    type Document: DocumentSnapshotLike;

    fn documents(&self) -> &[Self::Document];

    fn len(&self) -> usize {
        self.documents().len()
    }

    fn is_empty(&self) -> bool {
        self.documents().is_empty()
    }
}

/// A document reference or query the Firestore hooks can observe.
///
/// `Snapshot` is a [`DocumentSnapshotLike`] for document references and a
/// [`QuerySnapshotLike`] for queries.
#[async_trait]
pub trait SnapshotSource: Clone + Send + Sync + 'static {
    type Snapshot: Clone + Send + Sync + 'static;
    type Error: Clone + fmt::Debug + Send + Sync + 'static;

    fn is_equal(&self, other: &Self) -> bool;

    fn on_snapshot(
        &self,
        options: SnapshotListenOptions,
        callback: SnapshotCallback<Self::Snapshot, Self::Error>,
    ) -> Result<Subscription, Self::Error>;

    async fn get(&self, options: GetOptions) -> Result<Self::Snapshot, Self::Error>;
}
