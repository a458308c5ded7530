use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::util::subscribe::{ResultCallback, Subscription};
use crate::util::sync::lock;

pub type ValueCallback<S, E> = ResultCallback<S, E>;
pub type ChildCallback<S, E> = ResultCallback<ChildEvent<S>, E>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChildEventType {
    Added,
    Changed,
    Moved,
    Removed,
}

impl ChildEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChildEventType::Added => "child_added",
            ChildEventType::Changed => "child_changed",
            ChildEventType::Moved => "child_moved",
            ChildEventType::Removed => "child_removed",
        }
    }
}

/// Payload of a child listener: the child snapshot plus the key of the sibling that precedes
/// it in query order (`None` when it is first).
#[derive(Clone, Debug)]
pub struct ChildEvent<S> {
    pub event_type: ChildEventType,
    pub snapshot: S,
    pub previous_name: Option<String>,
}

/// Read access to a Realtime Database snapshot.
pub trait ChildSnapshot: Clone + Send + 'static {
    /// Last path segment of the snapshot's location; `None` at the root.
    fn key(&self) -> Option<&str>;

    fn value(&self) -> &Value;

    fn exists(&self) -> bool {
        !self.value().is_null()
    }

    /// Number of direct children.
    fn size(&self) -> usize {
        match self.value() {
            Value::Object(map) => map.len(),
            Value::Array(array) => array.len(),
            _ => 0,
        }
    }
}

/// A Realtime Database reference or query that hooks can listen to.
///
/// Implemented over the SDK's query handle by the caller; the hooks never reach for a global
/// database instance. Registrations return a [`Subscription`] whose drop detaches the listener.
pub trait QuerySource: Clone + Send + Sync + 'static {
    type Snapshot: ChildSnapshot;
    type Error: Clone + fmt::Debug + Send + Sync + 'static;

    /// Whether both handles describe the same location and query constraints.
    fn is_equal(&self, other: &Self) -> bool;

    fn on_value(
        &self,
        callback: ValueCallback<Self::Snapshot, Self::Error>,
    ) -> Result<Subscription, Self::Error>;

    fn on_child(
        &self,
        event_type: ChildEventType,
        callback: ChildCallback<Self::Snapshot, Self::Error>,
    ) -> Result<Subscription, Self::Error>;

    /// Delivers at most one value result, then detaches.
    ///
    /// The default implementation layers this over [`QuerySource::on_value`] and copes with
    /// sources that fire the current value synchronously while registering.
    fn once_value(
        &self,
        callback: ValueCallback<Self::Snapshot, Self::Error>,
    ) -> Result<Subscription, Self::Error> {
        let delivered = Arc::new(AtomicBool::new(false));
        let registration: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

        let fired = delivered.clone();
        let slot = registration.clone();
        let subscription = self.on_value(Arc::new(
            move |result: Result<Self::Snapshot, Self::Error>| {
                if fired.swap(true, Ordering::SeqCst) {
                    return;
                }
                callback(result);
                let pending = lock(&slot).take();
                if let Some(subscription) = pending {
                    subscription.cancel();
                }
            },
        ))?;

        if delivered.load(Ordering::SeqCst) {
            subscription.cancel();
            return Ok(Subscription::noop());
        }

        *lock(&registration) = Some(subscription);
        if delivered.load(Ordering::SeqCst) {
            let pending = lock(&registration).take();
            if let Some(subscription) = pending {
                subscription.cancel();
            }
        }

        Ok(Subscription::new(move || {
            let pending = lock(&registration).take();
            if let Some(subscription) = pending {
                subscription.cancel();
            }
        }))
    }
}
