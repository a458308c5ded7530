use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::{Map, Value};

use crate::database::{
    ChildCallback, ChildEvent, ChildEventType, ChildSnapshot, QuerySource, ValueCallback,
};
use crate::util::subscribe::Subscription;
use crate::util::sync::lock;

pub use super::TestError;

#[derive(Clone, Debug, PartialEq)]
pub struct TestSnapshot {
    key: Option<String>,
    value: Value,
}

impl TestSnapshot {
    pub fn child(key: &str, value: Value) -> Self {
        Self {
            key: Some(key.to_string()),
            value,
        }
    }

    pub fn root(value: Value) -> Self {
        Self { key: None, value }
    }
}

impl ChildSnapshot for TestSnapshot {
    fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    fn value(&self) -> &Value {
        &self.value
    }
}

#[derive(Clone)]
enum Callback {
    Value(ValueCallback<TestSnapshot, TestError>),
    Child(ChildEventType, ChildCallback<TestSnapshot, TestError>),
}

#[derive(Default)]
struct Inner {
    next_id: AtomicU64,
    registrations: AtomicUsize,
    active: Mutex<Vec<(u64, Callback)>>,
    retired: Mutex<Vec<Callback>>,
    children: Mutex<Vec<(String, Value)>>,
    failure: Mutex<Option<TestError>>,
}

/// In-memory stand-in for a Realtime Database query.
///
/// A synchronous query replays its seeded data while a listener registers, the way the SDK's
/// in-memory backend does. A deferred query only delivers what the test emits. Cancelled
/// listeners are kept aside so tests can deliver late events to them.
#[derive(Clone)]
pub struct MemoryQuery {
    path: String,
    synchronous: bool,
    inner: Arc<Inner>,
}

impl MemoryQuery {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            synchronous: true,
            inner: Arc::new(Inner::default()),
        }
    }

    pub fn deferred(path: &str) -> Self {
        Self {
            synchronous: false,
            ..Self::new(path)
        }
    }

    pub fn seed(&self, children: &[(&str, Value)]) {
        *lock(&self.inner.children) = children
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect();
    }

    pub fn fail_registrations(&self, error: TestError) {
        *lock(&self.inner.failure) = Some(error);
    }

    pub fn registrations(&self) -> usize {
        self.inner.registrations.load(Ordering::SeqCst)
    }

    pub fn active_listeners(&self) -> usize {
        lock(&self.inner.active).len()
    }

    pub fn deliver_value(&self, value: Value) {
        for callback in self.active_callbacks() {
            if let Callback::Value(callback) = callback {
                callback(Ok(TestSnapshot::root(value.clone())));
            }
        }
    }

    pub fn emit_added(&self, key: &str, value: Value, previous: Option<&str>) {
        self.emit_child(
            self.active_callbacks(),
            ChildEventType::Added,
            key,
            value,
            previous,
        );
    }

    pub fn emit_changed(&self, key: &str, value: Value) {
        self.emit_child(
            self.active_callbacks(),
            ChildEventType::Changed,
            key,
            value,
            None,
        );
    }

    pub fn emit_moved(&self, key: &str, value: Value, previous: Option<&str>) {
        self.emit_child(
            self.active_callbacks(),
            ChildEventType::Moved,
            key,
            value,
            previous,
        );
    }

    pub fn emit_removed(&self, key: &str) {
        self.emit_child(
            self.active_callbacks(),
            ChildEventType::Removed,
            key,
            Value::Null,
            None,
        );
    }

    /// Delivers an add to listeners that were already cancelled.
    pub fn emit_added_to_retired(&self, key: &str, value: Value, previous: Option<&str>) {
        let retired = lock(&self.inner.retired).clone();
        self.emit_child(retired, ChildEventType::Added, key, value, previous);
    }

    pub fn emit_error(&self, error: TestError) {
        for callback in self.active_callbacks() {
            match callback {
                Callback::Value(callback) => callback(Err(error.clone())),
                Callback::Child(_, callback) => callback(Err(error.clone())),
            }
        }
    }

    fn active_callbacks(&self) -> Vec<Callback> {
        lock(&self.inner.active)
            .iter()
            .map(|(_, callback)| callback.clone())
            .collect()
    }

    fn emit_child(
        &self,
        callbacks: Vec<Callback>,
        event_type: ChildEventType,
        key: &str,
        value: Value,
        previous: Option<&str>,
    ) {
        for callback in callbacks {
            if let Callback::Child(registered, callback) = callback {
                if registered == event_type {
                    callback(Ok(ChildEvent {
                        event_type,
                        snapshot: TestSnapshot::child(key, value.clone()),
                        previous_name: previous.map(str::to_string),
                    }));
                }
            }
        }
    }

    fn current_value(&self) -> Value {
        let children = lock(&self.inner.children).clone();
        if children.is_empty() {
            return Value::Null;
        }
        Value::Object(children.into_iter().collect::<Map<String, Value>>())
    }

    fn replay(&self, callback: &Callback) {
        match callback {
            Callback::Value(callback) => callback(Ok(TestSnapshot::root(self.current_value()))),
            Callback::Child(ChildEventType::Added, callback) => {
                let children = lock(&self.inner.children).clone();
                let mut previous: Option<String> = None;
                for (key, value) in children {
                    callback(Ok(ChildEvent {
                        event_type: ChildEventType::Added,
                        snapshot: TestSnapshot::child(&key, value),
                        previous_name: previous.clone(),
                    }));
                    previous = Some(key);
                }
            }
            Callback::Child(_, _) => {}
        }
    }

    fn register(&self, callback: Callback) -> Result<Subscription, TestError> {
        self.inner.registrations.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = lock(&self.inner.failure).clone() {
            return Err(error);
        }

        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
        lock(&self.inner.active).push((id, callback.clone()));
        if self.synchronous {
            self.replay(&callback);
        }

        let inner = Arc::downgrade(&self.inner);
        Ok(Subscription::new(move || {
            let Some(inner) = inner.upgrade() else {
                return;
            };
            let mut active = lock(&inner.active);
            if let Some(position) = active.iter().position(|(entry, _)| *entry == id) {
                let (_, callback) = active.remove(position);
                lock(&inner.retired).push(callback);
            }
        }))
    }
}

impl QuerySource for MemoryQuery {
    type Snapshot = TestSnapshot;
    type Error = TestError;

    fn is_equal(&self, other: &Self) -> bool {
        self.path == other.path
    }

    fn on_value(
        &self,
        callback: ValueCallback<TestSnapshot, TestError>,
    ) -> Result<Subscription, TestError> {
        self.register(Callback::Value(callback))
    }

    fn on_child(
        &self,
        event_type: ChildEventType,
        callback: ChildCallback<TestSnapshot, TestError>,
    ) -> Result<Subscription, TestError> {
        self.register(Callback::Child(event_type, callback))
    }
}

impl std::fmt::Debug for MemoryQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryQuery")
            .field("path", &self.path)
            .field("synchronous", &self.synchronous)
            .finish()
    }
}
