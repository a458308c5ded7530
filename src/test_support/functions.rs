use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::channel::oneshot;
use serde_json::Value;

use crate::functions::{CallableOptions, CallableSource};
use crate::util::sync::lock;

use super::TestError;

type Handler = Arc<dyn Fn(Value) -> Result<Value, TestError> + Send + Sync>;
type Held = oneshot::Receiver<Result<Value, TestError>>;

#[derive(Default)]
struct Inner {
    handlers: Mutex<HashMap<String, Handler>>,
    held: Mutex<VecDeque<Held>>,
    calls: Mutex<Vec<(String, Value, CallableOptions)>>,
}

/// Functions instance answering from registered handlers. Unknown names fail with
/// `functions/not-found`.
#[derive(Clone, Default)]
pub struct MemoryFunctions {
    inner: Arc<Inner>,
}

impl MemoryFunctions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond<F>(&self, name: &str, handler: F)
    where
        F: Fn(Value) -> Result<Value, TestError> + Send + Sync + 'static,
    {
        lock(&self.inner.handlers).insert(name.to_string(), Arc::new(handler));
    }

    /// The next call waits for the value sent through the returned sender.
    pub fn hold_next(&self) -> oneshot::Sender<Result<Value, TestError>> {
        let (sender, receiver) = oneshot::channel();
        lock(&self.inner.held).push_back(receiver);
        sender
    }

    pub fn calls(&self) -> Vec<(String, Value, CallableOptions)> {
        lock(&self.inner.calls).clone()
    }
}

#[async_trait]
impl CallableSource<Value, Value> for MemoryFunctions {
    type Error = TestError;

    async fn call(
        &self,
        name: &str,
        data: Value,
        options: CallableOptions,
    ) -> Result<Value, TestError> {
        lock(&self.inner.calls).push((name.to_string(), data.clone(), options));

        let held = lock(&self.inner.held).pop_front();
        if let Some(receiver) = held {
            return receiver
                .await
                .unwrap_or_else(|_| Err(TestError::new("functions/cancelled")));
        }

        let handler = lock(&self.inner.handlers).get(name).cloned();
        match handler {
            Some(handler) => handler(data),
            None => Err(TestError::new("functions/not-found")),
        }
    }
}

impl std::fmt::Debug for MemoryFunctions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryFunctions")
            .field("calls", &lock(&self.inner.calls).len())
            .finish()
    }
}
