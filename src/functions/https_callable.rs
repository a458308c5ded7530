use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex};

use futures::future::{BoxFuture, FutureExt};

use crate::error::{invalid_argument, HookResult};
use crate::functions::source::{CallableOptions, CallableSource};
use crate::util::subscribe::{Observers, Subscription};
use crate::util::sync::lock;

#[derive(Debug)]
struct CallState<E> {
    in_flight: usize,
    error: Option<E>,
}

/// Action-style hook around a callable function: `call` runs it, while `loading` and `error`
/// describe the calls made through this hook.
///
/// `loading` starts out `false`. Starting a call clears the previous error; a failed call
/// stores its error and resolves to `None`.
pub struct HttpsCallableHook<S, Request, Response>
where
    S: CallableSource<Request, Response>,
    Request: Send + 'static,
    Response: Send + 'static,
{
    functions: S,
    name: String,
    state: Arc<Mutex<CallState<S::Error>>>,
    observers: Observers,
    _marker: PhantomData<fn(Request) -> Response>,
}

/// Binds a hook to the function `name`; an empty name is rejected.
pub fn use_https_callable<S, Request, Response>(
    functions: S,
    name: &str,
) -> HookResult<HttpsCallableHook<S, Request, Response>>
where
    S: CallableSource<Request, Response>,
    Request: Send + 'static,
    Response: Send + 'static,
{
    HttpsCallableHook::new(functions, name)
}

impl<S, Request, Response> HttpsCallableHook<S, Request, Response>
where
    S: CallableSource<Request, Response>,
    Request: Send + 'static,
    Response: Send + 'static,
{
    pub fn new(functions: S, name: &str) -> HookResult<Self> {
        let name = name.trim().trim_matches('/');
        if name.is_empty() {
            return Err(invalid_argument("Function name must not be empty"));
        }
        Ok(Self {
            functions,
            name: name.to_string(),
            state: Arc::new(Mutex::new(CallState {
                in_flight: 0,
                error: None,
            })),
            observers: Observers::new(),
            _marker: PhantomData,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, data: Request) -> BoxFuture<'static, Option<Response>> {
        self.call_with_options(data, CallableOptions::default())
    }

    pub fn call_with_options(
        &self,
        data: Request,
        options: CallableOptions,
    ) -> BoxFuture<'static, Option<Response>> {
        {
            let mut state = lock(&self.state);
            state.in_flight += 1;
            state.error = None;
        }
        self.observers.notify();
        log::debug!("calling function {}", self.name);

        let functions = self.functions.clone();
        let name = self.name.clone();
        let state = self.state.clone();
        let observers = self.observers.clone();
        async move {
            let result = functions.call(&name, data, options).await;
            let response = {
                let mut state = lock(&state);
                state.in_flight = state.in_flight.saturating_sub(1);
                match result {
                    Ok(response) => Some(response),
                    Err(err) => {
                        log::warn!("function {name} failed: {err:?}");
                        state.error = Some(err);
                        None
                    }
                }
            };
            observers.notify();
            response
        }
        .boxed()
    }

    pub fn loading(&self) -> bool {
        lock(&self.state).in_flight > 0
    }

    pub fn error(&self) -> Option<S::Error> {
        lock(&self.state).error.clone()
    }

    /// `(loading, error)`; the call itself is [`HttpsCallableHook::call`].
    pub fn snapshot(&self) -> (bool, Option<S::Error>) {
        let state = lock(&self.state);
        (state.in_flight > 0, state.error.clone())
    }

    pub fn watch<F>(&self, callback: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.observers.add(callback)
    }
}

impl<S, Request, Response> fmt::Debug for HttpsCallableHook<S, Request, Response>
where
    S: CallableSource<Request, Response>,
    Request: Send + 'static,
    Response: Send + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpsCallableHook")
            .field("name", &self.name)
            .field("state", &*lock(&self.state))
            .finish()
    }
}
