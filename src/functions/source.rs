use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

const DEFAULT_TIMEOUT_MS: u64 = 70_000;

/// Per-call options, mirroring `HttpsCallableOptions`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CallableOptions {
    pub timeout: Duration,
    pub limited_use_app_check_tokens: bool,
}

impl Default for CallableOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            limited_use_app_check_tokens: false,
        }
    }
}

/// A functions instance able to invoke callable functions by name.
#[async_trait]
pub trait CallableSource<Request, Response>: Clone + Send + Sync + 'static
where
    Request: Send + 'static,
    Response: Send + 'static,
{
    type Error: Clone + fmt::Debug + Send + Sync + 'static;

    async fn call(
        &self,
        name: &str,
        data: Request,
        options: CallableOptions,
    ) -> Result<Response, Self::Error>;
}
