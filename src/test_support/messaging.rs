use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::messaging::MessagingSource;
use crate::util::sync::lock;

use super::TestError;

/// Messaging instance handing out `token:{name}`, or failing with
/// `messaging/permission-blocked` when notifications are denied.
#[derive(Clone, Debug)]
pub struct MemoryMessaging {
    name: String,
    granted: bool,
    requests: Arc<Mutex<Vec<Option<String>>>>,
}

impl MemoryMessaging {
    pub fn granted(name: &str) -> Self {
        Self {
            name: name.to_string(),
            granted: true,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn denied(name: &str) -> Self {
        Self {
            granted: false,
            ..Self::granted(name)
        }
    }

    /// VAPID keys of every token request so far.
    pub fn requests(&self) -> Vec<Option<String>> {
        lock(&self.requests).clone()
    }
}

#[async_trait]
impl MessagingSource for MemoryMessaging {
    type Error = TestError;

    fn is_equal(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.requests, &other.requests)
    }

    async fn get_token(&self, vapid_key: Option<&str>) -> Result<String, TestError> {
        lock(&self.requests).push(vapid_key.map(str::to_string));
        if !self.granted {
            return Err(TestError::new("messaging/permission-blocked"));
        }
        Ok(format!("token:{}", self.name))
    }
}
