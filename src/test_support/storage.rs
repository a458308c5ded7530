use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::channel::oneshot;
use serde_json::{json, Value};

use crate::storage::{ProgressCallback, StorageSource, UploadMetadata, UploadProgress, UploadSource};
use crate::util::sync::lock;

use super::TestError;

#[derive(Default)]
struct Uploads {
    received: Mutex<Vec<Vec<u8>>>,
    held: Mutex<Option<oneshot::Receiver<()>>>,
}

/// Object reference with a URL of `https://storage.test/{path}`. Uploads report progress once
/// before sending and once after; a read-only object rejects them with `storage/unauthorized`.
#[derive(Clone)]
pub struct MemoryObject {
    path: String,
    exists: bool,
    writable: bool,
    resolutions: Arc<AtomicUsize>,
    uploads: Arc<Uploads>,
}

impl MemoryObject {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            exists: true,
            writable: true,
            resolutions: Arc::new(AtomicUsize::new(0)),
            uploads: Arc::new(Uploads::default()),
        }
    }

    pub fn missing(path: &str) -> Self {
        Self {
            exists: false,
            ..Self::new(path)
        }
    }

    pub fn read_only(path: &str) -> Self {
        Self {
            writable: false,
            ..Self::new(path)
        }
    }

    pub fn resolutions(&self) -> usize {
        self.resolutions.load(Ordering::SeqCst)
    }

    pub fn uploads(&self) -> Vec<Vec<u8>> {
        lock(&self.uploads.received).clone()
    }

    /// The next upload pauses after its first progress report until the sender fires.
    pub fn hold_next_upload(&self) -> oneshot::Sender<()> {
        let (sender, receiver) = oneshot::channel();
        *lock(&self.uploads.held) = Some(receiver);
        sender
    }
}

#[async_trait]
impl StorageSource for MemoryObject {
    type Error = TestError;

    fn full_path(&self) -> &str {
        &self.path
    }

    async fn download_url(&self) -> Result<String, TestError> {
        self.resolutions.fetch_add(1, Ordering::SeqCst);
        if !self.exists {
            return Err(TestError::new("storage/object-not-found"));
        }
        Ok(format!("https://storage.test/{}", self.path))
    }
}

#[async_trait]
impl UploadSource for MemoryObject {
    type Metadata = Value;

    async fn upload_bytes(
        &self,
        data: Vec<u8>,
        metadata: Option<UploadMetadata>,
        on_progress: ProgressCallback,
    ) -> Result<Value, TestError> {
        let total = data.len() as u64;
        on_progress(UploadProgress::new(0, total));
        if !self.writable {
            return Err(TestError::new("storage/unauthorized"));
        }

        let held = lock(&self.uploads.held).take();
        if let Some(receiver) = held {
            receiver
                .await
                .map_err(|_| TestError::new("storage/canceled"))?;
        }

        lock(&self.uploads.received).push(data);
        on_progress(UploadProgress::new(total, total));

        let mut stored = json!({"fullPath": self.path, "size": total});
        if let Some(content_type) = metadata.and_then(|metadata| metadata.content_type) {
            stored["contentType"] = Value::String(content_type);
        }
        Ok(stored)
    }
}

impl std::fmt::Debug for MemoryObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryObject")
            .field("path", &self.path)
            .field("exists", &self.exists)
            .finish()
    }
}
