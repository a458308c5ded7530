use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

/// A storage object reference whose download URL can be resolved.
#[async_trait]
pub trait StorageSource: Clone + Send + Sync + 'static {
    type Error: Clone + fmt::Debug + Send + Sync + 'static;

    /// Object path inside the bucket; two references are equivalent when their paths match.
    fn full_path(&self) -> &str;

    async fn download_url(&self) -> Result<String, Self::Error>;
}

/// Bytes sent so far for one upload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UploadProgress {
    pub bytes_transferred: u64,
    pub total_bytes: u64,
}

impl UploadProgress {
    pub fn new(bytes_transferred: u64, total_bytes: u64) -> Self {
        Self {
            bytes_transferred,
            total_bytes,
        }
    }
}

/// Metadata sent along with uploaded bytes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_control: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_metadata: Option<BTreeMap<String, String>>,
}

impl UploadMetadata {
    pub fn with_content_type(content_type: impl Into<String>) -> Self {
        Self {
            content_type: Some(content_type.into()),
            ..Self::default()
        }
    }
}

pub type ProgressCallback = Arc<dyn Fn(UploadProgress) + Send + Sync + 'static>;

/// A storage reference that accepts uploads.
#[async_trait]
pub trait UploadSource: StorageSource {
    /// What the bucket reports about the stored object once the upload completes.
    type Metadata: Clone + Send + Sync + 'static;

    /// Uploads `data`, reporting progress through `on_progress` while bytes are sent.
    async fn upload_bytes(
        &self,
        data: Vec<u8>,
        metadata: Option<UploadMetadata>,
        on_progress: ProgressCallback,
    ) -> Result<Self::Metadata, Self::Error>;
}
