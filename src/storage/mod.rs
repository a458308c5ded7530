//! # Cloud Storage hooks
//!
//! [`use_download_url`] resolves the download URL of an object reference. References are
//! compared by their full path.
//!
//! [`use_upload_file`] uploads bytes to a reference and reports the progress of the upload.

pub mod download_url;
pub mod source;
pub mod upload_file;

#[doc(inline)]
pub use download_url::{use_download_url, DownloadUrlHook};

#[doc(inline)]
pub use source::{
    ProgressCallback, StorageSource, UploadMetadata, UploadProgress, UploadSource,
};

#[doc(inline)]
pub use upload_file::{use_upload_file, UploadFileHook, UploadResult};
