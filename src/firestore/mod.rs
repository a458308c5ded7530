//! # Cloud Firestore hooks
//!
//! Document and query hooks in two modes:
//!
//! - listen: [`use_document`] / [`use_collection`] keep an `onSnapshot` listener attached for
//!   as long as the hook lives;
//! - once: [`use_document_once`] / [`use_collection_once`] read with `get()` and hand the caller
//!   a future to drive.
//!
//! The `data` / `docs_data` projections return plain JSON (optionally with the document id
//! merged under [`DataOptions::id_field`]) and `*_as::<T>()` decodes it with `serde`.
//!
//! ## Example
//!
//! ```ignore
//! use firebase_rs_hooks::firestore::{use_document, DataOptions, SnapshotListenOptions};
//!
//! let mut profile = use_document(Some(user_doc.clone()), SnapshotListenOptions::default());
//! let (data, loading, error) = profile.data(&DataOptions::with_id_field("uid"));
//! ```

pub mod helpers;
pub mod hooks;
pub mod source;

#[doc(inline)]
pub use helpers::{document_to_data, query_to_data, DataOptions};

#[doc(inline)]
pub use hooks::{
    use_collection, use_collection_once, use_document, use_document_once, SnapshotHook,
    SnapshotOnceHook,
};

#[doc(inline)]
pub use source::{
    DocumentSnapshotLike, GetOptions, GetSource, QuerySnapshotLike, SnapshotCallback,
    SnapshotListenOptions, SnapshotSource,
};
