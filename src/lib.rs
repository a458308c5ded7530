//! # firebase-rs-hooks
//!
//! Loading-state hooks over Firebase listeners.
//!
//! Every hook owns a `(value, loading, error)` state, subscribes to the reference it was given,
//! moves its listeners when a non-equivalent reference comes in through `update` and detaches
//! them when dropped. Callers re-read the state through `snapshot()` and get change
//! notifications through `watch()`.
//!
//! The SDK is reached only through the seam traits each module declares
//! ([`database::QuerySource`], [`firestore::SnapshotSource`], [`auth::AuthSource`],
//! [`storage::StorageSource`] and [`storage::UploadSource`], [`functions::CallableSource`],
//! [`messaging::MessagingSource`]); implement them over the handles your application already
//! holds.
//!
//! The Realtime Database list hook is the centrepiece: [`database::ListReducer`] keeps an
//! ordered keyed list in step with `child_*` events, and [`database::ListHook`] folds the
//! children that exist at subscription time into a single update.

pub mod auth;
pub mod database;
pub mod error;
pub mod firestore;
pub mod functions;
pub mod messaging;
pub mod storage;
pub mod util;

#[cfg(test)]
pub mod test_support;

pub use error::{HookError, HookErrorCode, HookResult};
pub use util::loading_value::{LoadingHook, LoadingState, LoadingValue};
pub use util::subscribe::Subscription;
