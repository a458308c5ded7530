//! # Cloud Functions hooks
//!
//! [`use_https_callable`] wraps a callable function in an action-style hook that tracks the
//! loading and error state of its calls.

pub mod https_callable;
pub mod source;

#[doc(inline)]
pub use https_callable::{use_https_callable, HttpsCallableHook};

#[doc(inline)]
pub use source::{CallableOptions, CallableSource};
