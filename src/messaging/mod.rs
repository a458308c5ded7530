//! # Cloud Messaging hooks
//!
//! [`use_token`] requests the registration token of a messaging instance.

pub mod source;
pub mod token;

#[doc(inline)]
pub use source::MessagingSource;

#[doc(inline)]
pub use token::{use_token, TokenHook};
