//! # Authentication hooks
//!
//! [`use_auth_state`] follows the signed-in user of an auth instance through
//! `onAuthStateChanged`; [`use_id_token`] does the same through `onIdTokenChanged`, so it also
//! re-renders on token refreshes.

pub mod auth_state;
pub mod id_token;
pub mod source;

#[doc(inline)]
pub use auth_state::{use_auth_state, AuthStateHook};

#[doc(inline)]
pub use id_token::{use_id_token, IdTokenHook, IdTokenOptions, UserChangedFn};

#[doc(inline)]
pub use source::{AuthSource, AuthStateCallback};
