//! # Realtime Database hooks
//!
//! Hooks that turn Realtime Database listeners into `(value, loading, error)` state.
//!
//! - [`use_list`] keeps an ordered list of the children under a query, applying
//!   `child_added` / `child_changed` / `child_moved` / `child_removed` events with local list
//!   surgery. Existing children are folded into a single initial update.
//! - [`use_object`] follows the value at a single location.
//! - [`ListHook::keys`], [`ListHook::vals`] and [`ObjectHook::val`] project snapshots to keys or
//!   plain JSON data, optionally storing the key under a field of each object.
//!
//! The hooks talk to the database through [`QuerySource`], implemented for the query handle the
//! application already holds.
//!
//! ## Example
//!
//! ```ignore
//! use firebase_rs_hooks::database::{use_list, ValOptions};
//!
//! let mut messages = use_list(Some(messages_query.clone()));
//! let _render = messages.watch(|| request_redraw());
//!
//! // on every render
//! messages.update(Some(current_query()));
//! let (values, loading, error) = messages.vals(&ValOptions::with_key_field("id"));
//! ```

pub mod helpers;
pub mod list;
pub mod list_reducer;
pub mod object;
pub mod source;

#[doc(inline)]
pub use helpers::{snapshot_to_data, ValOptions};

#[doc(inline)]
pub use list::{use_list, BatchOffer, InitialBatch, ListHook};

#[doc(inline)]
pub use list_reducer::{
    position_or_fallback, KeyedItem, ListAction, ListReducer, ListState, ListStore,
    UNKNOWN_KEY_FALLBACK_INDEX,
};

#[doc(inline)]
pub use object::{use_object, ObjectHook};

#[doc(inline)]
pub use source::{
    ChildCallback, ChildEvent, ChildEventType, ChildSnapshot, QuerySource, ValueCallback,
};
