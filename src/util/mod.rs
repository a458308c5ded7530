pub mod comparator_ref;
pub mod json;
pub mod listen;
pub mod loading_value;
pub mod once;
pub mod subscribe;
pub mod sync;

pub use comparator_ref::{compare, nullable_equal, ComparatorRef};
pub use json::{from_data, from_data_list, with_identity_field};
pub use listen::ValueListener;
pub use loading_value::{
    DefaultValueFactory, LoadingHook, LoadingState, LoadingValue, ValueUpdate,
};
pub use once::{FetchFuture, OnceLoader};
pub use subscribe::{
    ChangeCallback, EpochToken, Observers, ResultCallback, Subscription, SubscriptionEpoch,
    Unsubscribe,
};
