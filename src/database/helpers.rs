use serde_json::Value;

use crate::database::source::ChildSnapshot;
use crate::util::json::with_identity_field;

/// Options for the `*_val`/`vals` projections.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValOptions {
    /// When set, object values get the snapshot key stored under this field.
    pub key_field: Option<String>,
}

impl ValOptions {
    pub fn with_key_field(key_field: impl Into<String>) -> Self {
        Self {
            key_field: Some(key_field.into()),
        }
    }
}

/// Plain data of a snapshot, or `None` when nothing exists at its location.
pub fn snapshot_to_data<S: ChildSnapshot>(snapshot: &S, options: &ValOptions) -> Option<Value> {
    if !snapshot.exists() {
        return None;
    }
    Some(with_identity_field(
        snapshot.value(),
        options.key_field.as_deref(),
        snapshot.key(),
    ))
}
