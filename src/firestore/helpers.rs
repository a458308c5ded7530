use serde_json::Value;

use crate::firestore::source::{DocumentSnapshotLike, QuerySnapshotLike};
use crate::util::json::with_identity_field;

/// Options of the `data` projections.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DataOptions {
    /// When set, each document's id is stored under this field of its data.
    pub id_field: Option<String>,
}

impl DataOptions {
    pub fn with_id_field(id_field: impl Into<String>) -> Self {
        Self {
            id_field: Some(id_field.into()),
        }
    }
}

pub fn document_to_data<D: DocumentSnapshotLike>(
    snapshot: &D,
    options: &DataOptions,
) -> Option<Value> {
    if !snapshot.exists() {
        return None;
    }
    let data = snapshot.data()?;
    Some(with_identity_field(
        &data,
        options.id_field.as_deref(),
        Some(snapshot.id()),
    ))
}

/// Data of every existing document in query order.
pub fn query_to_data<Q: QuerySnapshotLike>(snapshot: &Q, options: &DataOptions) -> Vec<Value> {
    snapshot
        .documents()
        .iter()
        .filter_map(|document| document_to_data(document, options))
        .collect()
}
