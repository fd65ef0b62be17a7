//! Field-level merge of two versions of the same record
//!
//! Fields flagged as changed come from the remote copy, every other field
//! the local copy knows about comes from the local copy, and fields only
//! the remote copy has are kept. The merge is shallow: nested objects are
//! replaced whole.
//!
//! A field flagged as changed always takes the remote value, even when the
//! local side edited it too. There is no merge below field granularity;
//! operators use the `manual` strategy when that is not good enough.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use tracing::trace;

use crate::error::ConflictError;

/// A value that may or may not decompose into named top-level fields
pub trait MergeRecord: Clone {
    /// Returns the top-level fields, or `None` for scalars and other
    /// non-decomposable values
    fn fields(&self) -> Option<&Map<String, Value>>;

    /// Builds a record from top-level fields
    fn from_fields(fields: Map<String, Value>) -> Self;
}

impl MergeRecord for Value {
    fn fields(&self) -> Option<&Map<String, Value>> {
        self.as_object()
    }

    fn from_fields(fields: Map<String, Value>) -> Self {
        Value::Object(fields)
    }
}

/// Merges `local` and `remote` using `changed_fields` as the selector
///
/// 1. A non-record `local` is returned unchanged.
/// 2. Otherwise a non-record `remote` is returned unchanged.
/// 3. Otherwise the result starts as a copy of `remote`, and every field of
///    `local` not named in `changed_fields` overwrites it.
///
/// Neither input is modified.
///
/// # Example
///
/// ```
/// use frontdesk_conflict::merge::merge;
/// use serde_json::json;
///
/// let local = json!({"status": "occupied", "rate": 150});
/// let remote = json!({"status": "vacant", "rate": 140, "cleanedAt": 1});
///
/// let merged = merge(&local, &remote, &["status".to_string()]);
/// assert_eq!(merged, json!({"status": "vacant", "rate": 150, "cleanedAt": 1}));
/// ```
pub fn merge<T, S>(local: &T, remote: &T, changed_fields: &[S]) -> T
where
    T: MergeRecord,
    S: AsRef<str>,
{
    let Some(local_fields) = local.fields() else {
        trace!("Local value is not a record, keeping it whole");
        return local.clone();
    };
    let Some(remote_fields) = remote.fields() else {
        trace!("Remote value is not a record, keeping it whole");
        return remote.clone();
    };

    let mut merged = remote_fields.clone();
    for (name, value) in local_fields {
        if changed_fields.iter().any(|f| f.as_ref() == name) {
            continue;
        }
        merged.insert(name.clone(), value.clone());
    }

    T::from_fields(merged)
}

/// Merges two typed records by going through their JSON representation
///
/// # Errors
///
/// Returns [`ConflictError::Serialization`] if either record fails to
/// serialize, or if the merged fields do not deserialize back into `T`.
pub fn merge_typed<T, S>(local: &T, remote: &T, changed_fields: &[S]) -> Result<T, ConflictError>
where
    T: Serialize + DeserializeOwned,
    S: AsRef<str>,
{
    let local = serde_json::to_value(local)?;
    let remote = serde_json::to_value(remote)?;
    let merged = merge(&local, &remote, changed_fields);
    Ok(serde_json::from_value(merged)?)
}
