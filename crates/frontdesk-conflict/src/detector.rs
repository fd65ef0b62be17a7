//! Conflict detection logic
//!
//! Determines whether the local and remote copies of a record diverged
//! independently since the last agreed version, and if so builds the
//! conflict record with its changed-field set.

use serde_json::Value;
use tracing::{debug, info};

use frontdesk_core::domain::{ConflictId, SyncConflict};

/// Result of conflict detection check
#[derive(Debug, Clone)]
pub enum DetectionResult {
    /// No conflict: one side can be applied over the other
    NoConflict,
    /// Conflict detected: both versions changed
    Conflicted(Box<SyncConflict<Value>>),
}

/// Both copies of a record as seen by the sync layer
#[derive(Debug, Clone)]
pub struct RecordSnapshot {
    pub collection: Option<String>,
    pub local_value: Value,
    pub local_version: u64,
    pub local_timestamp: i64,
    pub remote_value: Value,
    pub remote_version: u64,
    pub remote_timestamp: i64,
}

/// Top-level fields whose values differ between `local` and `remote`
///
/// A field present on only one side counts as different. The result is
/// sorted. Empty when either side is not a JSON object.
pub fn diff_fields(local: &Value, remote: &Value) -> Vec<String> {
    let (Some(local), Some(remote)) = (local.as_object(), remote.as_object()) else {
        return Vec::new();
    };

    let mut changed: Vec<String> = local
        .iter()
        .filter(|(name, value)| remote.get(name.as_str()) != Some(*value))
        .map(|(name, _)| name.clone())
        .chain(
            remote
                .keys()
                .filter(|name| !local.contains_key(name.as_str()))
                .cloned(),
        )
        .collect();
    changed.sort();
    changed
}

/// Detects conflicts between local and remote record versions
pub struct ConflictDetector;

impl ConflictDetector {
    /// Checks a record snapshot against the last agreed version
    ///
    /// A conflict exists when:
    /// 1. Both the local and the remote version advanced past
    ///    `base_version`, AND
    /// 2. The two values are not equal
    ///
    /// Returns `DetectionResult::Conflicted` with a new `SyncConflict` if
    /// both sides changed, or `DetectionResult::NoConflict` otherwise.
    pub fn check(snapshot: RecordSnapshot, base_version: u64) -> DetectionResult {
        let local_changed = snapshot.local_version > base_version;
        let remote_changed = snapshot.remote_version > base_version;

        if !(local_changed && remote_changed) {
            debug!(
                local_version = snapshot.local_version,
                remote_version = snapshot.remote_version,
                base_version,
                "At most one side changed, no conflict"
            );
            return DetectionResult::NoConflict;
        }

        if snapshot.local_value == snapshot.remote_value {
            debug!("Both sides changed to the same value, no conflict");
            return DetectionResult::NoConflict;
        }

        let field_changes = diff_fields(&snapshot.local_value, &snapshot.remote_value);
        let mut conflict = SyncConflict::new(
            ConflictId::new(),
            snapshot.local_value,
            snapshot.remote_value,
        )
        .with_versions(snapshot.local_version, snapshot.remote_version)
        .with_timestamps(snapshot.local_timestamp, snapshot.remote_timestamp)
        .with_field_changes(field_changes);
        if let Some(collection) = snapshot.collection {
            conflict = conflict.with_collection(collection);
        }

        info!(
            conflict_id = %conflict.id(),
            collection = ?conflict.collection(),
            changed = conflict.field_changes().len(),
            "Conflict detected: both local and remote versions changed"
        );

        DetectionResult::Conflicted(Box::new(conflict))
    }
}
