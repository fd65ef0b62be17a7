//! Resolution strategy evaluator
//!
//! Computes the value that would be written back if the operator commits a
//! given strategy for a conflict:
//! - `KeepLocal`: the local value, unchanged
//! - `KeepRemote`: the remote value, unchanged
//! - `Merge`: field-level merge driven by the conflict's changed fields
//! - `Manual`: not computable; the value comes from the operator

use frontdesk_core::domain::{ConflictResolutionStrategy, SyncConflict};
use tracing::debug;

use crate::{
    error::ConflictError,
    merge::{merge, MergeRecord},
};

/// Computes the resolved value for `strategy`
///
/// Returns `None` for [`ConflictResolutionStrategy::Manual`]: there is no
/// default for a manual resolution and callers must take the value from
/// operator input instead.
pub fn compute_resolved_value<T: MergeRecord>(
    conflict: &SyncConflict<T>,
    strategy: ConflictResolutionStrategy,
) -> Option<T> {
    let value = match strategy {
        ConflictResolutionStrategy::KeepLocal => conflict.local_value().clone(),
        ConflictResolutionStrategy::KeepRemote => conflict.remote_value().clone(),
        ConflictResolutionStrategy::Merge => merge(
            conflict.local_value(),
            conflict.remote_value(),
            conflict.field_changes(),
        ),
        ConflictResolutionStrategy::Manual => return None,
    };

    debug!(
        conflict_id = %conflict.id(),
        strategy = %strategy,
        "Computed resolved value"
    );
    Some(value)
}

/// An operator's committed choice for one conflict
///
/// Unlike [`ConflictResolutionStrategy`], the manual variant carries its
/// value, so resolving a `Decision` can never hit the missing-value case.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision<T> {
    KeepLocal,
    KeepRemote,
    Merge,
    /// Operator-supplied value
    Manual(T),
}

impl<T: MergeRecord> Decision<T> {
    /// Builds a decision from a strategy plus an optional operator value
    ///
    /// The value is ignored for every strategy except `Manual`.
    ///
    /// # Errors
    ///
    /// [`ConflictError::ManualValueMissing`] if `strategy` is `Manual` and
    /// `manual_value` is `None`.
    pub fn from_strategy(
        conflict: &SyncConflict<T>,
        strategy: ConflictResolutionStrategy,
        manual_value: Option<T>,
    ) -> Result<Self, ConflictError> {
        Ok(match strategy {
            ConflictResolutionStrategy::KeepLocal => Decision::KeepLocal,
            ConflictResolutionStrategy::KeepRemote => Decision::KeepRemote,
            ConflictResolutionStrategy::Merge => Decision::Merge,
            ConflictResolutionStrategy::Manual => Decision::Manual(manual_value.ok_or_else(
                || ConflictError::ManualValueMissing(conflict.id().to_string()),
            )?),
        })
    }

    /// The strategy this decision corresponds to
    pub fn strategy(&self) -> ConflictResolutionStrategy {
        match self {
            Decision::KeepLocal => ConflictResolutionStrategy::KeepLocal,
            Decision::KeepRemote => ConflictResolutionStrategy::KeepRemote,
            Decision::Merge => ConflictResolutionStrategy::Merge,
            Decision::Manual(_) => ConflictResolutionStrategy::Manual,
        }
    }

    /// The operator-supplied value, present only for `Manual`
    pub fn manual_value(&self) -> Option<&T> {
        match self {
            Decision::Manual(value) => Some(value),
            _ => None,
        }
    }

    /// Computes the value this decision writes back for `conflict`
    pub fn resolve(&self, conflict: &SyncConflict<T>) -> T {
        match self {
            Decision::KeepLocal => conflict.local_value().clone(),
            Decision::KeepRemote => conflict.remote_value().clone(),
            Decision::Merge => merge(
                conflict.local_value(),
                conflict.remote_value(),
                conflict.field_changes(),
            ),
            Decision::Manual(value) => value.clone(),
        }
    }
}
