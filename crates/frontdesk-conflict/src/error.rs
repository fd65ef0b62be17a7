//! Error types for the conflict engine

use frontdesk_core::domain::DomainError;
use thiserror::Error;

/// Errors that can occur while resolving or reviewing conflicts
#[derive(Debug, Error)]
pub enum ConflictError {
    /// `manual` was chosen but no operator-supplied value was given
    #[error("manual resolution of conflict {0} requires a value")]
    ManualValueMissing(String),

    /// The review session has no conflict left to act on
    #[error("review session is finished; no conflict is pending")]
    SessionFinished,

    /// Conflict not found in the supplied set
    #[error("conflict not found: {0}")]
    NotFound(String),

    /// An id prefix matched more than one conflict
    #[error("conflict id prefix '{}' is ambiguous: matches {}", .prefix, .candidates.join(", "))]
    Ambiguous {
        prefix: String,
        candidates: Vec<String>,
    },

    /// Invalid glob pattern or strategy in a preselection rule
    #[error("invalid preselection rule: {pattern}: {reason}")]
    InvalidRule { pattern: String, reason: String },

    /// A typed record could not be converted to or from JSON
    #[error("record serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Domain validation error
    #[error(transparent)]
    Domain(#[from] DomainError),
}
