//! Frontdesk Conflict - Sync conflict resolution
//!
//! Provides:
//! - Strategy evaluation (keep-local, keep-remote, merge, manual)
//! - Shallow field-level merge driven by a changed-field set
//! - Sequential review sessions with resolve/ignore callbacks
//! - Conflict detection from two record snapshots
//! - Per-collection preselection of the default strategy

pub mod detector;
pub mod error;
pub mod merge;
pub mod policy;
pub mod resolver;
pub mod session;

pub use error::ConflictError;
pub use resolver::{compute_resolved_value, Decision};
pub use session::{Outcome, RecordingSink, ResolutionSink, ReviewSession, ReviewState};
