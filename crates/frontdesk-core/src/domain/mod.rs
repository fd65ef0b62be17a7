//! Domain entities and business logic
//!
//! This module contains the core domain types for Frontdesk sync:
//! - Newtypes for type-safe identifiers
//! - Sync conflict records and resolution strategies
//! - Domain-specific error types

pub mod conflict;
pub mod errors;
pub mod newtypes;

// Re-export commonly used types
pub use conflict::{ConflictResolutionStrategy, SyncConflict};
pub use errors::DomainError;
pub use newtypes::ConflictId;
