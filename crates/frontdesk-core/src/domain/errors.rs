//! Domain error types
//!
//! This module defines error types specific to domain operations,
//! such as malformed conflict identifiers and unknown resolution strategies.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// ID parsing error
    #[error("Invalid ID format: {0}")]
    InvalidId(String),

    /// Unknown conflict resolution strategy
    #[error("Invalid strategy '{0}'; valid: keep-local, keep-remote, merge, manual")]
    InvalidStrategy(String),
}
