//! Conflict domain entities
//!
//! This module defines the record of a detected divergence between a
//! locally edited copy of an entity and a concurrently changed server copy,
//! and the closed set of strategies an operator can pick to collapse it.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::errors::DomainError;
use super::newtypes::ConflictId;

/// How an operator chooses to collapse a conflict into a single value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictResolutionStrategy {
    /// Keep the local value, discarding the server's changes
    #[default]
    KeepLocal,
    /// Keep the server value, discarding local edits
    KeepRemote,
    /// Take changed fields from the server and everything else from local
    Merge,
    /// The operator supplies the value directly
    Manual,
}

impl ConflictResolutionStrategy {
    /// All strategies, in the order they are offered to an operator
    pub const ALL: [ConflictResolutionStrategy; 4] = [
        ConflictResolutionStrategy::KeepLocal,
        ConflictResolutionStrategy::KeepRemote,
        ConflictResolutionStrategy::Merge,
        ConflictResolutionStrategy::Manual,
    ];

    /// Returns true if the resolved value can be computed without operator input
    pub fn is_automatic(&self) -> bool {
        !matches!(self, ConflictResolutionStrategy::Manual)
    }

    /// Returns the canonical kebab-case name
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictResolutionStrategy::KeepLocal => "keep-local",
            ConflictResolutionStrategy::KeepRemote => "keep-remote",
            ConflictResolutionStrategy::Merge => "merge",
            ConflictResolutionStrategy::Manual => "manual",
        }
    }
}

impl fmt::Display for ConflictResolutionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ConflictResolutionStrategy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "keep-local" | "local" => Ok(ConflictResolutionStrategy::KeepLocal),
            "keep-remote" | "remote" => Ok(ConflictResolutionStrategy::KeepRemote),
            "merge" => Ok(ConflictResolutionStrategy::Merge),
            "manual" => Ok(ConflictResolutionStrategy::Manual),
            other => Err(DomainError::InvalidStrategy(other.to_string())),
        }
    }
}

/// A detected divergence between the local and remote copy of one record
///
/// Both `local_value` and `remote_value` are full representations of the
/// entity. `field_changes` lists the top-level fields the sync layer found
/// to differ; it drives the merge strategy and field highlighting.
///
/// Versions and timestamps are informational only. No ordering decision is
/// ever made from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncConflict<T> {
    /// Identifier of this conflict occurrence
    id: ConflictId,
    /// Candidate value as edited locally
    local_value: T,
    /// Candidate value as currently stored on the server
    remote_value: T,
    /// Local version counter
    #[serde(default)]
    local_version: u64,
    /// Remote version counter
    #[serde(default)]
    remote_version: u64,
    /// When the local version was produced (ms since epoch)
    #[serde(default)]
    local_timestamp: i64,
    /// When the remote version was produced (ms since epoch)
    #[serde(default)]
    remote_timestamp: i64,
    /// Top-level fields that differ between local and remote
    #[serde(default)]
    field_changes: Vec<String>,
    /// Record collection the entity belongs to (e.g. `rooms`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    collection: Option<String>,
}

impl<T> SyncConflict<T> {
    /// Creates a conflict with zeroed version metadata and no changed fields
    ///
    /// # Example
    ///
    /// ```
    /// use frontdesk_core::domain::{ConflictId, SyncConflict};
    /// use serde_json::json;
    ///
    /// let conflict = SyncConflict::new(
    ///     ConflictId::new(),
    ///     json!({"status": "occupied"}),
    ///     json!({"status": "vacant"}),
    /// )
    /// .with_versions(3, 4)
    /// .with_field_changes(["status"]);
    ///
    /// assert_eq!(conflict.field_changes(), ["status".to_string()]);
    /// assert_eq!(conflict.remote_version(), 4);
    /// ```
    pub fn new(id: ConflictId, local_value: T, remote_value: T) -> Self {
        Self {
            id,
            local_value,
            remote_value,
            local_version: 0,
            remote_version: 0,
            local_timestamp: 0,
            remote_timestamp: 0,
            field_changes: Vec::new(),
            collection: None,
        }
    }

    /// Sets the local and remote version counters
    pub fn with_versions(mut self, local: u64, remote: u64) -> Self {
        self.local_version = local;
        self.remote_version = remote;
        self
    }

    /// Sets the local and remote timestamps (ms since epoch)
    pub fn with_timestamps(mut self, local: i64, remote: i64) -> Self {
        self.local_timestamp = local;
        self.remote_timestamp = remote;
        self
    }

    /// Sets the changed-field set
    pub fn with_field_changes<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.field_changes = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the record collection
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    pub fn id(&self) -> &ConflictId {
        &self.id
    }

    pub fn local_value(&self) -> &T {
        &self.local_value
    }

    pub fn remote_value(&self) -> &T {
        &self.remote_value
    }

    pub fn local_version(&self) -> u64 {
        self.local_version
    }

    pub fn remote_version(&self) -> u64 {
        self.remote_version
    }

    pub fn local_timestamp(&self) -> i64 {
        self.local_timestamp
    }

    pub fn remote_timestamp(&self) -> i64 {
        self.remote_timestamp
    }

    /// Local timestamp as a UTC date, if it is in range
    pub fn local_modified_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.local_timestamp).single()
    }

    /// Remote timestamp as a UTC date, if it is in range
    pub fn remote_modified_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.remote_timestamp).single()
    }

    pub fn field_changes(&self) -> &[String] {
        &self.field_changes
    }

    /// Returns true if `field` is in the changed-field set
    pub fn is_field_changed(&self, field: &str) -> bool {
        self.field_changes.iter().any(|f| f == field)
    }

    pub fn collection(&self) -> Option<&str> {
        self.collection.as_deref()
    }
}

impl SyncConflict<serde_json::Value> {
    /// Changed fields that exist in neither the local nor the remote record
    ///
    /// Always empty when either side is not a JSON object, since the
    /// changed-field set carries no meaning for scalar values.
    pub fn unknown_field_changes(&self) -> Vec<&str> {
        let (Some(local), Some(remote)) =
            (self.local_value.as_object(), self.remote_value.as_object())
        else {
            return Vec::new();
        };

        self.field_changes
            .iter()
            .filter(|f| !local.contains_key(f.as_str()) && !remote.contains_key(f.as_str()))
            .map(String::as_str)
            .collect()
    }
}
