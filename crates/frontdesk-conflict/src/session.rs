//! Sequential review of pending conflicts
//!
//! A review session walks an immutable snapshot of conflicts strictly in
//! the order given. Each conflict needs an explicit resolve or ignore
//! before the next one is shown; after the last one the session is done.
//! Abandoning a session commits nothing and hands back the conflicts that
//! were never acted on.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use frontdesk_core::domain::{ConflictId, ConflictResolutionStrategy, SyncConflict};

use crate::{
    error::ConflictError,
    merge::MergeRecord,
    policy::PolicyEngine,
    resolver::{compute_resolved_value, Decision},
};

/// Position of a review session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "index", rename_all = "snake_case")]
pub enum ReviewState {
    /// Reviewing the conflict at this index
    Reviewing(usize),
    /// No conflict left in this session
    Done,
}

impl ReviewState {
    /// Initial state for a session over `count` conflicts
    pub fn start(count: usize) -> Self {
        if count == 0 {
            ReviewState::Done
        } else {
            ReviewState::Reviewing(0)
        }
    }

    /// State after one resolve or ignore action
    pub fn advance(self, count: usize) -> Self {
        match self {
            ReviewState::Reviewing(index) if index + 1 < count => {
                ReviewState::Reviewing(index + 1)
            }
            _ => ReviewState::Done,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, ReviewState::Done)
    }
}

/// Receives the operator's decisions as they are committed
///
/// `custom_value` is only present for [`ConflictResolutionStrategy::Manual`].
/// For every other strategy the receiver recomputes the value itself with
/// [`compute_resolved_value`].
pub trait ResolutionSink<T> {
    fn on_resolve(
        &mut self,
        conflict_id: &ConflictId,
        strategy: ConflictResolutionStrategy,
        custom_value: Option<&T>,
    );

    fn on_ignore(&mut self, conflict_id: &ConflictId);
}

/// One recorded decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome<T> {
    Resolved {
        id: ConflictId,
        strategy: ConflictResolutionStrategy,
        #[serde(default, rename = "customValue", skip_serializing_if = "Option::is_none")]
        custom_value: Option<T>,
    },
    Ignored {
        id: ConflictId,
    },
}

impl<T: MergeRecord> Outcome<T> {
    pub fn id(&self) -> &ConflictId {
        match self {
            Outcome::Resolved { id, .. } | Outcome::Ignored { id } => id,
        }
    }

    /// The value to write back for `conflict`, or `None` if it was ignored
    pub fn resolved_value(&self, conflict: &SyncConflict<T>) -> Option<T> {
        match self {
            Outcome::Resolved {
                strategy,
                custom_value,
                ..
            } => match strategy {
                ConflictResolutionStrategy::Manual => custom_value.clone(),
                automatic => compute_resolved_value(conflict, *automatic),
            },
            Outcome::Ignored { .. } => None,
        }
    }
}

/// Sink that keeps every decision in order
#[derive(Debug, Clone)]
pub struct RecordingSink<T> {
    outcomes: Vec<Outcome<T>>,
}

impl<T> RecordingSink<T> {
    pub fn new() -> Self {
        Self {
            outcomes: Vec::new(),
        }
    }

    pub fn outcomes(&self) -> &[Outcome<T>] {
        &self.outcomes
    }

    pub fn into_outcomes(self) -> Vec<Outcome<T>> {
        self.outcomes
    }
}

impl<T> Default for RecordingSink<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> ResolutionSink<T> for RecordingSink<T> {
    fn on_resolve(
        &mut self,
        conflict_id: &ConflictId,
        strategy: ConflictResolutionStrategy,
        custom_value: Option<&T>,
    ) {
        self.outcomes.push(Outcome::Resolved {
            id: conflict_id.clone(),
            strategy,
            custom_value: custom_value.cloned(),
        });
    }

    fn on_ignore(&mut self, conflict_id: &ConflictId) {
        self.outcomes.push(Outcome::Ignored {
            id: conflict_id.clone(),
        });
    }
}

/// A review over a fixed, ordered snapshot of conflicts
#[derive(Debug, Clone)]
pub struct ReviewSession<T> {
    conflicts: Vec<SyncConflict<T>>,
    state: ReviewState,
}

impl<T: MergeRecord> ReviewSession<T> {
    /// Starts a session at the first conflict
    pub fn new(conflicts: Vec<SyncConflict<T>>) -> Self {
        let state = ReviewState::start(conflicts.len());
        debug!(count = conflicts.len(), "Review session started");
        Self { conflicts, state }
    }

    pub fn state(&self) -> ReviewState {
        self.state
    }

    pub fn len(&self) -> usize {
        self.conflicts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conflicts.is_empty()
    }

    /// The conflict under review, `None` once done
    pub fn current(&self) -> Option<&SyncConflict<T>> {
        match self.state {
            ReviewState::Reviewing(index) => self.conflicts.get(index),
            ReviewState::Done => None,
        }
    }

    /// 1-based position of the current conflict and the total, for display
    pub fn position(&self) -> Option<(usize, usize)> {
        match self.state {
            ReviewState::Reviewing(index) => Some((index + 1, self.conflicts.len())),
            ReviewState::Done => None,
        }
    }

    /// Number of conflicts not yet resolved or ignored
    pub fn remaining(&self) -> usize {
        match self.state {
            ReviewState::Reviewing(index) => self.conflicts.len() - index,
            ReviewState::Done => 0,
        }
    }

    /// The strategy to show as selected for the current conflict
    ///
    /// A presentation default only; it is never applied without an
    /// explicit [`resolve`](Self::resolve).
    pub fn preselected(&self, policy: &PolicyEngine) -> Option<ConflictResolutionStrategy> {
        self.current().map(|c| policy.preselect(c))
    }

    /// Commits `decision` for the current conflict and moves on
    ///
    /// Notifies `sink` and returns the value the decision writes back.
    ///
    /// # Errors
    ///
    /// [`ConflictError::SessionFinished`] if the session is done.
    pub fn resolve(
        &mut self,
        decision: Decision<T>,
        sink: &mut dyn ResolutionSink<T>,
    ) -> Result<T, ConflictError> {
        let conflict = self.current().ok_or(ConflictError::SessionFinished)?;
        let value = decision.resolve(conflict);
        let strategy = decision.strategy();

        sink.on_resolve(conflict.id(), strategy, decision.manual_value());
        info!(
            conflict_id = %conflict.id(),
            strategy = %strategy,
            "Conflict resolved"
        );

        self.state = self.state.advance(self.conflicts.len());
        Ok(value)
    }

    /// Commits `strategy` for the current conflict, with an operator value
    /// when the strategy is manual
    ///
    /// # Errors
    ///
    /// [`ConflictError::SessionFinished`] if the session is done, or
    /// [`ConflictError::ManualValueMissing`] for a manual strategy without a
    /// value. The session does not advance on error.
    pub fn resolve_with(
        &mut self,
        strategy: ConflictResolutionStrategy,
        manual_value: Option<T>,
        sink: &mut dyn ResolutionSink<T>,
    ) -> Result<T, ConflictError> {
        let conflict = self.current().ok_or(ConflictError::SessionFinished)?;
        let decision = Decision::from_strategy(conflict, strategy, manual_value)?;
        self.resolve(decision, sink)
    }

    /// Defers the current conflict to a future session and moves on
    ///
    /// # Errors
    ///
    /// [`ConflictError::SessionFinished`] if the session is done.
    pub fn ignore(&mut self, sink: &mut dyn ResolutionSink<T>) -> Result<(), ConflictError> {
        let conflict = self.current().ok_or(ConflictError::SessionFinished)?;

        sink.on_ignore(conflict.id());
        info!(conflict_id = %conflict.id(), "Conflict ignored");

        self.state = self.state.advance(self.conflicts.len());
        Ok(())
    }

    /// Ends the session early
    ///
    /// Returns the conflicts that were neither resolved nor ignored, in
    /// their original order. Nothing is committed.
    pub fn abandon(self) -> Vec<SyncConflict<T>> {
        let start = match self.state {
            ReviewState::Reviewing(index) => index,
            ReviewState::Done => self.conflicts.len(),
        };
        let pending: Vec<_> = self.conflicts.into_iter().skip(start).collect();
        if !pending.is_empty() {
            info!(pending = pending.len(), "Review session abandoned");
        }
        pending
    }
}
