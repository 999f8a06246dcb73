//! Linear snapshot history.
//!
//! Keeps the ordered snapshots, the parallel action log and the current
//! position. There is no branching: recording while behind the end discards
//! the redo stack.

use super::action::ActionRecord;
use std::sync::Arc;

/// Ordered snapshots plus the action records that produced them.
///
/// Invariants, upheld by every method:
/// - `states.len() == records.len()` and the history is never empty
/// - `position < states.len()`
/// - `records[0]` is the synthetic `INIT` record
///
/// # Example
///
/// ```rust
/// use rewind::core::{ActionRecord, BasicAction, History};
/// use std::sync::Arc;
///
/// let mut history: History<i32, serde_json::Value> = History::new(Arc::new(0));
///
/// history.push(Arc::new(1), ActionRecord::from_action(&BasicAction::new("INC")));
/// history.push(Arc::new(2), ActionRecord::from_action(&BasicAction::new("INC")));
/// assert_eq!(**history.current(), 2);
///
/// let left = history.step_back().map(|r| r.kind.clone());
/// assert_eq!(left.as_deref(), Some("INC"));
/// assert_eq!(**history.current(), 1);
///
/// // Recording from the middle drops the redo stack.
/// history.push(Arc::new(10), ActionRecord::from_action(&BasicAction::new("SET")));
/// assert_eq!(history.len(), 3);
/// assert!(!history.can_redo());
/// ```
#[derive(Debug)]
pub struct History<S, D> {
    states: Vec<Arc<S>>,
    records: Vec<ActionRecord<D>>,
    position: usize,
}

impl<S, D: Clone> Clone for History<S, D> {
    fn clone(&self) -> Self {
        Self {
            states: self.states.clone(),
            records: self.records.clone(),
            position: self.position,
        }
    }
}

impl<S, D> History<S, D> {
    /// Create a history holding only the initial snapshot.
    pub fn new(initial: Arc<S>) -> Self {
        Self {
            states: vec![initial],
            records: vec![ActionRecord::init()],
            position: 0,
        }
    }

    /// The snapshot at the current position.
    pub fn current(&self) -> &Arc<S> {
        &self.states[self.position]
    }

    /// The record that produced the current snapshot.
    pub fn current_record(&self) -> &ActionRecord<D> {
        &self.records[self.position]
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Number of snapshots, including the initial one.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn states(&self) -> &[Arc<S>] {
        &self.states
    }

    pub fn records(&self) -> &[ActionRecord<D>] {
        &self.records
    }

    pub fn can_undo(&self) -> bool {
        self.position > 0
    }

    pub fn can_redo(&self) -> bool {
        self.position + 1 < self.states.len()
    }

    /// Record a new snapshot after the current position.
    ///
    /// Everything after the current position is discarded first, even when
    /// the position is already at the end.
    pub fn push(&mut self, next: Arc<S>, record: ActionRecord<D>) {
        self.states.truncate(self.position + 1);
        self.records.truncate(self.position + 1);
        self.states.push(next);
        self.records.push(record);
        self.position = self.states.len() - 1;
    }

    /// Move one step back.
    ///
    /// Returns the record being left, which describes the action to revert.
    /// Returns `None` at the start.
    pub fn step_back(&mut self) -> Option<&ActionRecord<D>> {
        if !self.can_undo() {
            return None;
        }
        self.position -= 1;
        Some(&self.records[self.position + 1])
    }

    /// Move one step forward.
    ///
    /// Returns the record being entered. Returns `None` at the end.
    pub fn step_forward(&mut self) -> Option<&ActionRecord<D>> {
        if !self.can_redo() {
            return None;
        }
        self.position += 1;
        Some(&self.records[self.position])
    }

    /// Collapse to a single snapshot with a fresh `INIT` record.
    pub fn replace_all(&mut self, snapshot: Arc<S>) {
        self.states = vec![snapshot];
        self.records = vec![ActionRecord::init()];
        self.position = 0;
    }

    /// Overwrite the newest snapshot in place, keeping its record.
    ///
    /// Returns `true` when the overwritten snapshot is the current one.
    pub fn replace_latest(&mut self, snapshot: Arc<S>) -> bool {
        let last = self.states.len() - 1;
        self.states[last] = snapshot;
        self.position == last
    }
}
