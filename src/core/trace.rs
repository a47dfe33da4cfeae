//! Commit trace: ordered record of visible state transitions.
//!
//! Concurrent transitions commit in completion order, not start order, so
//! the canonical state after a race is best understood by looking at the
//! commits themselves. The trace keeps one record per visible update,
//! entirely in memory; it is observability, not persistence.

use super::state::State;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

/// Record of a single committed transition.
///
/// Gated candidates (equal to the canonical state) never produce a record.
#[derive(Clone, Debug, Serialize)]
#[serde(bound(serialize = "S: Serialize"))]
pub struct CommitRecord<S: State> {
    /// Identifier of the transition that produced this commit
    pub transition: Uuid,
    /// Canonical state before the commit
    pub from: S,
    /// Canonical state after the commit
    pub to: S,
    /// When the commit happened
    pub committed_at: DateTime<Utc>,
}

/// Ordered history of commits.
///
/// The trace is immutable — `record` returns a new trace with the commit
/// appended.
///
/// # Example
///
/// ```rust
/// use conflux::core::{CommitRecord, CommitTrace};
/// use chrono::Utc;
/// use serde_json::json;
/// use uuid::Uuid;
///
/// let trace = CommitTrace::new();
/// let trace = trace.record(CommitRecord {
///     transition: Uuid::new_v4(),
///     from: json!({ "count": 0 }),
///     to: json!({ "count": 1 }),
///     committed_at: Utc::now(),
/// });
///
/// assert_eq!(trace.len(), 1);
/// assert_eq!(trace.path(), vec![&json!({ "count": 0 }), &json!({ "count": 1 })]);
/// ```
#[derive(Clone, Debug, Serialize)]
#[serde(bound(serialize = "S: Serialize"))]
pub struct CommitTrace<S: State> {
    records: Vec<CommitRecord<S>>,
}

impl<S: State> Default for CommitTrace<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: State> CommitTrace<S> {
    /// Create a new empty trace.
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Append a commit, returning a new trace.
    pub fn record(&self, record: CommitRecord<S>) -> Self {
        let mut records = self.records.clone();
        records.push(record);
        Self { records }
    }

    /// The sequence of canonical states: the state before the first commit,
    /// then the state after each commit in order.
    pub fn path(&self) -> Vec<&S> {
        let mut path = Vec::new();
        if let Some(first) = self.records.first() {
            path.push(&first.from);
        }
        for record in &self.records {
            path.push(&record.to);
        }
        path
    }

    /// Elapsed time from the first to the last commit.
    ///
    /// `None` when the trace is empty.
    pub fn duration(&self) -> Option<Duration> {
        if let (Some(first), Some(last)) = (self.records.first(), self.records.last()) {
            let duration = last
                .committed_at
                .signed_duration_since(first.committed_at);
            duration.to_std().ok()
        } else {
            None
        }
    }

    /// All commit records in order.
    pub fn records(&self) -> &[CommitRecord<S>] {
        &self.records
    }

    /// Number of commits recorded.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no commit has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
