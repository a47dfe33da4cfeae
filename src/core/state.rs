//! Core State trait for orchestrated application state.
//!
//! The canonical state owned by an orchestrator is an opaque, caller-defined
//! value. It is replaced, never mutated in place, and partial updates are
//! expressed through an explicit patch type applied with `apply`.

use serde_json::Value;
use std::fmt::Debug;

/// Trait for application state values.
///
/// Exactly one canonical instance of a `State` exists per orchestrator at any
/// time. Transitions and side-effect handlers never touch it directly; they
/// produce candidate values (or patches) that the orchestrator merges in.
///
/// # Merge policy
///
/// `apply` is the crate's single merge operation: fields present in the patch
/// overwrite same-named fields of the state, all others are retained. Under
/// racing transitions the canonical state is determined by commit order, so
/// two transitions patching disjoint fields both land, while two patching the
/// same field resolve to the later committer.
///
/// # Required Traits
///
/// - `Clone`: candidates and snapshots are value copies of the state
/// - `Debug`: states must be debuggable for diagnostics
///
/// # Example
///
/// ```rust
/// use conflux::core::State;
///
/// #[derive(Clone, Debug)]
/// struct Session {
///     user: String,
///     unread: u32,
/// }
///
/// #[derive(Clone, Debug, Default)]
/// struct SessionPatch {
///     user: Option<String>,
///     unread: Option<u32>,
/// }
///
/// impl State for Session {
///     type Patch = SessionPatch;
///
///     fn apply(&self, patch: &SessionPatch) -> Self {
///         Session {
///             user: patch.user.clone().unwrap_or_else(|| self.user.clone()),
///             unread: patch.unread.unwrap_or(self.unread),
///         }
///     }
/// }
/// ```
pub trait State: Clone + Debug + 'static {
    /// Partial substitution type for this state.
    type Patch: Clone + Debug + 'static;

    /// Merge a patch into this state, returning the merged value.
    ///
    /// Must leave `self` untouched; fields absent from the patch are
    /// retained.
    fn apply(&self, patch: &Self::Patch) -> Self;
}

/// Dynamic JSON state with shallow object-key merge.
///
/// Patching an object with an object inserts or overwrites the patch's
/// top-level keys and retains every other key. Any non-object on either side
/// replaces the state wholesale.
///
/// # Example
///
/// ```rust
/// use conflux::core::State;
/// use serde_json::json;
///
/// let state = json!({ "count": 0, "user": "ada" });
/// let next = state.apply(&json!({ "count": 5 }));
///
/// assert_eq!(next, json!({ "count": 5, "user": "ada" }));
/// ```
impl State for Value {
    type Patch = Value;

    fn apply(&self, patch: &Value) -> Self {
        match (self, patch) {
            (Value::Object(base), Value::Object(fields)) => {
                let mut merged = base.clone();
                for (key, value) in fields {
                    merged.insert(key.clone(), value.clone());
                }
                Value::Object(merged)
            }
            _ => patch.clone(),
        }
    }
}
