//! Equality predicates for gating visible updates.
//!
//! The orchestrator compares every settled candidate state against the
//! canonical state before committing; only a genuine difference produces a
//! visible update. The predicate decides visibility, never the correctness
//! of merges.

use std::rc::Rc;

/// Caller-supplied equality relation over a state type.
///
/// The relation must be total, reflexive, symmetric and transitive. A
/// candidate that is equal to the canonical state under this relation is
/// silently dropped, even though it was computed — this prevents redundant
/// downstream re-renders when a transition re-allocates a structurally equal
/// value.
///
/// # Example
///
/// ```rust
/// use conflux::core::StateEq;
///
/// // Only the integral part of the state is significant.
/// let eq = StateEq::new(|a: &f64, b: &f64| a.trunc() == b.trunc());
///
/// assert!(eq.check(&1.2, &1.9));
/// assert!(!eq.check(&1.2, &2.0));
/// ```
pub struct StateEq<S> {
    relation: Rc<dyn Fn(&S, &S) -> bool>,
}

impl<S> StateEq<S> {
    /// Create an equality predicate from a relation.
    pub fn new<F>(relation: F) -> Self
    where
        F: Fn(&S, &S) -> bool + 'static,
    {
        StateEq {
            relation: Rc::new(relation),
        }
    }

    /// Check whether two states are equal under the relation.
    pub fn check(&self, a: &S, b: &S) -> bool {
        (self.relation)(a, b)
    }
}

impl<S: PartialEq> StateEq<S> {
    /// Structural equality via `PartialEq`.
    pub fn structural() -> Self {
        StateEq::new(|a: &S, b: &S| a == b)
    }
}

impl<S> Clone for StateEq<S> {
    fn clone(&self) -> Self {
        StateEq {
            relation: Rc::clone(&self.relation),
        }
    }
}
