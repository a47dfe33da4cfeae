//! The rendering-collaborator seam.
//!
//! The orchestrator does not render anything itself. It hands the root view
//! a reference to the canonical state plus an `EffectTrigger` handle, once
//! at mount and again after every commit. How the view tree mounts, diffs
//! and re-paints is entirely the collaborator's business.

use super::Inner;
use crate::core::State;
use std::fmt::{self, Debug};
use std::rc::Weak;
use uuid::Uuid;

/// Root of the view tree consuming orchestrated state.
///
/// `render` is invoked with the current canonical state whenever it is
/// replaced (and once at mount). Implementations may hold onto the trigger
/// handle to request transitions from inside the view.
pub trait RootView<S: State, P> {
    /// Re-render against the given state.
    fn render(&mut self, state: &S, effects: EffectTrigger<S, P>);
}

/// Cloneable handle for requesting a state transition directly.
///
/// `trigger` applies the optional patch to the live state to form a
/// candidate and routes it through the side-effect funnel and the equality
/// gate in a background task. The handle holds only a weak reference:
/// triggering after the orchestrator is gone is a logged no-op.
pub struct EffectTrigger<S: State, P> {
    pub(crate) inner: Weak<Inner<S, P>>,
}

impl<S: State, P: 'static> EffectTrigger<S, P> {
    /// Request a transition carrying an optional patch and an optional
    /// side-effect parameter.
    pub fn trigger(&self, patch: Option<S::Patch>, param: Option<P>) {
        let Some(inner) = self.inner.upgrade() else {
            tracing::warn!("effect trigger invoked after orchestrator was dropped");
            return;
        };

        let id = Uuid::new_v4();
        let current = inner.state.borrow().clone();
        let candidate = match &patch {
            Some(patch) => current.apply(patch),
            None => current,
        };

        tracing::debug!(transition = %id, "effect trigger fired");
        Inner::spawn_settle(inner, id, candidate, param);
    }
}

impl<S: State, P> Clone for EffectTrigger<S, P> {
    fn clone(&self) -> Self {
        EffectTrigger {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<S: State, P> Debug for EffectTrigger<S, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectTrigger")
            .field("connected", &(self.inner.strong_count() > 0))
            .finish()
    }
}
