//! Read-through accessors for orchestrated state.
//!
//! A snapshot is a zero-argument reader handed to deferred computations and
//! side-effect handlers. A *live* snapshot re-reads the canonical state on
//! every call, so a computation that suspends across an await observes
//! commits made by other transitions in the meantime. A *fixed* snapshot
//! pins a specific value; it is produced when a computation replaces the
//! state with `put` or `modify`.

use std::fmt::{self, Debug};
use std::rc::Rc;

/// Zero-argument accessor returning the current state at call time.
///
/// The live variant must wrap a read-through closure, never a captured
/// value: the out-of-order commit semantics of concurrent transitions depend
/// on candidates being read at resolution time.
///
/// # Example
///
/// ```rust
/// use conflux::core::Snapshot;
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// let store = Rc::new(RefCell::new(0));
/// let reader = Rc::clone(&store);
/// let snapshot = Snapshot::live(move || *reader.borrow());
///
/// assert_eq!(snapshot.get(), 0);
/// *store.borrow_mut() = 7;
/// assert_eq!(snapshot.get(), 7);
/// ```
pub struct Snapshot<S> {
    repr: Repr<S>,
}

enum Repr<S> {
    Live(Rc<dyn Fn() -> S>),
    Fixed(S),
}

impl<S: Clone> Snapshot<S> {
    /// Wrap a closure that re-reads the canonical state on every call.
    pub fn live<F>(read: F) -> Self
    where
        F: Fn() -> S + 'static,
    {
        Snapshot {
            repr: Repr::Live(Rc::new(read)),
        }
    }

    /// Pin a specific value, detached from the canonical state.
    pub fn fixed(state: S) -> Self {
        Snapshot {
            repr: Repr::Fixed(state),
        }
    }

    /// Read the state as of this call.
    pub fn get(&self) -> S {
        match &self.repr {
            Repr::Live(read) => read(),
            Repr::Fixed(state) => state.clone(),
        }
    }

    /// Whether reads go through to the canonical state.
    pub fn is_live(&self) -> bool {
        matches!(self.repr, Repr::Live(_))
    }
}

impl<S: Clone> Clone for Snapshot<S> {
    fn clone(&self) -> Self {
        Snapshot {
            repr: match &self.repr {
                Repr::Live(read) => Repr::Live(Rc::clone(read)),
                Repr::Fixed(state) => Repr::Fixed(state.clone()),
            },
        }
    }
}

impl<S: Clone + Debug> Debug for Snapshot<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.repr {
            Repr::Live(_) => f.debug_struct("Snapshot").field("live", &true).finish(),
            Repr::Fixed(state) => f
                .debug_struct("Snapshot")
                .field("live", &false)
                .field("state", state)
                .finish(),
        }
    }
}
