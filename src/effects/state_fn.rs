//! Synchronous deferred stateful computations.
//!
//! A `StateFn` is a lazy value: nothing runs until `run` is called with a
//! snapshot, and each run is independent — no result is retained between
//! invocations, and reads always go through the snapshot handed in.
//! Synchronous registrations use this variant so their transition can be
//! evaluated inline before the callback returns.

use super::state_task::StateTask;
use crate::core::{Snapshot, State};
use futures::future;
use futures::FutureExt;
use std::rc::Rc;

/// Type alias for the stored computation step.
type Step<S, A> = Rc<dyn Fn(Snapshot<S>) -> (A, Snapshot<S>)>;

/// A lazy, composable computation from a state snapshot to a result and a
/// next snapshot.
///
/// The snapshot threads through sequencing: a computation that never calls
/// `put` or `modify` hands the live snapshot to its successor, so later
/// steps keep reading the canonical state; once a value is put, successors
/// see that pinned value instead.
///
/// Sequencing obeys the usual laws: `and_then` is associative, and `of` is
/// a left and right identity for it.
///
/// # Example
///
/// ```rust
/// use conflux::core::Snapshot;
/// use conflux::effects::StateFn;
/// use serde_json::{json, Value};
///
/// let bump = StateFn::<Value, Value>::get()
///     .and_then(|state: Value| {
///         let count = state["count"].as_i64().unwrap_or(0);
///         StateFn::modify(move |s: Value| {
///             let mut next = s;
///             next["count"] = json!(count + 1);
///             next
///         })
///     })
///     .and_then(|_| StateFn::get());
///
/// let (seen, _) = bump.run(Snapshot::fixed(json!({ "count": 2 })));
/// assert_eq!(seen, json!({ "count": 3 }));
/// ```
pub struct StateFn<S: State, A> {
    step: Step<S, A>,
}

impl<S: State, A: 'static> StateFn<S, A> {
    /// Create a computation from a raw step function.
    pub fn new<F>(step: F) -> Self
    where
        F: Fn(Snapshot<S>) -> (A, Snapshot<S>) + 'static,
    {
        StateFn {
            step: Rc::new(step),
        }
    }

    /// Produce `result` unchanged; the state is untouched.
    pub fn of(result: A) -> Self
    where
        A: Clone,
    {
        StateFn::new(move |snapshot| (result.clone(), snapshot))
    }

    /// Derive a result from the current state; the state is untouched.
    pub fn gets<F>(read: F) -> Self
    where
        F: Fn(S) -> A + 'static,
    {
        StateFn::new(move |snapshot| (read(snapshot.get()), snapshot))
    }

    /// Transform the result of this computation.
    pub fn map<B, F>(self, f: F) -> StateFn<S, B>
    where
        B: 'static,
        F: Fn(A) -> B + 'static,
    {
        let step = self.step;
        StateFn::new(move |snapshot| {
            let (result, next) = step(snapshot);
            (f(result), next)
        })
    }

    /// Sequence another computation after this one, feeding the snapshot
    /// this computation produced into the next.
    pub fn and_then<B, F>(self, f: F) -> StateFn<S, B>
    where
        B: 'static,
        F: Fn(A) -> StateFn<S, B> + 'static,
    {
        let step = self.step;
        let f = Rc::new(f);
        StateFn::new(move |snapshot| {
            let (result, middle) = step(snapshot);
            f(result).run(middle)
        })
    }

    /// Run the computation against a snapshot.
    pub fn run(&self, snapshot: Snapshot<S>) -> (A, Snapshot<S>) {
        (self.step)(snapshot)
    }

    /// Run the computation, discarding the final state.
    pub fn eval(&self, snapshot: Snapshot<S>) -> A {
        self.run(snapshot).0
    }

    /// Run the computation, discarding the result.
    pub fn exec(&self, snapshot: Snapshot<S>) -> S {
        self.run(snapshot).1.get()
    }

    /// Lift into the asynchronous variant.
    pub fn into_task(self) -> StateTask<S, A> {
        StateTask::new(move |snapshot| {
            let outcome = self.run(snapshot);
            future::ready(outcome).boxed_local()
        })
    }
}

impl<S: State> StateFn<S, S> {
    /// The result is the current state; the state is unchanged.
    pub fn get() -> Self {
        StateFn::new(|snapshot| (snapshot.get(), snapshot))
    }
}

impl<S: State> StateFn<S, ()> {
    /// Replace the state; the result is unit.
    pub fn put(state: S) -> Self {
        StateFn::new(move |_snapshot| ((), Snapshot::fixed(state.clone())))
    }

    /// Replace the state with a function of the current state.
    pub fn modify<F>(f: F) -> Self
    where
        F: Fn(S) -> S + 'static,
    {
        StateFn::new(move |snapshot| ((), Snapshot::fixed(f(snapshot.get()))))
    }
}

impl<S: State, A> Clone for StateFn<S, A> {
    fn clone(&self) -> Self {
        StateFn {
            step: Rc::clone(&self.step),
        }
    }
}
