//! Asynchronous deferred stateful computations.
//!
//! `StateTask` is the asynchronous twin of `StateFn`: a lazy function from a
//! state snapshot to a future of a result and a next snapshot. Registered
//! callbacks build one per external event; the orchestrator runs it against
//! a live snapshot, so a task that suspends observes commits made by other
//! transitions before it resolves.

use crate::core::{Snapshot, State};
use futures::future::{self, LocalBoxFuture};
use futures::FutureExt;
use std::future::Future;
use std::rc::Rc;

/// Type alias for the stored effect. Futures are boxed locally: the
/// scheduling model is a single logical thread, so no `Send` bound applies.
type Effect<S, A> = Rc<dyn Fn(Snapshot<S>) -> LocalBoxFuture<'static, (A, Snapshot<S>)>>;

/// A lazy, composable asynchronous computation over orchestrated state.
///
/// Not memoized: each `run` re-executes the computation and re-reads state
/// through the snapshot handed in. A task must never assume a previous
/// invocation's captured state is still current.
///
/// Sequencing obeys the usual laws: `and_then` is associative, and `of` is
/// a left and right identity for it.
pub struct StateTask<S: State, A> {
    effect: Effect<S, A>,
}

impl<S: State, A: 'static> StateTask<S, A> {
    /// Create a task from a raw effect function.
    pub fn new<F>(effect: F) -> Self
    where
        F: Fn(Snapshot<S>) -> LocalBoxFuture<'static, (A, Snapshot<S>)> + 'static,
    {
        StateTask {
            effect: Rc::new(effect),
        }
    }

    /// Create a task from a closure returning any future.
    ///
    /// This is the general constructor for computations with real
    /// asynchronous steps:
    ///
    /// ```rust
    /// use conflux::core::Snapshot;
    /// use conflux::effects::StateTask;
    /// use serde_json::Value;
    ///
    /// let fetch = StateTask::<Value, i64>::from_fn(|snapshot: Snapshot<Value>| async move {
    ///     // .. await some I/O here ..
    ///     let state = snapshot.get();
    ///     (state["count"].as_i64().unwrap_or(0), snapshot)
    /// });
    /// ```
    pub fn from_fn<F, Fut>(effect: F) -> Self
    where
        F: Fn(Snapshot<S>) -> Fut + 'static,
        Fut: Future<Output = (A, Snapshot<S>)> + 'static,
    {
        StateTask::new(move |snapshot| effect(snapshot).boxed_local())
    }

    /// Produce `result` unchanged; the state is untouched.
    pub fn of(result: A) -> Self
    where
        A: Clone,
    {
        StateTask::new(move |snapshot| future::ready((result.clone(), snapshot)).boxed_local())
    }

    /// Derive a result from the current state; the state is untouched.
    pub fn gets<F>(read: F) -> Self
    where
        F: Fn(S) -> A + 'static,
    {
        StateTask::new(move |snapshot| future::ready((read(snapshot.get()), snapshot)).boxed_local())
    }

    /// Transform the result of this task.
    pub fn map<B, F>(self, f: F) -> StateTask<S, B>
    where
        B: 'static,
        F: Fn(A) -> B + 'static,
    {
        let effect = self.effect;
        let f = Rc::new(f);
        StateTask::new(move |snapshot| {
            let effect = Rc::clone(&effect);
            let f = Rc::clone(&f);
            async move {
                let (result, next) = effect(snapshot).await;
                (f(result), next)
            }
            .boxed_local()
        })
    }

    /// Sequence another task after this one, feeding the snapshot this task
    /// produced into the next.
    pub fn and_then<B, F>(self, f: F) -> StateTask<S, B>
    where
        B: 'static,
        F: Fn(A) -> StateTask<S, B> + 'static,
    {
        let effect = self.effect;
        let f = Rc::new(f);
        StateTask::new(move |snapshot| {
            let effect = Rc::clone(&effect);
            let f = Rc::clone(&f);
            async move {
                let (result, middle) = effect(snapshot).await;
                f(result).run(middle).await
            }
            .boxed_local()
        })
    }

    /// Run the task against a snapshot.
    pub async fn run(&self, snapshot: Snapshot<S>) -> (A, Snapshot<S>) {
        (self.effect)(snapshot).await
    }

    /// Run the task, discarding the final state.
    pub async fn eval(&self, snapshot: Snapshot<S>) -> A {
        self.run(snapshot).await.0
    }

    /// Run the task, discarding the result.
    pub async fn exec(&self, snapshot: Snapshot<S>) -> S {
        self.run(snapshot).await.1.get()
    }
}

impl<S: State> StateTask<S, S> {
    /// The result is the current state; the state is unchanged.
    pub fn get() -> Self {
        StateTask::new(|snapshot: Snapshot<S>| {
            future::ready((snapshot.get(), snapshot)).boxed_local()
        })
    }
}

impl<S: State> StateTask<S, ()> {
    /// Replace the state; the result is unit.
    pub fn put(state: S) -> Self {
        StateTask::new(move |_snapshot| {
            future::ready(((), Snapshot::fixed(state.clone()))).boxed_local()
        })
    }

    /// Replace the state with a function of the current state.
    pub fn modify<F>(f: F) -> Self
    where
        F: Fn(S) -> S + 'static,
    {
        StateTask::new(move |snapshot: Snapshot<S>| {
            future::ready(((), Snapshot::fixed(f(snapshot.get())))).boxed_local()
        })
    }
}

impl<S: State, A> Clone for StateTask<S, A> {
    fn clone(&self) -> Self {
        StateTask {
            effect: Rc::clone(&self.effect),
        }
    }
}
