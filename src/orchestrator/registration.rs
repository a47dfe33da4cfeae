//! Callback registration records and the side-effect funnel contract.
//!
//! External event sources are wired to the orchestrator through registration
//! records. Each record pairs a `register` seam (invoked exactly once, at
//! mount time, with the callback the source may then call any number of
//! times) with an optional transition mapping and an optional return-value
//! mapping. A record with no transition mapping is a no-op pass-through:
//! state is untouched, no side effect fires, and the return-value mapping
//! (if any) sees the unmodified current state.

use crate::core::{Snapshot, State};
use crate::effects::{StateFn, StateTask};
use futures::future::LocalBoxFuture;
use futures::FutureExt;
use std::future::Future;
use std::rc::Rc;

/// Opaque error surfaced by a side-effect handler.
pub type HandlerError = Box<dyn std::error::Error>;

/// The single asynchronous side-effect handler of an orchestrator.
///
/// Invoked once per transition whose parameter is present, with a snapshot
/// of the pre-transition merged state and the parameter. The returned patch
/// is merged onto the transition's candidate before the equality gate runs.
pub type SideEffectHandler<S, P> =
    Rc<dyn Fn(Snapshot<S>, P) -> LocalBoxFuture<'static, Result<<S as State>::Patch, HandlerError>>>;

/// Callback handed to a synchronous registration source.
pub type SyncCallback<Args, Ret> = Box<dyn Fn(Args) -> Option<Ret>>;

/// Callback handed to an asynchronous registration source.
pub type AsyncCallback<Args, Ret> =
    Box<dyn Fn(Args) -> LocalBoxFuture<'static, Result<Option<Ret>, OrchestratorError>>>;

/// Errors surfaced by the orchestration pipeline.
///
/// Failures inside a transition mapping are deliberately not represented
/// here: the pipeline does not catch them, so they propagate to whichever
/// asynchronous boundary is awaiting the callback.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    /// The side-effect handler failed; the transition's commit was aborted
    /// and the canonical state left untouched.
    #[error("side-effect handler failed: {0}")]
    HandlerFailed(HandlerError),

    /// The orchestrator was dropped while the transition was in flight.
    #[error("orchestrator dropped before the transition could resolve")]
    Dropped,
}

/// Registration of a synchronous callback source.
///
/// The callback returns synchronously: the transition is evaluated inline,
/// but the funnel and commit run in a background task, and the return value
/// is computed from the locally projected state (the synchronously-known
/// candidate) rather than waiting for the side effect to resolve.
///
/// # Example
///
/// ```rust
/// use conflux::orchestrator::SyncRegistration;
/// use conflux::effects::StateFn;
/// use conflux::State;
/// use serde_json::{json, Value};
///
/// let registration = SyncRegistration::<Value, i64, (i64,), i64>::new(|_callback| {
///     // hand `_callback` to the event source here
/// })
/// .with_transition(|args: &(i64,)| {
///     let n = args.0;
///     StateFn::modify(move |state: Value| state.apply(&json!({ "count": n }))).map(|_| None)
/// })
/// .with_return(|snapshot, _args| snapshot.get()["count"].as_i64().unwrap_or(0));
/// ```
pub struct SyncRegistration<S: State, P, Args, Ret> {
    pub(crate) register: Box<dyn FnOnce(SyncCallback<Args, Ret>)>,
    pub(crate) transition: Option<Rc<dyn Fn(&Args) -> StateFn<S, Option<P>>>>,
    pub(crate) to_return: Option<Rc<dyn Fn(Snapshot<S>, &Args) -> Ret>>,
}

impl<S, P, Args, Ret> SyncRegistration<S, P, Args, Ret>
where
    S: State,
    P: 'static,
    Args: 'static,
    Ret: 'static,
{
    /// Create a registration from its wiring seam.
    pub fn new<R>(register: R) -> Self
    where
        R: FnOnce(SyncCallback<Args, Ret>) + 'static,
    {
        SyncRegistration {
            register: Box::new(register),
            transition: None,
            to_return: None,
        }
    }

    /// Map call arguments to a synchronous transition producing an optional
    /// side-effect parameter.
    pub fn with_transition<F>(mut self, transition: F) -> Self
    where
        F: Fn(&Args) -> StateFn<S, Option<P>> + 'static,
    {
        self.transition = Some(Rc::new(transition));
        self
    }

    /// Map the locally projected state and the original arguments to the
    /// callback's return value.
    pub fn with_return<F>(mut self, to_return: F) -> Self
    where
        F: Fn(Snapshot<S>, &Args) -> Ret + 'static,
    {
        self.to_return = Some(Rc::new(to_return));
        self
    }
}

/// Registration of an asynchronous callback source.
///
/// The callback's future resolves only after the full pipeline — transition,
/// funnel, gate — has run; the return-value mapping then reads the finally
/// committed state through a live snapshot.
pub struct AsyncRegistration<S: State, P, Args, Ret> {
    pub(crate) register: Box<dyn FnOnce(AsyncCallback<Args, Ret>)>,
    pub(crate) transition: Option<Rc<dyn Fn(Args) -> StateTask<S, Option<P>>>>,
    pub(crate) to_return: Option<Rc<dyn Fn(Snapshot<S>) -> LocalBoxFuture<'static, Ret>>>,
}

impl<S, P, Args, Ret> AsyncRegistration<S, P, Args, Ret>
where
    S: State,
    P: 'static,
    Args: 'static,
    Ret: 'static,
{
    /// Create a registration from its wiring seam.
    pub fn new<R>(register: R) -> Self
    where
        R: FnOnce(AsyncCallback<Args, Ret>) + 'static,
    {
        AsyncRegistration {
            register: Box::new(register),
            transition: None,
            to_return: None,
        }
    }

    /// Map call arguments to an asynchronous transition producing an
    /// optional side-effect parameter.
    pub fn with_transition<F>(mut self, transition: F) -> Self
    where
        F: Fn(Args) -> StateTask<S, Option<P>> + 'static,
    {
        self.transition = Some(Rc::new(transition));
        self
    }

    /// Map the committed state to the callback's resolved value.
    pub fn with_return<F, Fut>(mut self, to_return: F) -> Self
    where
        F: Fn(Snapshot<S>) -> Fut + 'static,
        Fut: Future<Output = Ret> + 'static,
    {
        self.to_return = Some(Rc::new(move |snapshot| to_return(snapshot).boxed_local()));
        self
    }
}
