//! The orchestration shell.
//!
//! An `Orchestrator` owns the canonical state and wires the pieces
//! together: registered callbacks produce deferred computations, every
//! parameter-bearing transition is routed through the single side-effect
//! handler, and every settled candidate passes the equality gate before the
//! view is re-rendered.
//!
//! # Pipeline
//!
//! Within one transition the order is fixed:
//!
//! 1. the transition computation runs against a live snapshot;
//! 2. the funnel runs, iff the produced parameter is present and a handler
//!    is registered — a handler failure aborts the transition, leaving the
//!    canonical state untouched;
//! 3. the equality gate compares the settled candidate against the
//!    canonical state;
//! 4. on a genuine difference the whole candidate is assigned and the view
//!    is notified.
//!
//! Across transitions nothing is ordered: no lock is held over the funnel,
//! so in-flight transitions interleave and the canonical state is decided
//! by commit order, not start order. Started transitions are never
//! cancelled.
//!
//! # Scheduling
//!
//! Everything runs on a single logical thread. Background work (the
//! not-awaited half of synchronous callbacks, and `EffectTrigger` requests)
//! is spawned on the current thread's task set, so the orchestrator must be
//! driven from within a `tokio::task::LocalSet`.

mod registration;
mod view;

pub use registration::{
    AsyncCallback, AsyncRegistration, HandlerError, OrchestratorError, SideEffectHandler,
    SyncCallback, SyncRegistration,
};
pub use view::{EffectTrigger, RootView};

use crate::core::{CommitRecord, CommitTrace, Snapshot, State, StateEq};
use crate::effects::StateTask;
use chrono::Utc;
use std::cell::RefCell;
use std::rc::Rc;
use uuid::Uuid;

/// Deferred wiring of one registration record, run at mount time.
pub(crate) type Wirer<S, P> = Box<dyn FnOnce(&Rc<Inner<S, P>>)>;

/// Shared heart of an orchestrator: the canonical state and everything the
/// pipeline needs to settle and commit a transition.
pub(crate) struct Inner<S: State, P> {
    pub(crate) state: RefCell<S>,
    equality: StateEq<S>,
    handler: Option<SideEffectHandler<S, P>>,
    view: RefCell<Box<dyn RootView<S, P>>>,
    trace: RefCell<CommitTrace<S>>,
}

impl<S: State, P: 'static> Inner<S, P> {
    /// A read-through accessor over the canonical state.
    ///
    /// Always a closure re-reading at call time, never a captured value:
    /// computations suspended across awaits must observe commits made by
    /// other transitions in the meantime.
    fn live_snapshot(inner: &Rc<Self>) -> Snapshot<S> {
        let shared = Rc::clone(inner);
        Snapshot::live(move || shared.state.borrow().clone())
    }

    fn trigger_handle(inner: &Rc<Self>) -> EffectTrigger<S, P> {
        EffectTrigger {
            inner: Rc::downgrade(inner),
        }
    }

    /// The funnel: route a parameter-bearing candidate through the
    /// side-effect handler and fold its patch into the candidate.
    ///
    /// Skipped entirely when the parameter is absent or no handler is
    /// registered.
    async fn settle(
        inner: &Rc<Self>,
        id: Uuid,
        candidate: S,
        param: Option<P>,
    ) -> Result<S, OrchestratorError> {
        let (Some(param), Some(handler)) = (param, inner.handler.as_ref()) else {
            tracing::trace!(transition = %id, "funnel skipped");
            return Ok(candidate);
        };

        tracing::debug!(transition = %id, "dispatching side-effect handler");
        let pre = Snapshot::fixed(candidate.clone());
        let patch = handler(pre, param)
            .await
            .map_err(OrchestratorError::HandlerFailed)?;
        Ok(candidate.apply(&patch))
    }

    /// The equality gate. Returns whether a visible update occurred.
    fn commit(inner: &Rc<Self>, id: Uuid, candidate: S) -> bool {
        let previous = inner.state.borrow().clone();
        if inner.equality.check(&previous, &candidate) {
            tracing::debug!(transition = %id, "commit gated: candidate equals canonical state");
            return false;
        }

        *inner.state.borrow_mut() = candidate.clone();

        let record = CommitRecord {
            transition: id,
            from: previous,
            to: candidate,
            committed_at: Utc::now(),
        };
        let appended = inner.trace.borrow().record(record);
        *inner.trace.borrow_mut() = appended;

        tracing::debug!(transition = %id, "state committed");
        Self::render(inner);
        true
    }

    fn render(inner: &Rc<Self>) {
        let state = inner.state.borrow().clone();
        let effects = Self::trigger_handle(inner);
        inner.view.borrow_mut().render(&state, effects);
    }

    /// Settle and commit in a background task. Failures abandon the
    /// transition with the canonical state untouched.
    pub(crate) fn spawn_settle(inner: Rc<Self>, id: Uuid, candidate: S, param: Option<P>) {
        tokio::task::spawn_local(async move {
            match Self::settle(&inner, id, candidate, param).await {
                Ok(settled) => {
                    Self::commit(&inner, id, settled);
                }
                Err(error) => {
                    tracing::warn!(transition = %id, %error, "transition abandoned");
                }
            }
        });
    }
}

/// Wire a synchronous registration: the callback evaluates the transition
/// inline, spawns the funnel and gate, and answers from the locally
/// projected state.
pub(crate) fn wire_sync<S, P, Args, Ret>(
    inner: &Rc<Inner<S, P>>,
    registration: SyncRegistration<S, P, Args, Ret>,
) where
    S: State,
    P: 'static,
    Args: 'static,
    Ret: 'static,
{
    let SyncRegistration {
        register,
        transition,
        to_return,
    } = registration;
    let weak = Rc::downgrade(inner);

    let callback: SyncCallback<Args, Ret> = Box::new(move |args| {
        let Some(inner) = weak.upgrade() else {
            tracing::warn!("sync callback fired after orchestrator was dropped");
            return None;
        };

        let projected = match &transition {
            Some(transition) => {
                let id = Uuid::new_v4();
                tracing::debug!(transition = %id, "sync callback fired");
                let (param, snapshot) = transition(&args).run(Inner::live_snapshot(&inner));
                let candidate = snapshot.get();
                Inner::spawn_settle(Rc::clone(&inner), id, candidate.clone(), param);
                // Answer from the synchronously-known candidate; the funnel
                // and gate reconcile the canonical state out-of-band.
                Snapshot::fixed(candidate)
            }
            None => Inner::live_snapshot(&inner),
        };

        to_return
            .as_ref()
            .map(|to_return| to_return(projected, &args))
    });

    register(callback);
}

/// Wire an asynchronous registration: the callback's future runs the full
/// pipeline and resolves with the return-value mapping applied to the
/// committed state.
pub(crate) fn wire_async<S, P, Args, Ret>(
    inner: &Rc<Inner<S, P>>,
    registration: AsyncRegistration<S, P, Args, Ret>,
) where
    S: State,
    P: 'static,
    Args: 'static,
    Ret: 'static,
{
    let AsyncRegistration {
        register,
        transition,
        to_return,
    } = registration;
    let weak = Rc::downgrade(inner);

    let callback: AsyncCallback<Args, Ret> = Box::new(move |args| {
        let weak = weak.clone();
        let transition = transition.clone();
        let to_return = to_return.clone();

        Box::pin(async move {
            let Some(inner) = weak.upgrade() else {
                return Err(OrchestratorError::Dropped);
            };

            if let Some(transition) = transition {
                let id = Uuid::new_v4();
                tracing::debug!(transition = %id, "async callback fired");
                let task = transition(args);
                let (param, snapshot) = task.run(Inner::live_snapshot(&inner)).await;
                let candidate = snapshot.get();
                let settled = Inner::settle(&inner, id, candidate, param).await?;
                Inner::commit(&inner, id, settled);
            }

            match &to_return {
                Some(to_return) => Ok(Some(to_return(Inner::live_snapshot(&inner)).await)),
                None => Ok(None),
            }
        })
    });

    register(callback);
}

/// Owner of the canonical state and entry point of the view tree.
///
/// Built with [`OrchestratorBuilder`](crate::builder::OrchestratorBuilder);
/// nothing happens until [`mount`](Orchestrator::mount) is called.
pub struct Orchestrator<S: State, P: 'static = ()> {
    inner: Rc<Inner<S, P>>,
    wirers: Vec<Wirer<S, P>>,
    on_mount: Option<StateTask<S, Option<P>>>,
    mounted: bool,
}

impl<S: State, P: 'static> Orchestrator<S, P> {
    pub(crate) fn new(
        view: Box<dyn RootView<S, P>>,
        initial: S,
        equality: StateEq<S>,
        handler: Option<SideEffectHandler<S, P>>,
        wirers: Vec<Wirer<S, P>>,
        on_mount: Option<StateTask<S, Option<P>>>,
    ) -> Self {
        Orchestrator {
            inner: Rc::new(Inner {
                state: RefCell::new(initial),
                equality,
                handler,
                view: RefCell::new(view),
                trace: RefCell::new(CommitTrace::new()),
            }),
            wirers,
            on_mount,
            mounted: false,
        }
    }

    /// Mount the orchestrator: render the initial state, run the mount
    /// computation (if any) through the funnel and gate to completion, then
    /// wire every registration to its external source.
    ///
    /// Runs at most once; later calls are no-ops. The mount computation's
    /// result value is discarded — only its state update matters. A handler
    /// failure during mount aborts the mount commit but still wires the
    /// registrations, and is reported to the caller.
    pub async fn mount(&mut self) -> Result<(), OrchestratorError> {
        if self.mounted {
            return Ok(());
        }
        self.mounted = true;

        Inner::render(&self.inner);

        let mut outcome = Ok(());
        if let Some(task) = self.on_mount.take() {
            let id = Uuid::new_v4();
            tracing::debug!(transition = %id, "running mount computation");
            let (param, snapshot) = task.run(Inner::live_snapshot(&self.inner)).await;
            let candidate = snapshot.get();
            match Inner::settle(&self.inner, id, candidate, param).await {
                Ok(settled) => {
                    Inner::commit(&self.inner, id, settled);
                }
                Err(error) => {
                    tracing::warn!(transition = %id, %error, "mount transition abandoned");
                    outcome = Err(error);
                }
            }
        }

        for wire in self.wirers.drain(..) {
            wire(&self.inner);
        }

        outcome
    }

    /// A clone of the canonical state.
    pub fn state(&self) -> S {
        self.inner.state.borrow().clone()
    }

    /// A clone of the commit trace.
    pub fn trace(&self) -> CommitTrace<S> {
        self.inner.trace.borrow().clone()
    }

    /// A trigger handle, identical to the one handed to the view.
    pub fn effects(&self) -> EffectTrigger<S, P> {
        Inner::trigger_handle(&self.inner)
    }
}
