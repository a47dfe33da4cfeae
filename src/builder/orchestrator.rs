//! Builder for constructing orchestrators.

use crate::builder::error::BuildError;
use crate::core::{Snapshot, State, StateEq};
use crate::effects::StateTask;
use crate::orchestrator::{
    wire_async, wire_sync, AsyncRegistration, HandlerError, Orchestrator, RootView,
    SideEffectHandler, SyncRegistration, Wirer,
};
use futures::FutureExt;
use std::future::Future;
use std::rc::Rc;

/// Builder for constructing an orchestrator with a fluent API.
///
/// The root view, initial state and equality predicate are required; the
/// side-effect handler, registrations and mount computation are optional
/// and default to no-ops.
pub struct OrchestratorBuilder<S: State, P: 'static = ()> {
    view: Option<Box<dyn RootView<S, P>>>,
    initial: Option<S>,
    equality: Option<StateEq<S>>,
    handler: Option<SideEffectHandler<S, P>>,
    wirers: Vec<Wirer<S, P>>,
    on_mount: Option<StateTask<S, Option<P>>>,
}

impl<S: State, P: 'static> OrchestratorBuilder<S, P> {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            view: None,
            initial: None,
            equality: None,
            handler: None,
            wirers: Vec::new(),
            on_mount: None,
        }
    }

    /// Set the root view (required).
    pub fn view<V>(mut self, view: V) -> Self
    where
        V: RootView<S, P> + 'static,
    {
        self.view = Some(Box::new(view));
        self
    }

    /// Set the initial state (required).
    pub fn initial(mut self, state: S) -> Self {
        self.initial = Some(state);
        self
    }

    /// Set the equality predicate gating visible updates (required).
    pub fn equality(mut self, equality: StateEq<S>) -> Self {
        self.equality = Some(equality);
        self
    }

    /// Use structural equality (`PartialEq`) as the gate.
    pub fn structural_equality(mut self) -> Self
    where
        S: PartialEq,
    {
        self.equality = Some(StateEq::structural());
        self
    }

    /// Set the single asynchronous side-effect handler (optional).
    ///
    /// The handler receives a snapshot of the pre-transition merged state
    /// plus the transition's parameter, and returns a patch to fold into
    /// the candidate. Its error aborts that transition's commit.
    pub fn side_effect_handler<F, Fut, E>(mut self, handler: F) -> Self
    where
        F: Fn(Snapshot<S>, P) -> Fut + 'static,
        Fut: Future<Output = Result<S::Patch, E>> + 'static,
        E: std::error::Error + 'static,
    {
        self.handler = Some(Rc::new(move |snapshot, param| {
            handler(snapshot, param)
                .map(|result| result.map_err(|error| Box::new(error) as HandlerError))
                .boxed_local()
        }));
        self
    }

    /// Add a synchronous callback registration.
    pub fn sync_registration<Args, Ret>(
        mut self,
        registration: SyncRegistration<S, P, Args, Ret>,
    ) -> Self
    where
        Args: 'static,
        Ret: 'static,
    {
        self.wirers
            .push(Box::new(move |inner| wire_sync(inner, registration)));
        self
    }

    /// Add an asynchronous callback registration.
    pub fn async_registration<Args, Ret>(
        mut self,
        registration: AsyncRegistration<S, P, Args, Ret>,
    ) -> Self
    where
        Args: 'static,
        Ret: 'static,
    {
        self.wirers
            .push(Box::new(move |inner| wire_async(inner, registration)));
        self
    }

    /// Set the one-shot mount computation (optional).
    pub fn on_mount(mut self, task: StateTask<S, Option<P>>) -> Self {
        self.on_mount = Some(task);
        self
    }

    /// Build the orchestrator.
    /// Returns an error if required pieces are missing.
    pub fn build(self) -> Result<Orchestrator<S, P>, BuildError> {
        let view = self.view.ok_or(BuildError::MissingView)?;
        let initial = self.initial.ok_or(BuildError::MissingInitialState)?;
        let equality = self.equality.ok_or(BuildError::MissingEquality)?;

        Ok(Orchestrator::new(
            view,
            initial,
            equality,
            self.handler,
            self.wirers,
            self.on_mount,
        ))
    }
}

impl<S: State, P: 'static> Default for OrchestratorBuilder<S, P> {
    fn default() -> Self {
        Self::new()
    }
}
