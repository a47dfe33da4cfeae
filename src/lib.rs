//! Conflux: reactive state orchestration with a single side-effect funnel.
//!
//! Conflux sits between a tree-structured view and an application-wide state
//! value. Arbitrary external callback sources — UI events, timers,
//! subscriptions — request state transitions without ever holding mutation
//! access; every side-effecting operation flows through one centrally
//! declared asynchronous handler, and every settled candidate passes an
//! equality gate before the view is re-rendered.
//!
//! # Core Concepts
//!
//! - **State**: caller-defined value with explicit partial-substitution
//!   semantics via the `State` trait
//! - **Deferred computations**: lazy `StateFn`/`StateTask` values that read
//!   the live state through snapshots and thread a candidate state
//! - **The funnel**: a single side-effect handler every parameter-bearing
//!   transition is routed through
//! - **The gate**: a caller-supplied equality predicate deciding whether a
//!   commit is visible
//!
//! # Example
//!
//! ```rust
//! use conflux::builder::OrchestratorBuilder;
//! use conflux::orchestrator::{EffectTrigger, RootView};
//! use serde_json::{json, Value};
//!
//! struct Root;
//!
//! impl RootView<Value, ()> for Root {
//!     fn render(&mut self, state: &Value, _effects: EffectTrigger<Value, ()>) {
//!         println!("count is now {}", state["count"]);
//!     }
//! }
//!
//! let orchestrator = OrchestratorBuilder::<Value, ()>::new()
//!     .view(Root)
//!     .initial(json!({ "count": 0 }))
//!     .structural_equality()
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(orchestrator.state(), json!({ "count": 0 }));
//! ```
//!
//! Transitions are concurrent by design: each one reads state through a live
//! snapshot at resolution time and the canonical state after a race is
//! decided by commit order, not start order. See the `orchestrator` module
//! docs for the pipeline and scheduling model.

pub mod builder;
pub mod core;
pub mod effects;
pub mod orchestrator;

// Re-export commonly used types
pub use crate::core::{CommitRecord, CommitTrace, Snapshot, State, StateEq};
pub use builder::{BuildError, OrchestratorBuilder};
pub use effects::{StateFn, StateTask};
pub use orchestrator::{
    AsyncRegistration, EffectTrigger, Orchestrator, OrchestratorError, RootView, SyncRegistration,
};
