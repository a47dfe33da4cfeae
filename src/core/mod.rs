//! Pure foundation of the orchestration engine.
//!
//! This module contains the value types the shell is built from:
//! - Application state and its merge policy via the `State` trait
//! - Live read-through accessors via `Snapshot`
//! - Visibility gating via `StateEq`
//! - Commit-order observability via `CommitTrace`
//!
//! Everything here is pure: no task spawning, no interior mutability, no
//! side effects.

mod eq;
mod snapshot;
mod state;
mod trace;

pub use eq::StateEq;
pub use snapshot::Snapshot;
pub use state::State;
pub use trace::{CommitRecord, CommitTrace};
