//! Builder API for ergonomic orchestrator construction.
//!
//! This module provides the fluent builder and the `state_struct!` macro for
//! wiring an orchestrator with minimal boilerplate while maintaining type
//! safety.

pub mod error;
pub mod macros;
pub mod orchestrator;

pub use error::BuildError;
pub use orchestrator::OrchestratorBuilder;
