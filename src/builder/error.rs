//! Build errors for orchestrator construction.

use thiserror::Error;

/// Errors that can occur when building an orchestrator.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Root view not specified. Call .view(root) before .build()")]
    MissingView,

    #[error("Initial state not specified. Call .initial(state) before .build()")]
    MissingInitialState,

    #[error("Equality predicate not specified. Call .equality(eq) or .structural_equality() before .build()")]
    MissingEquality,
}
