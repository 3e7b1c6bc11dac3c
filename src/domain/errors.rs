//! Cross-layer error taxonomy for the trial pipeline.

use thiserror::Error;

use crate::domain::ports::agent::AgentError;
use crate::domain::ports::errors::StoreError;

/// A scenario batch failed the complexity gate.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Batch rejected: {rejected} of {total} scenarios failed validation")]
    BatchRejected { rejected: usize, total: usize },

    #[error("Validator error: {0}")]
    Validator(#[from] crate::domain::ports::validator::ValidatorError),
}

/// A trial handler failed. Retried by the queue up to the attempt ceiling.
///
/// Assessment failures never appear here: a failed dimension degrades to a
/// zero-confidence assessment inside the assessor and the trial proceeds.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Agent execution failed: {0}")]
    Agent(#[from] AgentError),

    #[error("Persistence failed: {0}")]
    Store(#[from] StoreError),
}
