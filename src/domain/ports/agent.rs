//! Port for the cognitive agent under test.
//!
//! The agent is a black box: one call per trial, opaque content plus
//! execution metadata back. Failures propagate to the queue layer, which
//! owns retry.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::models::{CognitiveResponse, ToolConfig};

/// Errors from the agent under test.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Agent not configured: {0}")]
    NotConfigured(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    #[error("Execution timeout after {0}s")]
    Timeout(u64),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Agent execution failed: {0}")]
    ExecutionFailed(String),
}

/// Port trait for the agent under test.
///
/// Implementations must be `Send + Sync` for concurrent use across workers.
#[async_trait]
pub trait CognitiveAgent: Send + Sync {
    /// Execute one task prompt under the given tool configuration.
    ///
    /// # Errors
    /// Any error here is retryable from the queue's point of view; the
    /// caller re-invokes after backoff up to the attempt ceiling.
    async fn execute(
        &self,
        task_prompt: &str,
        model_id: &str,
        tool_config: &ToolConfig,
    ) -> Result<CognitiveResponse, AgentError>;
}
