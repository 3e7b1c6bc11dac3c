//! Port for the external scoring oracle.
//!
//! The oracle receives a system prompt, a user message, and a description of
//! the output shape it should produce. It may return clean structured JSON,
//! JSON wrapped in prose, or garbage; the assessor owns parsing and repair.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single oracle invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleRequest {
    /// System prompt establishing the rubric
    pub system_prompt: String,
    /// User message carrying the material to score
    pub user_message: String,
    /// Human-readable description of the expected output shape, embedded in
    /// the prompt so the oracle knows what JSON to emit
    pub output_shape: String,
}

/// Raw oracle output. Structured when the oracle produced parseable JSON,
/// text otherwise; the assessor attempts extraction in both cases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OracleReply {
    Structured(serde_json::Value),
    Text(String),
}

/// Errors from the scoring oracle.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("Oracle not configured: {0}")]
    NotConfigured(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    #[error("Invocation timeout after {0}s")]
    Timeout(u64),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Oracle invocation failed: {0}")]
    InvocationFailed(String),
}

/// Port trait for the scoring oracle.
#[async_trait]
pub trait ScoringOracle: Send + Sync {
    /// Invoke the oracle once.
    ///
    /// # Errors
    /// Callers (dimension assessors) must treat every error as recoverable:
    /// a failed invocation degrades one dimension, never the whole trial.
    async fn invoke(&self, request: OracleRequest) -> Result<OracleReply, OracleError>;
}
