//! Port for scenario complexity validation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::models::{ComplexityMetrics, Scenario};

/// Verdict for one scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplexityVerdict {
    pub is_valid: bool,
    /// Complexity on a 0-10 scale
    pub complexity_score: f64,
    pub sub_metrics: ComplexityMetrics,
    /// Why the scenario was rejected; empty when valid
    pub rejection_reasons: Vec<String>,
}

/// Errors from the validation collaborator itself (not a rejection verdict).
#[derive(Debug, Error)]
pub enum ValidatorError {
    #[error("Validator unavailable: {0}")]
    Unavailable(String),

    #[error("Validation call failed: {0}")]
    CallFailed(String),
}

/// Port trait for the complexity validator.
#[async_trait]
pub trait ComplexityValidator: Send + Sync {
    /// Produce a validity verdict and complexity score for one scenario.
    async fn validate(&self, scenario: &Scenario) -> Result<ComplexityVerdict, ValidatorError>;
}
