//! Batch validation gate.
//!
//! The orchestrator validates the entire generated batch before any
//! persistence. Validation runs with parallelism equal to the batch size and
//! emits a progress event per scenario, so callers can report partial
//! progress before the verdict is known.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::domain::errors::ValidationError;
use crate::domain::models::{Scenario, ValidationPolicy};
use crate::domain::ports::validator::ComplexityValidator;

/// Emitted once per scenario as its verdict arrives.
#[derive(Debug, Clone)]
pub struct ValidationProgress {
    pub scenario_id: String,
    /// Scenarios checked so far (including this one)
    pub checked: usize,
    pub total: usize,
    pub is_valid: bool,
}

/// A scenario the gate rejected, with its reasons.
#[derive(Debug, Clone)]
pub struct RejectedScenario {
    pub scenario_id: String,
    pub reasons: Vec<String>,
}

/// Outcome of a gate pass under the `AcceptValid` policy. Under
/// `AllOrNothing` a non-empty rejected set is an error instead.
#[derive(Debug)]
pub struct BatchOutcome {
    /// Valid scenarios, enriched with their complexity scores
    pub accepted: Vec<Scenario>,
    pub rejected: Vec<RejectedScenario>,
}

/// Validation gate in front of scenario persistence.
pub struct BatchValidationGate {
    validator: Arc<dyn ComplexityValidator>,
    policy: ValidationPolicy,
}

impl BatchValidationGate {
    pub fn new(validator: Arc<dyn ComplexityValidator>, policy: ValidationPolicy) -> Self {
        Self { validator, policy }
    }

    /// Validate a whole batch.
    ///
    /// Every scenario is checked concurrently (parallelism == batch size).
    /// Accepted scenarios come back with `complexity_score` and sub-metrics
    /// filled in from their verdicts.
    ///
    /// # Errors
    /// Under `AllOrNothing`, any rejection fails the whole batch and nothing
    /// must be persisted. Validator transport errors fail the batch under
    /// both policies.
    pub async fn validate_batch(
        &self,
        scenarios: Vec<Scenario>,
        progress: Option<mpsc::UnboundedSender<ValidationProgress>>,
    ) -> Result<BatchOutcome, ValidationError> {
        let total = scenarios.len();
        let checked = AtomicUsize::new(0);

        let checks = scenarios.into_iter().map(|mut scenario| {
            let validator = Arc::clone(&self.validator);
            let progress = progress.clone();
            let checked = &checked;
            async move {
                let verdict = validator.validate(&scenario).await?;
                let done = checked.fetch_add(1, Ordering::Relaxed) + 1;
                if let Some(tx) = &progress {
                    // Receiver may have gone away; progress is best-effort.
                    let _ = tx.send(ValidationProgress {
                        scenario_id: scenario.id.clone(),
                        checked: done,
                        total,
                        is_valid: verdict.is_valid,
                    });
                }
                scenario.complexity_score = verdict.complexity_score;
                scenario.complexity_metrics = verdict.sub_metrics;
                Ok::<_, ValidationError>((scenario, verdict.is_valid, verdict.rejection_reasons))
            }
        });

        let mut accepted = Vec::with_capacity(total);
        let mut rejected = Vec::new();
        for result in join_all(checks).await {
            let (scenario, is_valid, reasons) = result?;
            if is_valid {
                debug!(scenario_id = %scenario.id, score = scenario.complexity_score, "scenario validated");
                accepted.push(scenario);
            } else {
                warn!(scenario_id = %scenario.id, ?reasons, "scenario rejected by complexity gate");
                rejected.push(RejectedScenario {
                    scenario_id: scenario.id,
                    reasons,
                });
            }
        }

        if self.policy == ValidationPolicy::AllOrNothing && !rejected.is_empty() {
            return Err(ValidationError::BatchRejected {
                rejected: rejected.len(),
                total,
            });
        }

        Ok(BatchOutcome { accepted, rejected })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{ExperimentConfig, Tier, ToolConfig};
    use crate::services::heuristic_validator::HeuristicComplexityValidator;
    use crate::services::scenario_generator::ScenarioGenerator;

    fn scenarios(n_domains: usize) -> Vec<Scenario> {
        let domains = ["analytical", "planning", "communication", "problem-solving"];
        let config = ExperimentConfig {
            name: String::new(),
            domains: domains[..n_domains].iter().map(|s| (*s).to_string()).collect(),
            tiers: vec![Tier::Simple],
            repetitions: 1,
            models: vec!["sonnet".into()],
            tool_configs: vec![ToolConfig {
                id: "baseline".to_string(),
                ..Default::default()
            }],
        };
        ScenarioGenerator::generate("exp", &config).unwrap()
    }

    fn gate(policy: ValidationPolicy) -> BatchValidationGate {
        BatchValidationGate::new(Arc::new(HeuristicComplexityValidator::new()), policy)
    }

    #[tokio::test]
    async fn test_clean_batch_accepted_with_scores() {
        let outcome = gate(ValidationPolicy::AllOrNothing)
            .validate_batch(scenarios(4), None)
            .await
            .unwrap();
        assert_eq!(outcome.accepted.len(), 4);
        assert!(outcome.rejected.is_empty());
        assert!(outcome.accepted.iter().all(|s| s.complexity_score > 0.0));
    }

    #[tokio::test]
    async fn test_all_or_nothing_rejects_whole_batch() {
        let mut batch = scenarios(4);
        batch[2].success_criteria.clear();

        let err = gate(ValidationPolicy::AllOrNothing)
            .validate_batch(batch, None)
            .await
            .unwrap_err();
        match err {
            ValidationError::BatchRejected { rejected, total } => {
                assert_eq!(rejected, 1);
                assert_eq!(total, 4);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_accept_valid_keeps_good_scenarios() {
        let mut batch = scenarios(4);
        batch[0].success_criteria.clear();

        let outcome = gate(ValidationPolicy::AcceptValid)
            .validate_batch(batch, None)
            .await
            .unwrap();
        assert_eq!(outcome.accepted.len(), 3);
        assert_eq!(outcome.rejected.len(), 1);
        assert!(!outcome.rejected[0].reasons.is_empty());
    }

    #[tokio::test]
    async fn test_progress_event_per_scenario() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        gate(ValidationPolicy::AllOrNothing)
            .validate_batch(scenarios(3), Some(tx))
            .await
            .unwrap();

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        assert_eq!(events.len(), 3);
        assert!(events.iter().all(|e| e.total == 3 && e.is_valid));
        let max_checked = events.iter().map(|e| e.checked).max().unwrap();
        assert_eq!(max_checked, 3);
    }
}
