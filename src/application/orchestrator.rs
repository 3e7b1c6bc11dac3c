//! Experiment orchestrator: ties generation, validation, persistence, and
//! the trial queue into the experiment lifecycle.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::application::trial_queue::TrialQueue;
use crate::domain::models::{
    ExperimentConfig, ExperimentStatus, Scenario, TrialRecord,
};
use crate::domain::ports::scenario_repository::{ScenarioFilters, ScenarioRepository};
use crate::domain::ports::trial_repository::{TrialFilters, TrialRepository};
use crate::services::batch_validation::{BatchValidationGate, ValidationProgress};
use crate::services::scenario_generator::ScenarioGenerator;
use crate::services::stats::ExperimentSummary;

/// Returned once an experiment's batch is accepted and queued.
#[derive(Debug, Clone)]
pub struct ExperimentReceipt {
    pub experiment_id: String,
    /// Scenarios generated for the full matrix
    pub total_trials: usize,
    /// Scenarios actually queued (equals the total under all-or-nothing)
    pub queued: usize,
    /// Scenarios rejected by validation (non-empty only under accept-valid)
    pub rejected: usize,
    pub queued_at: DateTime<Utc>,
}

/// Completed trials plus their descriptive statistics.
#[derive(Debug)]
pub struct ExperimentResults {
    pub trials: Vec<TrialRecord>,
    pub summary: ExperimentSummary,
}

pub struct ExperimentOrchestrator {
    gate: BatchValidationGate,
    scenarios: Arc<dyn ScenarioRepository>,
    trials: Arc<dyn TrialRepository>,
    queue: Arc<TrialQueue>,
}

impl ExperimentOrchestrator {
    pub fn new(
        gate: BatchValidationGate,
        scenarios: Arc<dyn ScenarioRepository>,
        trials: Arc<dyn TrialRepository>,
        queue: Arc<TrialQueue>,
    ) -> Self {
        Self {
            gate,
            scenarios,
            trials,
            queue,
        }
    }

    /// Run a new experiment: expand the matrix, validate the whole batch,
    /// persist accepted scenarios, and queue them as trial jobs.
    ///
    /// Nothing is persisted until the batch passes the validation gate.
    ///
    /// # Errors
    /// Fails on invalid configuration, a rejected batch (under
    /// all-or-nothing), or persistence errors.
    #[instrument(skip(self, config, progress), fields(experiment = %config.name))]
    pub async fn run_experiment(
        &self,
        config: &ExperimentConfig,
        progress: Option<mpsc::UnboundedSender<ValidationProgress>>,
    ) -> Result<ExperimentReceipt> {
        config
            .validate()
            .map_err(|e| anyhow::anyhow!(e))
            .context("invalid experiment configuration")?;

        let experiment_id = build_experiment_id(&config.name);
        let generated = ScenarioGenerator::generate(&experiment_id, config)
            .map_err(|e| anyhow::anyhow!(e))?;
        let total_trials = generated.len();
        info!(experiment_id, total_trials, "scenario matrix generated");

        let outcome = self
            .gate
            .validate_batch(generated, progress)
            .await
            .context("batch validation failed")?;
        let rejected = outcome.rejected.len();
        for rejection in &outcome.rejected {
            warn!(scenario_id = %rejection.scenario_id, reasons = ?rejection.reasons, "scenario dropped");
        }

        self.scenarios
            .insert_batch(&outcome.accepted)
            .await
            .context("failed to persist scenarios")?;
        let queued = self.queue.enqueue_batch(outcome.accepted);
        info!(experiment_id, queued, rejected, "experiment queued");

        Ok(ExperimentReceipt {
            experiment_id,
            total_trials,
            queued,
            rejected,
            queued_at: Utc::now(),
        })
    }

    /// Re-enqueue incomplete scenarios after a restart. The scenario table
    /// is the source of truth; duplicate enqueues are no-ops.
    ///
    /// # Errors
    /// Fails when the scenario store cannot be read.
    pub async fn resume_incomplete(&self, experiment_id: Option<String>) -> Result<usize> {
        let incomplete: Vec<Scenario> = self
            .scenarios
            .list(ScenarioFilters {
                experiment_id,
                completed: Some(false),
                ..Default::default()
            })
            .await
            .context("failed to list incomplete scenarios")?;
        let queued = self.queue.enqueue_batch(incomplete);
        if queued > 0 {
            info!(queued, "re-enqueued incomplete scenarios");
        }
        Ok(queued)
    }

    /// Current progress for one experiment.
    ///
    /// # Errors
    /// Fails when the scenario store cannot be read.
    pub async fn experiment_status(&self, experiment_id: &str) -> Result<ExperimentStatus> {
        let total = self
            .scenarios
            .count(ScenarioFilters {
                experiment_id: Some(experiment_id.to_string()),
                ..Default::default()
            })
            .await?;
        let completed = self
            .scenarios
            .count(ScenarioFilters {
                experiment_id: Some(experiment_id.to_string()),
                completed: Some(true),
                ..Default::default()
            })
            .await?;
        Ok(ExperimentStatus::compute(
            experiment_id.to_string(),
            u64::try_from(total).unwrap_or(0),
            u64::try_from(completed).unwrap_or(0),
            self.queue.depth(),
        ))
    }

    /// Completed trials matching the filters, with descriptive statistics.
    ///
    /// # Errors
    /// Fails when the trial store cannot be read.
    pub async fn experiment_results(&self, filters: TrialFilters) -> Result<ExperimentResults> {
        let trials = self.trials.list(filters).await?;
        let summary = ExperimentSummary::from_trials(&trials);
        Ok(ExperimentResults { trials, summary })
    }

    pub fn pause(&self) {
        self.queue.pause();
    }

    pub fn resume(&self) {
        self.queue.resume();
    }

    /// Close the queue and wait for in-flight trials to finish.
    pub async fn shutdown(&self) {
        self.queue.shutdown().await;
    }

    /// Wait for every queued trial to reach a terminal state.
    pub async fn drain(&self) {
        self.queue.drain().await;
    }
}

/// Experiment ids are a slug of the name plus a short random suffix, unique
/// across runs while staying readable in logs and tables.
fn build_experiment_id(name: &str) -> String {
    let slug: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    let suffix = Uuid::new_v4().simple().to_string();
    if slug.is_empty() {
        format!("experiment-{}", &suffix[..8])
    } else {
        format!("{slug}-{}", &suffix[..8])
    }
}
