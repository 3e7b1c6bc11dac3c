//! Trial executor: runs one trial through its three pipeline stages.
//!
//! Stage outputs are checkpointed per scenario, so a retried job resumes
//! after the last durably completed stage instead of repeating the agent
//! call or the nine scoring calls. Checkpoints are cleared only after the
//! trial row is persisted and the scenario is marked completed.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::application::trial_queue::JobHandler;
use crate::domain::errors::ExecutionError;
use crate::domain::models::{
    CognitiveResponse, CompositeAssessment, Scenario, TrialJob, TrialRecord, TrialStage,
};
use crate::domain::ports::agent::CognitiveAgent;
use crate::domain::ports::checkpoint_repository::CheckpointRepository;
use crate::domain::ports::errors::StoreError;
use crate::domain::ports::scenario_repository::ScenarioRepository;
use crate::domain::ports::trial_repository::TrialRepository;
use crate::services::aggregator::ScoreAggregator;

pub struct TrialExecutor {
    agent: Arc<dyn CognitiveAgent>,
    aggregator: Arc<ScoreAggregator>,
    scenarios: Arc<dyn ScenarioRepository>,
    trials: Arc<dyn TrialRepository>,
    checkpoints: Arc<dyn CheckpointRepository>,
}

impl TrialExecutor {
    pub fn new(
        agent: Arc<dyn CognitiveAgent>,
        aggregator: Arc<ScoreAggregator>,
        scenarios: Arc<dyn ScenarioRepository>,
        trials: Arc<dyn TrialRepository>,
        checkpoints: Arc<dyn CheckpointRepository>,
    ) -> Self {
        Self {
            agent,
            aggregator,
            scenarios,
            trials,
            checkpoints,
        }
    }

    /// Load a checkpoint payload if present and parseable. A corrupt
    /// payload is dropped and the stage recomputed.
    async fn load_checkpoint<T: serde::de::DeserializeOwned>(
        &self,
        scenario_id: &str,
        stage: TrialStage,
    ) -> Option<T> {
        match self.checkpoints.load(scenario_id, stage).await {
            Ok(Some(payload)) => match serde_json::from_value(payload) {
                Ok(value) => {
                    debug!(scenario_id, stage = stage.as_str(), "resuming from checkpoint");
                    Some(value)
                }
                Err(err) => {
                    warn!(scenario_id, stage = stage.as_str(), %err, "discarding corrupt checkpoint");
                    None
                }
            },
            Ok(None) => None,
            Err(err) => {
                warn!(scenario_id, stage = stage.as_str(), %err, "checkpoint load failed, recomputing stage");
                None
            }
        }
    }

    async fn save_checkpoint<T: serde::Serialize>(
        &self,
        scenario_id: &str,
        stage: TrialStage,
        value: &T,
    ) -> Result<(), StoreError> {
        let payload = serde_json::to_value(value)?;
        self.checkpoints.save(scenario_id, stage, &payload).await
    }

    async fn obtain_response(
        &self,
        scenario: &Scenario,
    ) -> Result<CognitiveResponse, ExecutionError> {
        if let Some(response) = self
            .load_checkpoint::<CognitiveResponse>(&scenario.id, TrialStage::AgentResponse)
            .await
        {
            return Ok(response);
        }

        let prompt = build_task_prompt(scenario);
        let response = self
            .agent
            .execute(&prompt, &scenario.model_id, &scenario.tool_config)
            .await?;
        self.save_checkpoint(&scenario.id, TrialStage::AgentResponse, &response)
            .await?;
        Ok(response)
    }

    async fn obtain_assessment(
        &self,
        scenario: &Scenario,
        response: &CognitiveResponse,
    ) -> Result<CompositeAssessment, ExecutionError> {
        if let Some(assessment) = self
            .load_checkpoint::<CompositeAssessment>(&scenario.id, TrialStage::Assessment)
            .await
        {
            return Ok(assessment);
        }

        let assessment = self
            .aggregator
            .evaluate(
                response,
                &scenario.success_criteria,
                scenario.tier,
                &scenario.domain,
            )
            .await;
        self.save_checkpoint(&scenario.id, TrialStage::Assessment, &assessment)
            .await?;
        Ok(assessment)
    }
}

/// Render the scenario into the task prompt the agent receives.
fn build_task_prompt(scenario: &Scenario) -> String {
    let criteria = scenario
        .success_criteria
        .iter()
        .map(|c| format!("- {}", c.description))
        .collect::<Vec<_>>()
        .join("\n");
    let requirements = scenario
        .requirements
        .iter()
        .map(|r| format!("- {r}"))
        .collect::<Vec<_>>()
        .join("\n");
    let mut prompt = format!(
        "# {title}\n\n{description}\n\n## Business context\n{context}\n\n\
         ## Success criteria\n{criteria}\n\n## Requirements\n{requirements}",
        title = scenario.title,
        description = scenario.description,
        context = scenario.business_context,
    );
    if !scenario.optional_data.is_empty() {
        prompt.push_str("\n\n## Additional data available\n");
        for item in &scenario.optional_data {
            prompt.push_str(&format!("- {item}\n"));
        }
    }
    prompt
}

#[async_trait]
impl JobHandler for TrialExecutor {
    async fn handle(&self, job: &TrialJob) -> Result<(), ExecutionError> {
        let scenario = &job.scenario;
        let started_at = Utc::now();

        let response = self.obtain_response(scenario).await?;
        let assessment = self.obtain_assessment(scenario, &response).await?;

        let record = TrialRecord::from_trial(
            scenario,
            response.content,
            response.metadata,
            assessment,
            job.attempts_made,
            started_at,
        );
        self.trials.insert(&record).await.map_err(ExecutionError::Store)?;
        self.scenarios
            .mark_completed(&scenario.id)
            .await
            .map_err(ExecutionError::Store)?;
        if let Err(err) = self.checkpoints.clear(&scenario.id).await {
            // The trial is durable at this point; stale checkpoints are
            // harmless and would be overwritten by a rerun.
            warn!(scenario_id = %scenario.id, %err, "failed to clear checkpoints");
        }

        info!(
            scenario_id = %scenario.id,
            overall = record.assessment.overall_score,
            label = record.assessment.label.as_str(),
            "trial persisted"
        );
        Ok(())
    }
}
